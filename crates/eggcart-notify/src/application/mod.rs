pub mod client;
pub mod mailer;
pub mod service;

//! EggCart — transactional email.
//!
//! Renders order and welcome emails, sends them through a [`Mailer`], and
//! provides the HTTP client the checkout uses to reach the dispatcher
//! service.
//!
//! [`Mailer`]: application::mailer::Mailer

pub mod application;
pub mod domain;

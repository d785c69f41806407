pub mod config;
pub mod errors;
pub mod phase;
pub mod pricing;

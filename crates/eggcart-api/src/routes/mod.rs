//! Route modules.

pub mod functions;
pub mod health;

//! EggCart — admin order management.
//!
//! Operators change an order's status and notes together: both fields are
//! staged locally, then written in a single update.

pub mod application;
pub mod domain;

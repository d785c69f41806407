//! EggCart — checkout orchestration.
//!
//! Turns the cart into exactly one order: verifies the session, creates the
//! order row and its line items with retry and a timeout, sends the
//! confirmation email, clears the cart and hands the user to their order
//! history. The open checkout view is bounded by a countdown.

pub mod application;
pub mod domain;

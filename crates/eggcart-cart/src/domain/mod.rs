//! Cart domain: line items, state and the reducer.

pub mod actions;
pub mod state;

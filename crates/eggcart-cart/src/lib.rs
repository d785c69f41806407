//! EggCart — Cart Store.
//!
//! The authoritative in-session view of a customer's cart. Mutations go
//! through a single reducer so the running total always equals the sum of
//! its lines; a local JSON mirror and an optional remote mirror follow the
//! state as side effects.

pub mod application;
pub mod domain;

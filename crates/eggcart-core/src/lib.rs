//! EggCart Core — shared domain records and ports.
//!
//! This crate defines the records, traits and small primitives that every
//! storefront component depends on: the clock, the domain error taxonomy,
//! the persistence and session ports, the cart change feed, and the retry
//! combinator. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod feed;
pub mod model;
pub mod navigation;
pub mod notification;
pub mod repository;
pub mod retry;
pub mod session;

//! Cart application services: the store object and its mirrors.

pub mod mirror;
pub mod remote;
pub mod store;

pub mod access;
pub mod pending;

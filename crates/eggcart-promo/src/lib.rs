//! EggCart — promotional item eligibility.
//!
//! Each promotional product may be bought once per identity, one unit at a
//! time. The purchased set comes from the order history; the add policy
//! decides what the product view offers. The cap is client-side policy
//! only: nothing in the backend rejects a second promotional purchase.

pub mod application;
pub mod domain;

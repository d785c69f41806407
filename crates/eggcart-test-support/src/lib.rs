//! Shared test doubles and utilities for the EggCart storefront.

mod backend;
mod client;
mod clock;
mod feed;
mod sleeper;

pub use backend::InMemoryBackend;
pub use client::{RecordingDispatcher, RecordingNavigator, StaticSessionProvider, ToggleConnectivity};
pub use clock::{FixedClock, ManualClock, fixed_now};
pub use feed::ChannelChangeSource;
pub use sleeper::RecordingSleeper;

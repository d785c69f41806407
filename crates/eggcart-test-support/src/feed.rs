//! Channel-backed change source for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use eggcart_core::error::DomainError;
use eggcart_core::feed::{CartChange, CartChangeSource, CartChangeStream};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A change source whose notifications are published by the test.
#[derive(Debug, Default)]
pub struct ChannelChangeSource {
    subscribers: Mutex<Vec<(Uuid, mpsc::Sender<CartChange>)>>,
}

impl ChannelChangeSource {
    /// Creates a source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `change` to every subscriber of its owner.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn publish(&self, change: CartChange) {
        let senders: Vec<mpsc::Sender<CartChange>> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|(user_id, _)| *user_id == change.user_id())
            .map(|(_, sender)| sender.clone())
            .collect();
        for sender in senders {
            let _ = sender.send(change.clone()).await;
        }
    }

    /// Drops every sender, ending all streams.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn close(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

#[async_trait]
impl CartChangeSource for ChannelChangeSource {
    async fn subscribe(&self, user_id: Uuid) -> Result<CartChangeStream, DomainError> {
        let (sender, receiver) = mpsc::channel(64);
        self.subscribers.lock().unwrap().push((user_id, sender));
        Ok(receiver)
    }
}

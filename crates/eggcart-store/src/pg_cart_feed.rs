//! `LISTEN`/`NOTIFY` change feed for `cart_items`.
//!
//! The `cart_items_notify` trigger publishes one JSON payload per row change
//! on [`CART_CHANNEL`]. Each subscription holds its own listener connection
//! and forwards the changes for one user.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use eggcart_core::error::DomainError;
use eggcart_core::feed::{CartChange, CartChangeSource, CartChangeStream};

use crate::error::db_error;

/// Notification channel the trigger publishes on.
pub const CART_CHANNEL: &str = "cart_changes";

const BUFFER: usize = 64;

/// Decodes one trigger payload.
///
/// # Errors
///
/// Returns the JSON error for a malformed payload.
pub fn parse_notification(payload: &str) -> Result<CartChange, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Change source backed by PostgreSQL notifications.
#[derive(Debug, Clone)]
pub struct PgCartChangeFeed {
    pool: PgPool,
}

impl PgCartChangeFeed {
    /// Creates a feed listening through `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartChangeSource for PgCartChangeFeed {
    async fn subscribe(&self, user_id: Uuid) -> Result<CartChangeStream, DomainError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(db_error)?;
        listener.listen(CART_CHANNEL).await.map_err(db_error)?;

        let (tx, rx) = mpsc::channel(BUFFER);
        tokio::spawn(async move {
            loop {
                let notification = tokio::select! {
                    () = tx.closed() => break,
                    received = listener.recv() => received,
                };
                let notification = match notification {
                    Ok(notification) => notification,
                    Err(err) => {
                        warn!(error = %err, "cart listener failed, ending feed");
                        break;
                    }
                };
                let change = match parse_notification(notification.payload()) {
                    Ok(change) => change,
                    Err(err) => {
                        warn!(error = %err, "ignoring malformed cart notification");
                        continue;
                    }
                };
                if change.user_id() != user_id {
                    continue;
                }
                if tx.send(change).await.is_err() {
                    break;
                }
            }
            debug!(%user_id, "cart feed closed");
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_payloads() {
        let user_id = Uuid::new_v4();
        let updated = format!(
            r#"{{"op":"updated","user_id":"{user_id}","product_id":"pack-6","quantity":3,"updated_at":"2026-01-15T10:00:00.123456+00:00"}}"#
        );
        let deleted = format!(
            r#"{{"op":"deleted","user_id":"{user_id}","product_id":"pack-6","updated_at":"2026-01-15T10:01:00+00:00"}}"#
        );

        match parse_notification(&updated).unwrap() {
            CartChange::Updated(row) => {
                assert_eq!(row.user_id, user_id);
                assert_eq!(row.quantity, 3);
            }
            other => panic!("expected Updated, got {other:?}"),
        }
        match parse_notification(&deleted).unwrap() {
            CartChange::Deleted { product_id, .. } => assert_eq!(product_id, "pack-6"),
            other => panic!("expected Deleted, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(parse_notification(r#"{"op":"truncated"}"#).is_err());
    }
}

//! Push-based change feed for the remote cart mirror.
//!
//! The feed is transport independent: a [`CartChangeSource`] hands out a
//! channel receiver scoped to one identity, and consumers drain it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::RemoteCartRow;

/// A single change notification for a `cart_items` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CartChange {
    /// A row was inserted.
    Inserted(RemoteCartRow),
    /// A row's quantity changed.
    Updated(RemoteCartRow),
    /// A row was deleted.
    Deleted {
        /// Owner of the cart.
        user_id: Uuid,
        /// Product removed.
        product_id: String,
        /// Time of the deletion.
        updated_at: DateTime<Utc>,
    },
}

impl CartChange {
    /// Owner of the affected row.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Inserted(row) | Self::Updated(row) => row.user_id,
            Self::Deleted { user_id, .. } => *user_id,
        }
    }

    /// Product of the affected row.
    #[must_use]
    pub fn product_id(&self) -> &str {
        match self {
            Self::Inserted(row) | Self::Updated(row) => &row.product_id,
            Self::Deleted { product_id, .. } => product_id,
        }
    }

    /// Modification time carried by the notification.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Inserted(row) | Self::Updated(row) => row.updated_at,
            Self::Deleted { updated_at, .. } => *updated_at,
        }
    }
}

/// Receiving half of a change subscription.
pub type CartChangeStream = mpsc::Receiver<CartChange>;

/// A source of cart change notifications.
#[async_trait]
pub trait CartChangeSource: Send + Sync {
    /// Subscribes to changes on `user_id`'s cart rows.
    ///
    /// Notifications arrive in delivery order. The stream ends when the
    /// source shuts down.
    async fn subscribe(&self, user_id: Uuid) -> Result<CartChangeStream, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deleted_change_serializes_with_op_tag() {
        let user_id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let change = CartChange::Deleted {
            user_id,
            product_id: "pack-6".to_owned(),
            updated_at: at,
        };

        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["op"], "deleted");
        assert_eq!(json["product_id"], "pack-6");
        let back: CartChange = serde_json::from_value(json).unwrap();
        assert_eq!(back.user_id(), user_id);
        assert_eq!(back.updated_at(), at);
    }
}

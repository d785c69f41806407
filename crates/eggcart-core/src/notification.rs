//! Notification dispatcher contract.
//!
//! The request body is shared by the checkout client (which sends it) and
//! the dispatcher service (which renders and mails it). Money fields travel
//! as JSON numbers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Retryable;

/// Order section of an order-confirmation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOrder {
    /// Order identifier.
    pub id: String,
    /// Customer name used in the greeting.
    #[serde(default)]
    pub user_full_name: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Status string; selects the email template.
    pub status: String,
    /// Operator notes shown in the email.
    #[serde(default)]
    pub order_notes: Option<String>,
    /// Delivery surcharge, if the sender computed one.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_fee: Option<Decimal>,
    /// Grand total, if the sender computed one.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub final_total: Option<Decimal>,
}

/// One purchased line in a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Product title at purchase time.
    pub product_name: String,
    /// Units purchased.
    pub quantity: u32,
    /// Unit price at purchase time.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body of `POST /functions/order-confirmation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmationRequest {
    /// The order being confirmed or updated.
    pub order: NotificationOrder,
    /// Customer email address.
    pub email: String,
    /// Purchased lines.
    pub items: Vec<NotificationItem>,
}

/// The dispatcher could not deliver a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("email dispatch failed: {0}")]
pub struct EmailDispatchError(pub String);

impl Retryable for EmailDispatchError {
    fn is_transient(&self) -> bool {
        true
    }
}

/// Invokes the notification dispatcher.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Sends an order confirmation (or status update) email.
    async fn dispatch_order_confirmation(
        &self,
        request: &OrderConfirmationRequest,
    ) -> Result<(), EmailDispatchError>;
}

//! Persistent records shared across the storefront.
//!
//! These mirror the backend tables (`products`, `orders`, `order_items`,
//! `cart_items`). Money is always a [`Decimal`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (e.g. `pack-6`).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Current unit price.
    pub price: Decimal,
    /// Image reference.
    pub image: String,
    /// Whether this is a one-per-customer promotional product.
    pub is_promotional: bool,
}

/// Fulfilment status of an order. No other values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed and awaiting delivery.
    Processing,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled by the operator.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in console tab order.
    pub const ALL: [Self; 3] = [Self::Processing, Self::Delivered, Self::Cancelled];

    /// The canonical string form stored in the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(Self::Processing),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Owner of the order.
    pub user_id: Uuid,
    /// Grand total charged (items subtotal plus delivery fee).
    pub total_amount: Decimal,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Free-text notes, settable by an admin.
    pub notes: String,
}

/// Insert payload for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Owner of the order.
    pub user_id: Uuid,
    /// Grand total charged.
    pub total_amount: Decimal,
    /// Initial status.
    pub status: OrderStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A purchased line, snapshotted at checkout time.
///
/// `product_name` and `unit_price` are copies, not joins: later catalog
/// changes never alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// The order this line belongs to.
    pub order_id: Uuid,
    /// The purchased product.
    pub product_id: String,
    /// Product title at purchase time.
    pub product_name: String,
    /// Units purchased.
    pub quantity: u32,
    /// Unit price at purchase time.
    pub unit_price: Decimal,
}

/// A row of the remote cart mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartRow {
    /// Owner of the cart.
    pub user_id: Uuid,
    /// Product in the cart.
    pub product_id: String,
    /// Units in the cart, always at least 1.
    pub quantity: u32,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

//! Persistence ports.
//!
//! Each trait covers one backend table family. Implementations live in
//! `eggcart-store` (PostgreSQL) and `eggcart-test-support` (in-memory).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{NewOrder, Order, OrderLineItem, OrderStatus, Product, RemoteCartRow};

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Loads a product by id.
    async fn product(&self, product_id: &str) -> Result<Option<Product>, DomainError>;
}

/// Row-level access to `orders` and `order_items`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts one order and returns the stored row.
    async fn create_order(&self, order: NewOrder) -> Result<Order, DomainError>;

    /// Bulk-inserts the line items of an order.
    async fn create_order_items(&self, items: &[OrderLineItem]) -> Result<(), DomainError>;

    /// Deletes an order that never received its line items.
    async fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError>;

    /// Lists every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, DomainError>;

    /// Lists one user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError>;

    /// Loads the line items of an order.
    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, DomainError>;

    /// Writes status and notes in a single update.
    async fn update_status_and_notes(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        notes: &str,
    ) -> Result<(), DomainError>;

    /// Distinct promotional product ids on the user's non-cancelled orders.
    async fn purchased_promo_product_ids(
        &self,
        user_id: Uuid,
    ) -> Result<HashSet<String>, DomainError>;
}

/// Row-level access to the remote cart mirror (`cart_items`).
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Loads the user's cart rows.
    async fn load_rows(&self, user_id: Uuid) -> Result<Vec<RemoteCartRow>, DomainError>;

    /// Inserts or updates the quantity of one row.
    async fn upsert_row(
        &self,
        user_id: Uuid,
        product_id: &str,
        quantity: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Deletes the given products from the user's cart.
    async fn delete_rows(&self, user_id: Uuid, product_ids: &[String]) -> Result<(), DomainError>;
}

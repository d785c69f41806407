//! `PostgreSQL` implementation of the `OrderRepository` trait.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use eggcart_core::error::DomainError;
use eggcart_core::model::{NewOrder, Order, OrderLineItem, OrderStatus};
use eggcart_core::repository::OrderRepository;

use crate::error::{db_error, quantity_from_db, quantity_to_db};

const ORDER_COLUMNS: &str = "id, user_id, total_amount, status, created_at, order_notes";

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, DomainError> {
    let status: String = row.try_get("status").map_err(db_error)?;
    Ok(Order {
        id: row.try_get("id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        total_amount: row.try_get("total_amount").map_err(db_error)?,
        status: status.parse()?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        notes: row.try_get("order_notes").map_err(db_error)?,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderLineItem, DomainError> {
    Ok(OrderLineItem {
        order_id: row.try_get("order_id").map_err(db_error)?,
        product_id: row.try_get("product_id").map_err(db_error)?,
        product_name: row.try_get("product_name").map_err(db_error)?,
        quantity: quantity_from_db(row.try_get("quantity").map_err(db_error)?)?,
        unit_price: row.try_get("price").map_err(db_error)?,
    })
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: NewOrder) -> Result<Order, DomainError> {
        let row = sqlx::query(&format!(
            "INSERT INTO orders (user_id, total_amount, status, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        order_from_row(&row)
    }

    async fn create_order_items(&self, items: &[OrderLineItem]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(quantity_to_db(item.quantity)?)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;
        debug!(count = items.len(), "order items inserted");
        Ok(())
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(order_from_row).collect()
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(order_from_row).collect()
    }

    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, DomainError> {
        let rows = sqlx::query(
            "SELECT order_id, product_id, product_name, quantity, price \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(item_from_row).collect()
    }

    async fn update_status_and_notes(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        notes: &str,
    ) -> Result<(), DomainError> {
        let result =
            sqlx::query("UPDATE orders SET status = $2, order_notes = $3 WHERE id = $1")
                .bind(order_id)
                .bind(status.as_str())
                .bind(notes)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("order {order_id}")));
        }
        Ok(())
    }

    async fn purchased_promo_product_ids(
        &self,
        user_id: Uuid,
    ) -> Result<HashSet<String>, DomainError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT oi.product_id \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             JOIN products p ON p.id = oi.product_id \
             WHERE o.user_id = $1 AND p.is_promotional AND o.status <> 'Cancelled'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(ids.into_iter().collect())
    }
}

//! `PostgreSQL` implementation of the `CartRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use eggcart_core::error::DomainError;
use eggcart_core::model::RemoteCartRow;
use eggcart_core::repository::CartRepository;

use crate::error::{db_error, quantity_from_db, quantity_to_db};

/// PostgreSQL-backed cart mirror.
#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Creates a new `PgCartRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn load_rows(&self, user_id: Uuid) -> Result<Vec<RemoteCartRow>, DomainError> {
        let rows = sqlx::query(
            "SELECT user_id, product_id, quantity, updated_at \
             FROM cart_items WHERE user_id = $1 ORDER BY updated_at, product_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok(RemoteCartRow {
                    user_id: row.try_get("user_id").map_err(db_error)?,
                    product_id: row.try_get("product_id").map_err(db_error)?,
                    quantity: quantity_from_db(row.try_get("quantity").map_err(db_error)?)?,
                    updated_at: row.try_get("updated_at").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn upsert_row(
        &self,
        user_id: Uuid,
        product_id: &str,
        quantity: u32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "cart quantity must be at least 1".to_owned(),
            ));
        }
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, product_id) \
             DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete_rows(&self, user_id: Uuid, product_ids: &[String]) -> Result<(), DomainError> {
        if product_ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
            .bind(user_id)
            .bind(product_ids)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

//! `PostgreSQL` implementation of the `ProductCatalog` trait.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use eggcart_core::error::DomainError;
use eggcart_core::model::Product;
use eggcart_core::repository::ProductCatalog;

use crate::error::db_error;

/// PostgreSQL-backed product catalog.
#[derive(Debug, Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Creates a new `PgProductCatalog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a product.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the write fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO products (id, title, price, image, is_promotional) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, price = EXCLUDED.price, \
             image = EXCLUDED.image, is_promotional = EXCLUDED.is_promotional",
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.is_promotional)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn product(&self, product_id: &str) -> Result<Option<Product>, DomainError> {
        let row = sqlx::query(
            "SELECT id, title, price, image, is_promotional FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(|row| {
            Ok(Product {
                id: row.try_get("id").map_err(db_error)?,
                title: row.try_get("title").map_err(db_error)?,
                price: row.try_get("price").map_err(db_error)?,
                image: row.try_get("image").map_err(db_error)?,
                is_promotional: row.try_get("is_promotional").map_err(db_error)?,
            })
        })
        .transpose()
    }
}

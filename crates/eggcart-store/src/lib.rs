//! PostgreSQL adapters for the storefront ports.
//!
//! Queries are built at runtime with `sqlx::query`; the schema lives in the
//! workspace `migrations/` directory and is embedded as [`MIGRATOR`].

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use eggcart_core::error::DomainError;

mod error;
pub mod pg_cart_feed;
pub mod pg_cart_repository;
pub mod pg_order_repository;
pub mod pg_product_catalog;

pub use pg_cart_feed::PgCartChangeFeed;
pub use pg_cart_repository::PgCartRepository;
pub use pg_order_repository::PgOrderRepository;
pub use pg_product_catalog::PgProductCatalog;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Opens a pool and applies pending migrations.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the database is unreachable or a
/// migration fails.
pub async fn connect(database_url: &str) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(error::db_error)?;
    MIGRATOR
        .run(&pool)
        .await
        .map_err(|err| DomainError::Infrastructure(format!("migration failed: {err}")))?;
    Ok(pool)
}

//! Shared application state.

use std::sync::Arc;

use eggcart_notify::application::service::EmailService;
use sqlx::PgPool;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Renders and sends dispatcher email.
    pub email: Arc<EmailService>,
    /// PostgreSQL pool, when a database is configured.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(email: Arc<EmailService>, db_pool: Option<PgPool>) -> Self {
        Self { email, db_pool }
    }
}

//! Identity and session port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// An authenticated session as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user.
    pub user_id: Uuid,
    /// Contact email, required for checkout.
    pub email: Option<String>,
    /// Display name from the profile, if known.
    pub full_name: Option<String>,
    /// When the session token stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still valid at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Source of the current session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the current session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>, DomainError>;
}

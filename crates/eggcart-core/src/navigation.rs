//! Ports onto the hosting client: navigation and network status.

use async_trait::async_trait;
use thiserror::Error;

/// Soft navigation failed; the caller should fall back to a hard redirect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("navigation to {route} failed: {reason}")]
pub struct NavigationError {
    /// Route that could not be reached.
    pub route: String,
    /// Underlying cause.
    pub reason: String,
}

/// Moves the user between views.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// In-app navigation to `route`.
    async fn navigate(&self, route: &str) -> Result<(), NavigationError>;

    /// Full location change. Cannot fail from the caller's point of view.
    fn hard_redirect(&self, route: &str);

    /// Closes the checkout view.
    fn close_checkout(&self);
}

/// Reports whether the client currently has network connectivity.
pub trait Connectivity: Send + Sync {
    /// `true` while online.
    fn is_online(&self) -> bool;
}

//! Domain error types.

use thiserror::Error;

/// Top-level domain error type shared by every port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// No session, or the session has expired.
    #[error("authentication error: {0}")]
    Unauthenticated(String),

    /// The backend refused the operation for the current identity.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Authentication and permission failures will not change between
    /// attempts, so they short-circuit any retry loop.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_infrastructure_errors_are_transient() {
        assert!(DomainError::Infrastructure("socket closed".into()).is_transient());
        assert!(!DomainError::PermissionDenied("rls".into()).is_transient());
        assert!(!DomainError::Unauthenticated("expired".into()).is_transient());
        assert!(!DomainError::Validation("bad".into()).is_transient());
        assert!(!DomainError::NotFound("order".into()).is_transient());
    }
}

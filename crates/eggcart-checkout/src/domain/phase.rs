//! Checkout state machine phases.

use std::fmt;
use std::time::Duration;

use super::errors::CheckoutError;

/// Where a checkout currently is.
///
/// ```text
/// Idle → AuthVerifying → OrderCreating → ItemsCreating → NotifyingEmail
///      → Cleared → Redirecting → Completed
/// ```
///
/// `Error` is reachable from the first three active phases and may be
/// retried. `Cancelled` and `Expired` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Open, waiting for confirmation.
    Idle,
    /// Checking the session.
    AuthVerifying,
    /// Inserting the order row.
    OrderCreating,
    /// Inserting the line items.
    ItemsCreating,
    /// Sending the confirmation email.
    NotifyingEmail,
    /// Order committed and cart emptied.
    Cleared,
    /// Leaving for the order history.
    Redirecting,
    /// The view has been handed off.
    Completed,
    /// The last attempt failed.
    Error(CheckoutError),
    /// Abandoned before commit.
    Cancelled,
    /// The countdown elapsed.
    Expired,
}

impl CheckoutPhase {
    /// Whether a confirmation may start from here.
    #[must_use]
    pub fn accepts_confirm(&self) -> bool {
        matches!(self, Self::Idle | Self::Error(_))
    }

    /// Whether the order is already committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            Self::NotifyingEmail | Self::Cleared | Self::Redirecting | Self::Completed
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AuthVerifying => "auth_verifying",
            Self::OrderCreating => "order_creating",
            Self::ItemsCreating => "items_creating",
            Self::NotifyingEmail => "notifying_email",
            Self::Cleared => "cleared",
            Self::Redirecting => "redirecting",
            Self::Completed => "completed",
            Self::Error(_) => "error",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Formats remaining countdown time as `m:ss`.
#[must_use]
pub fn format_time_left(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

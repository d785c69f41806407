//! Checkout failures.

use thiserror::Error;

/// Why a checkout did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No live session, or the session lacks an email address.
    #[error("authentication required: {0}")]
    Authentication(String),

    /// The device was offline when confirming.
    #[error("device is offline")]
    Offline,

    /// Order creation did not finish within the timeout.
    #[error("order creation timed out")]
    NetworkTimeout,

    /// The order row could not be created.
    #[error("order creation failed: {0}")]
    OrderCreation(String),

    /// The line items could not be created; the order was rolled back.
    #[error("failed to create order items: {0}")]
    OrderItems(String),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The countdown elapsed.
    #[error("checkout expired")]
    Expired,

    /// The user abandoned the checkout.
    #[error("checkout cancelled")]
    Cancelled,

    /// Cancel was requested after the order commit began.
    #[error("order commit already started")]
    CommitStarted,
}

impl CheckoutError {
    /// Text shown to the user in the checkout view.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "Please login again to continue.",
            Self::Offline => "Please check your internet connection and try again.",
            Self::NetworkTimeout => "Network is slow. Please try again.",
            Self::OrderItems(_) => "Error creating order. Please try again.",
            Self::EmptyCart => "Your cart is empty.",
            Self::Expired => "Checkout session expired. Please start again.",
            Self::Cancelled => "Checkout cancelled.",
            Self::CommitStarted => "Your order is already being placed.",
            Self::OrderCreation(_) => {
                "There was an error processing your order. Please try again."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_match_failure_kind() {
        assert_eq!(
            CheckoutError::Authentication("no session".into()).user_message(),
            "Please login again to continue."
        );
        assert_eq!(
            CheckoutError::NetworkTimeout.user_message(),
            "Network is slow. Please try again."
        );
        assert_eq!(
            CheckoutError::OrderItems("down".into()).user_message(),
            "Error creating order. Please try again."
        );
    }
}

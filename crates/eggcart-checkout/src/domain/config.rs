//! Checkout tunables.

use std::time::Duration;

use eggcart_core::retry::RetryPolicy;
use rust_decimal::Decimal;

use super::pricing::PROMO_DELIVERY_FEE;

/// Timing and pricing knobs for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How long the checkout view stays open.
    pub countdown: Duration,
    /// Pause before the checkout view is revealed.
    pub reveal_delay: Duration,
    /// Absolute bound on the whole order-creation retry loop.
    pub order_timeout: Duration,
    /// Pause between clearing the cart and leaving the view.
    pub redirect_delay: Duration,
    /// How many times regained connectivity may re-run a failed checkout.
    pub max_recovery_attempts: u32,
    /// Retry schedule for every remote write.
    pub retry: RetryPolicy,
    /// Surcharge applied when the cart holds a promotional line.
    pub promo_delivery_fee: Decimal,
    /// Where the user lands after a successful checkout.
    pub order_history_route: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(600),
            reveal_delay: Duration::from_millis(4500),
            order_timeout: Duration::from_secs(30),
            redirect_delay: Duration::from_millis(1500),
            max_recovery_attempts: 3,
            retry: RetryPolicy::default(),
            promo_delivery_fee: PROMO_DELIVERY_FEE,
            order_history_route: "/orders".to_owned(),
        }
    }
}

//! Order totals.

use eggcart_cart::domain::state::CartState;
use rust_decimal::Decimal;
use serde::Serialize;

/// Flat delivery surcharge for carts containing a promotional line.
pub const PROMO_DELIVERY_FEE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Subtotal, fee and grand total of a cart at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    /// Σ(unit price × quantity).
    pub subtotal: Decimal,
    /// Delivery surcharge, zero without promotional lines.
    pub delivery_fee: Decimal,
    /// `subtotal + delivery_fee`; stored as the order total.
    pub grand_total: Decimal,
}

impl OrderTotals {
    /// Prices `cart`, charging `promo_fee` when any line is promotional.
    ///
    /// The subtotal is recomputed from the lines rather than taken from the
    /// running total.
    #[must_use]
    pub fn for_cart(cart: &CartState, promo_fee: Decimal) -> Self {
        let subtotal = cart.computed_total();
        let delivery_fee = if cart.has_promotional_item() {
            promo_fee
        } else {
            Decimal::ZERO
        };
        Self {
            subtotal,
            delivery_fee,
            grand_total: subtotal + delivery_fee,
        }
    }
}

//! Add-to-cart policy for promotional products.

use std::collections::HashSet;

use eggcart_cart::domain::state::{CartLineItem, CartState};
use eggcart_core::model::Product;
use serde::Serialize;

/// Largest quantity a promotional line may reach.
pub const PROMO_QUANTITY_CAP: u32 = 1;

/// What the product view should offer for an add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddDecision {
    /// The add may proceed.
    Allowed,
    /// The identity already bought this promotional product.
    OfferRedeemed,
    /// The promotional product is already in the cart.
    PromoLimitReached,
}

impl AddDecision {
    /// Whether the add button should be enabled.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Button label shown for a refused add.
    #[must_use]
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::OfferRedeemed => Some("Offer Redeemed"),
            Self::PromoLimitReached => Some("Limit 1 per customer"),
        }
    }
}

/// Decides whether `product` may be added to `cart`.
///
/// A purchased promotional product stays redeemed regardless of the cart's
/// contents, so the outcome survives a cleared cart.
#[must_use]
pub fn evaluate_add(product: &Product, cart: &CartState, purchased: &HashSet<String>) -> AddDecision {
    if !product.is_promotional {
        return AddDecision::Allowed;
    }
    if purchased.contains(&product.id) {
        return AddDecision::OfferRedeemed;
    }
    match cart.item(&product.id) {
        Some(line) if line.quantity >= PROMO_QUANTITY_CAP => AddDecision::PromoLimitReached,
        _ => AddDecision::Allowed,
    }
}

/// Upper bound for a line's quantity selector, `None` when unbounded.
#[must_use]
pub fn max_quantity(line: &CartLineItem) -> Option<u32> {
    line.is_promotional.then_some(PROMO_QUANTITY_CAP)
}

/// Clamps a requested quantity to the line's bound. Values of zero or less
/// pass through untouched so they still remove the line.
#[must_use]
pub fn clamp_quantity(line: &CartLineItem, requested: i64) -> i64 {
    match max_quantity(line) {
        Some(cap) if requested > i64::from(cap) => i64::from(cap),
        _ => requested,
    }
}

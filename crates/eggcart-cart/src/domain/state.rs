//! Cart state and reducer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::actions::{CartAction, NewCartItem};

/// Largest tolerated gap between the running total and the line sum.
pub const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product identifier, unique within the cart.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Image reference.
    pub image: String,
    /// Units in the cart, never 0.
    pub quantity: u32,
    /// Whether the product is promotional.
    pub is_promotional: bool,
    /// Time of the last local or remote change to this line.
    pub updated_at: DateTime<Utc>,
}

impl CartLineItem {
    /// Creates a single-unit line from an add payload.
    #[must_use]
    pub fn from_new(item: NewCartItem, at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            title: item.title,
            unit_price: item.unit_price,
            image: item.image,
            quantity: 1,
            is_promotional: item.is_promotional,
            updated_at: at,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Items in insertion order plus a running total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartLineItem>,
    total: Decimal,
}

impl CartState {
    /// The empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a state from lines, computing the total.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut items = items;
        items.retain(|item| item.quantity > 0);
        let total = items.iter().map(CartLineItem::line_total).sum();
        Self { items, total }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Running total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Looks up a line.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any line is promotional.
    #[must_use]
    pub fn has_promotional_item(&self) -> bool {
        self.items.iter().any(|item| item.is_promotional)
    }

    /// Σ(unit price × quantity), recomputed from scratch.
    #[must_use]
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Whether the running total has drifted past the tolerance.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        (self.computed_total() - self.total).abs() > TOTAL_TOLERANCE
    }

    /// Applies `action` stamped at `at`. Returns whether anything changed.
    pub fn reduce(&mut self, action: CartAction, at: DateTime<Utc>) -> bool {
        match action {
            CartAction::SetItems(items) => {
                *self = Self::from_items(items);
                true
            }
            CartAction::AddItem(new_item) => {
                if let Some(existing) = self.items.iter_mut().find(|item| item.id == new_item.id) {
                    let Some(quantity) = existing.quantity.checked_add(1) else {
                        return false;
                    };
                    existing.quantity = quantity;
                    existing.updated_at = at;
                    self.total += existing.unit_price;
                } else {
                    self.total += new_item.unit_price;
                    self.items.push(CartLineItem::from_new(new_item, at));
                }
                true
            }
            CartAction::RemoveItem(id) => self.remove(&id),
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    return self.remove(&id);
                }
                let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
                    return false;
                };
                let old = Decimal::from(item.quantity);
                self.total += item.unit_price * (Decimal::from(quantity) - old);
                item.quantity = quantity;
                item.updated_at = at;
                true
            }
            CartAction::ClearCart => {
                let changed = !self.items.is_empty() || !self.total.is_zero();
                *self = Self::empty();
                changed
            }
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        let removed = self.items.remove(index);
        self.total -= removed.line_total();
        true
    }

    /// Recomputes the total when it has drifted. Returns whether it did.
    pub fn repair(&mut self) -> bool {
        if !self.has_drift() {
            return false;
        }
        self.total = self.computed_total();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn new_item(id: &str, price: i64, promo: bool) -> NewCartItem {
        NewCartItem {
            id: id.to_owned(),
            title: format!("{id} title"),
            unit_price: Decimal::from(price),
            image: format!("/img/{id}.png"),
            is_promotional: promo,
        }
    }

    #[test]
    fn test_add_item_twice_increments_quantity_without_duplicating() {
        let mut state = CartState::empty();

        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity, 2);
        assert_eq!(state.total(), Decimal::from(180));
    }

    #[test]
    fn test_add_item_for_existing_line_charges_the_line_price() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());

        state.reduce(CartAction::AddItem(new_item("pack-6", 95, false)), at());

        assert_eq!(state.item("pack-6").unwrap().quantity, 2);
        assert_eq!(state.total(), Decimal::from(180));
        assert!(!state.has_drift());
    }

    #[test]
    fn test_add_item_at_maximum_quantity_leaves_total_alone() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("promo-2", 1, true)), at());
        state.reduce(
            CartAction::UpdateQuantity {
                id: "promo-2".into(),
                quantity: i64::from(u32::MAX),
            },
            at(),
        );
        let before = state.clone();

        let changed = state.reduce(CartAction::AddItem(new_item("promo-2", 1, true)), at());

        assert!(!changed);
        assert_eq!(state, before);
        assert_eq!(state.total(), Decimal::from(u32::MAX));
    }

    #[test]
    fn test_update_quantity_adjusts_total_by_difference() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());

        state.reduce(
            CartAction::UpdateQuantity {
                id: "pack-6".into(),
                quantity: 3,
            },
            at(),
        );

        assert_eq!(state.item("pack-6").unwrap().quantity, 3);
        assert_eq!(state.total(), Decimal::from(270));
    }

    #[test]
    fn test_update_quantity_to_zero_equals_remove() {
        let mut updated = CartState::empty();
        updated.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());
        updated.reduce(CartAction::AddItem(new_item("pack-30", 400, false)), at());
        let mut removed = updated.clone();

        updated.reduce(
            CartAction::UpdateQuantity {
                id: "pack-6".into(),
                quantity: 0,
            },
            at(),
        );
        removed.reduce(CartAction::RemoveItem("pack-6".into()), at());

        assert_eq!(updated, removed);
        assert_eq!(updated.total(), Decimal::from(400));
    }

    #[test]
    fn test_update_quantity_for_unknown_id_changes_nothing() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());
        let before = state.clone();

        let changed = state.reduce(
            CartAction::UpdateQuantity {
                id: "missing".into(),
                quantity: 4,
            },
            at(),
        );

        assert!(!changed);
        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_unknown_id_is_a_no_op() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());

        let changed = state.reduce(CartAction::RemoveItem("missing".into()), at());

        assert!(!changed);
        assert_eq!(state.total(), Decimal::from(90));
    }

    #[test]
    fn test_remove_subtracts_price_times_quantity() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());
        state.reduce(
            CartAction::UpdateQuantity {
                id: "pack-6".into(),
                quantity: 4,
            },
            at(),
        );
        state.reduce(CartAction::AddItem(new_item("pack-12", 170, false)), at());

        state.reduce(CartAction::RemoveItem("pack-6".into()), at());

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.total(), Decimal::from(170));
    }

    #[test]
    fn test_total_matches_line_sum_over_mixed_sequence() {
        let mut state = CartState::empty();
        let prices = [("a", "12.35"), ("b", "0.10"), ("c", "99.99"), ("d", "7.07")];
        for step in 0_i64..200 {
            let (id, price) = prices[usize::try_from(step).unwrap() % prices.len()];
            let item = NewCartItem {
                id: id.into(),
                title: id.into(),
                unit_price: price.parse().unwrap(),
                image: String::new(),
                is_promotional: false,
            };
            let action = match step % 5 {
                0 | 1 => CartAction::AddItem(item),
                2 => CartAction::UpdateQuantity {
                    id: id.into(),
                    quantity: (step % 7) - 1,
                },
                3 => CartAction::RemoveItem(id.into()),
                _ => CartAction::UpdateQuantity {
                    id: id.into(),
                    quantity: step % 4 + 1,
                },
            };

            state.reduce(action, at());

            assert!(!state.has_drift(), "drift after step {step}");
            assert!(state.items().iter().all(|item| item.quantity > 0));
        }
    }

    #[test]
    fn test_repair_recomputes_drifted_total() {
        let mut state: CartState = serde_json::from_value(serde_json::json!({
            "items": [{
                "id": "pack-6", "title": "Six", "unit_price": 90, "image": "",
                "quantity": 2, "is_promotional": false,
                "updated_at": "2026-01-15T10:00:00Z"
            }],
            "total": 95
        }))
        .unwrap();

        assert!(state.has_drift());
        assert!(state.repair());
        assert_eq!(state.total(), Decimal::from(180));
        assert!(!state.repair());
    }

    #[test]
    fn test_clear_cart_resets_to_empty() {
        let mut state = CartState::empty();
        state.reduce(CartAction::AddItem(new_item("pack-6", 90, false)), at());

        state.reduce(CartAction::ClearCart, at());

        assert!(state.is_empty());
        assert!(state.total().is_zero());
    }
}

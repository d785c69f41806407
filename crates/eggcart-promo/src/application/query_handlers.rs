//! Eligibility queries and the guarded add.

use std::collections::HashSet;

use eggcart_cart::application::store::CartStore;
use eggcart_cart::domain::actions::NewCartItem;
use eggcart_core::model::Product;
use eggcart_core::repository::OrderRepository;
use eggcart_core::session::Session;
use tracing::{debug, instrument, warn};

use crate::domain::policy::{AddDecision, evaluate_add};

/// Distinct promotional product ids on the identity's non-cancelled orders.
///
/// Without an identity the set is empty. Backend failures are logged and
/// also yield an empty set; the result is advisory.
#[instrument(skip_all, fields(user_id = ?session.map(|s| s.user_id)))]
pub async fn purchased_promo_items(
    session: Option<&Session>,
    orders: &dyn OrderRepository,
) -> HashSet<String> {
    let Some(session) = session else {
        return HashSet::new();
    };
    match orders.purchased_promo_product_ids(session.user_id).await {
        Ok(ids) => {
            debug!(count = ids.len(), "loaded purchased promotional items");
            ids
        }
        Err(err) => {
            warn!(error = %err, "could not load purchased promotional items");
            HashSet::new()
        }
    }
}

/// Adds `product` to the cart when the policy allows it.
pub fn add_to_cart(store: &CartStore, product: &Product, purchased: &HashSet<String>) -> AddDecision {
    let decision = evaluate_add(product, &store.snapshot(), purchased);
    if decision.is_allowed() {
        store.add_item(NewCartItem::from(product));
    } else {
        debug!(product_id = %product.id, ?decision, "add refused");
    }
    decision
}

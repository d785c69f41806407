//! The cart store object.
//!
//! One store per session. State lives inside a `watch` channel so that
//! mutations are serialized in dispatch order and every subscriber sees the
//! latest state. The local mirror is written after each change; failures
//! there are logged and never reach the caller.
//!
//! Every line that leaves the cart leaves a removal mark stamped with the
//! time of the removal. Remote replays consult it so that a delayed insert
//! cannot resurrect a line the session already dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use eggcart_core::clock::Clock;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::mirror::LocalCartMirror;
use crate::domain::actions::{CartAction, NewCartItem};
use crate::domain::state::{CartLineItem, CartState};

/// Authoritative in-session cart.
pub struct CartStore {
    state: watch::Sender<CartState>,
    removed: Mutex<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
    mirror: Option<Arc<dyn LocalCartMirror>>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.state.borrow())
            .field("mirrored", &self.mirror.is_some())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Creates an empty store without a local mirror.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(CartState::empty());
        Self {
            state,
            removed: Mutex::default(),
            clock,
            mirror: None,
        }
    }

    /// Creates a store seeded from the local mirror.
    ///
    /// An unreadable mirror yields an empty cart; a drifted total is
    /// repaired on load.
    #[must_use]
    pub fn with_local_mirror(clock: Arc<dyn Clock>, mirror: Arc<dyn LocalCartMirror>) -> Self {
        let initial = match mirror.load() {
            Ok(Some(state)) => state,
            Ok(None) => CartState::empty(),
            Err(err) => {
                warn!(error = %err, "could not read local cart mirror, starting empty");
                CartState::empty()
            }
        };
        let (state, _) = watch::channel(initial);
        let store = Self {
            state,
            removed: Mutex::default(),
            clock,
            mirror: Some(mirror),
        };
        store.verify_total();
        store
    }

    /// Applies an action. Returns whether the state changed.
    pub fn dispatch(&self, action: CartAction) -> bool {
        let at = self.clock.now();
        self.dispatch_at(action, at)
    }

    /// Applies an action stamped with an explicit modification time.
    ///
    /// Used when replaying remote changes so the line keeps the remote
    /// version.
    pub fn dispatch_at(&self, action: CartAction, at: DateTime<Utc>) -> bool {
        debug!(?action, "cart action");
        let mut dropped: Vec<String> = Vec::new();
        let changed = self.state.send_if_modified(|state| {
            let before: Vec<String> = state.items().iter().map(|item| item.id.clone()).collect();
            let changed = state.reduce(action, at);
            dropped = before
                .into_iter()
                .filter(|id| state.item(id).is_none())
                .collect();
            changed
        });
        if !dropped.is_empty() {
            let mut removed = self.removed.lock().unwrap_or_else(PoisonError::into_inner);
            for id in dropped {
                removed.insert(id, at);
            }
        }
        if changed {
            self.persist_locally();
        }
        changed
    }

    /// When the line `id` last left the cart, if it ever did.
    #[must_use]
    pub fn removed_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.removed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    /// Replaces every line.
    pub fn set_items(&self, items: Vec<CartLineItem>) {
        self.dispatch(CartAction::SetItems(items));
    }

    /// Adds one unit of a product.
    pub fn add_item(&self, item: NewCartItem) {
        self.dispatch(CartAction::AddItem(item));
    }

    /// Removes a line; unknown ids are ignored.
    pub fn remove_item(&self, id: &str) {
        self.dispatch(CartAction::RemoveItem(id.to_owned()));
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn update_quantity(&self, id: &str, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity {
            id: id.to_owned(),
            quantity,
        });
    }

    /// Empties the cart.
    pub fn clear_cart(&self) {
        self.dispatch(CartAction::ClearCart);
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Current running total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.borrow().total()
    }

    /// A receiver notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Recomputes the total from the lines and repairs it on drift.
    /// Returns whether a repair happened.
    pub fn verify_total(&self) -> bool {
        let repaired = self.state.send_if_modified(|state| {
            let drift = state.computed_total() - state.total();
            let repaired = state.repair();
            if repaired {
                warn!(%drift, "cart total drifted, recomputed from lines");
            }
            repaired
        });
        if repaired {
            self.persist_locally();
        }
        repaired
    }

    /// Runs [`CartStore::verify_total`] every `period` until aborted.
    #[must_use]
    pub fn spawn_consistency_check(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.verify_total();
            }
        })
    }

    fn persist_locally(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let snapshot = self.snapshot();
        if let Err(err) = mirror.save(&snapshot) {
            warn!(error = %err, "could not write local cart mirror");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mirror::JsonFileMirror;
    use eggcart_test_support::{FixedClock, fixed_now};

    fn store() -> CartStore {
        CartStore::new(Arc::new(FixedClock(fixed_now())))
    }

    fn eggs(id: &str, price: i64, promo: bool) -> NewCartItem {
        NewCartItem {
            id: id.to_owned(),
            title: format!("Brown eggs {id}"),
            unit_price: Decimal::from(price),
            image: String::new(),
            is_promotional: promo,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("eggcart-{name}-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_update_quantity_on_pack_of_six_adds_180() {
        // Arrange
        let store = store();
        store.add_item(eggs("pack-6", 90, false));

        // Act
        store.update_quantity("pack-6", 3);

        // Assert
        let state = store.snapshot();
        assert_eq!(state.item("pack-6").unwrap().quantity, 3);
        assert_eq!(state.total(), Decimal::from(270));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified_on_change_only() {
        let store = store();
        let mut changes = store.subscribe();

        store.remove_item("missing");
        assert!(!changes.has_changed().unwrap());

        store.add_item(eggs("pack-6", 90, false));
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().total(), Decimal::from(90));
    }

    #[test]
    fn test_clear_cart_empties_items_and_total() {
        let store = store();
        store.add_item(eggs("pack-6", 90, false));
        store.add_item(eggs("promo-2", 10, true));

        store.clear_cart();

        assert!(store.snapshot().is_empty());
        assert!(store.total().is_zero());
    }

    #[test]
    fn test_every_way_of_dropping_a_line_leaves_a_removal_mark() {
        let store = store();
        store.add_item(eggs("pack-6", 90, false));
        store.add_item(eggs("pack-12", 170, false));
        store.add_item(eggs("promo-2", 10, true));

        store.remove_item("pack-6");
        store.update_quantity("pack-12", 0);
        store.clear_cart();

        for id in ["pack-6", "pack-12", "promo-2"] {
            assert_eq!(store.removed_at(id), Some(fixed_now()), "{id}");
        }
        assert_eq!(store.removed_at("never-added"), None);
    }

    #[test]
    fn test_local_mirror_round_trips_between_sessions() {
        let path = temp_path("roundtrip");
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
        {
            let store =
                CartStore::with_local_mirror(clock.clone(), Arc::new(JsonFileMirror::new(&path)));
            store.add_item(eggs("pack-6", 90, false));
            store.add_item(eggs("pack-6", 90, false));
        }

        let reloaded = CartStore::with_local_mirror(clock, Arc::new(JsonFileMirror::new(&path)));

        assert_eq!(reloaded.snapshot().item("pack-6").unwrap().quantity, 2);
        assert_eq!(reloaded.total(), Decimal::from(180));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_loading_drifted_mirror_repairs_total() {
        let path = temp_path("drift");
        std::fs::write(
            &path,
            r#"{"items":[{"id":"pack-6","title":"Six","unit_price":"90","image":"",
               "quantity":1,"is_promotional":false,"updated_at":"2026-01-15T10:00:00Z"}],
               "total":"12"}"#,
        )
        .unwrap();

        let store = CartStore::with_local_mirror(
            Arc::new(FixedClock(fixed_now())),
            Arc::new(JsonFileMirror::new(&path)),
        );

        assert_eq!(store.total(), Decimal::from(90));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unreadable_mirror_starts_empty() {
        let path = temp_path("garbage");
        std::fs::write(&path, "not json").unwrap();

        let store = CartStore::with_local_mirror(
            Arc::new(FixedClock(fixed_now())),
            Arc::new(JsonFileMirror::new(&path)),
        );

        assert!(store.snapshot().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consistency_check_task_runs_and_can_be_aborted() {
        let store = Arc::new(store());
        store.add_item(eggs("pack-6", 90, false));

        let handle = store.spawn_consistency_check(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(61)).await;
        handle.abort();

        assert_eq!(store.total(), Decimal::from(90));
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}

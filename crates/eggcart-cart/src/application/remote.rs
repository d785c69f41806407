//! Remote mirror synchronization.
//!
//! On sign-in the store is seeded from the identity's `cart_items` rows.
//! After that two background tasks run: one applies the push-based change
//! feed to the store, the other diffs local state against the remote rows
//! and writes the difference. Local state stays authoritative for the
//! running session; remote writes are best-effort.
//!
//! A change is only applied when it is newer than the local line it
//! touches. Inserts and updates must also be newer than the last local
//! removal of that line, so an echo of a write made before the removal
//! does not bring the line back.

use std::collections::HashMap;
use std::sync::Arc;

use eggcart_core::error::DomainError;
use eggcart_core::feed::{CartChange, CartChangeSource, CartChangeStream};
use eggcart_core::model::{Product, RemoteCartRow};
use eggcart_core::repository::{CartRepository, ProductCatalog};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::store::CartStore;
use crate::domain::actions::{CartAction, NewCartItem};
use crate::domain::state::{CartLineItem, CartState};

fn line_from_row(product: &Product, row: &RemoteCartRow) -> CartLineItem {
    CartLineItem {
        id: product.id.clone(),
        title: product.title.clone(),
        unit_price: product.price,
        image: product.image.clone(),
        quantity: row.quantity,
        is_promotional: product.is_promotional,
        updated_at: row.updated_at,
    }
}

/// Keeps one identity's cart store and remote mirror in step.
pub struct RemoteCartSync {
    user_id: Uuid,
    store: Arc<CartStore>,
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl std::fmt::Debug for RemoteCartSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartSync")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl RemoteCartSync {
    /// Creates a synchronizer; nothing runs until [`seed`](Self::seed) or
    /// [`spawn`](Self::spawn).
    #[must_use]
    pub fn new(
        user_id: Uuid,
        store: Arc<CartStore>,
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            user_id,
            store,
            carts,
            catalog,
        }
    }

    /// Seeds, subscribes and starts both background tasks.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the subscription or the initial load fails.
    pub async fn establish(
        user_id: Uuid,
        store: Arc<CartStore>,
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn ProductCatalog>,
        source: &dyn CartChangeSource,
    ) -> Result<(Arc<Self>, SyncHandle), DomainError> {
        let sync = Arc::new(Self::new(user_id, store, carts, catalog));
        // Subscribe first: changes committed while seeding must still arrive.
        let feed = source.subscribe(user_id).await?;
        sync.seed().await?;
        let handle = Arc::clone(&sync).spawn(feed);
        Ok((sync, handle))
    }

    /// Replaces the store's lines with the remote record.
    ///
    /// Rows whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the rows or products cannot be loaded.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn seed(&self) -> Result<usize, DomainError> {
        let rows = self.carts.load_rows(self.user_id).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.catalog.product(&row.product_id).await? {
                Some(product) => items.push(line_from_row(&product, row)),
                None => warn!(product_id = %row.product_id, "cart row references unknown product"),
            }
        }
        let count = items.len();
        self.store.set_items(items);
        info!(count, "cart seeded from remote mirror");
        Ok(count)
    }

    /// Writes the difference between `state` and the remote rows: inserts
    /// and quantity changes are upserted, vanished lines deleted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` on the first failed remote call.
    pub async fn push(&self, state: &CartState) -> Result<(), DomainError> {
        let mut remote: HashMap<String, u32> = self
            .carts
            .load_rows(self.user_id)
            .await?
            .into_iter()
            .map(|row| (row.product_id, row.quantity))
            .collect();
        for item in state.items() {
            if remote.remove(&item.id) != Some(item.quantity) {
                self.carts
                    .upsert_row(self.user_id, &item.id, item.quantity, item.updated_at)
                    .await?;
            }
        }
        if !remote.is_empty() {
            let removed: Vec<String> = remote.into_keys().collect();
            self.carts.delete_rows(self.user_id, &removed).await?;
        }
        Ok(())
    }

    /// Applies one change notification. Returns whether the store changed.
    ///
    /// Inserts and updates for unknown lines hydrate the product and add
    /// it; for known lines they set the quantity. Deletes remove the line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the product lookup fails.
    pub async fn apply_change(&self, change: CartChange) -> Result<bool, DomainError> {
        if change.user_id() != self.user_id {
            return Ok(false);
        }
        let at = change.updated_at();
        let local = self.store.snapshot().item(change.product_id()).cloned();
        if local.as_ref().is_some_and(|line| line.updated_at >= at) {
            debug!(product_id = change.product_id(), "ignoring stale cart change");
            return Ok(false);
        }
        if local.is_none()
            && !matches!(change, CartChange::Deleted { .. })
            && self
                .store
                .removed_at(change.product_id())
                .is_some_and(|removed_at| removed_at >= at)
        {
            debug!(product_id = change.product_id(), "ignoring change to removed line");
            return Ok(false);
        }

        match change {
            CartChange::Deleted { product_id, .. } => {
                Ok(self.store.dispatch_at(CartAction::RemoveItem(product_id), at))
            }
            CartChange::Inserted(row) | CartChange::Updated(row) => {
                let quantity = i64::from(row.quantity);
                if local.is_some() {
                    return Ok(self.store.dispatch_at(
                        CartAction::UpdateQuantity {
                            id: row.product_id,
                            quantity,
                        },
                        at,
                    ));
                }
                let Some(product) = self.catalog.product(&row.product_id).await? else {
                    warn!(product_id = %row.product_id, "change references unknown product");
                    return Ok(false);
                };
                self.store
                    .dispatch_at(CartAction::AddItem(NewCartItem::from(&product)), at);
                if quantity > 1 {
                    self.store.dispatch_at(
                        CartAction::UpdateQuantity {
                            id: row.product_id,
                            quantity,
                        },
                        at,
                    );
                }
                Ok(true)
            }
        }
    }

    /// Starts the feed applier and the push worker.
    #[must_use]
    pub fn spawn(self: Arc<Self>, mut feed: CartChangeStream) -> SyncHandle {
        let applier = {
            let sync = Arc::clone(&self);
            tokio::spawn(async move {
                while let Some(change) = feed.recv().await {
                    if let Err(err) = sync.apply_change(change).await {
                        warn!(error = %err, "could not apply cart change");
                    }
                }
                debug!("cart change feed closed");
            })
        };
        let pusher = {
            let mut changes = self.store.subscribe();
            tokio::spawn(async move {
                while changes.changed().await.is_ok() {
                    let snapshot = changes.borrow_and_update().clone();
                    if let Err(err) = self.push(&snapshot).await {
                        warn!(error = %err, "could not push cart to remote mirror");
                    }
                }
            })
        };
        SyncHandle {
            tasks: vec![applier, pusher],
        }
    }
}

/// Owns the background sync tasks; dropping it stops them.
#[derive(Debug)]
pub struct SyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stops both tasks (sign-out).
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

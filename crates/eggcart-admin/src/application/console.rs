//! The order management console.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use eggcart_core::error::DomainError;
use eggcart_core::model::{Order, OrderLineItem, OrderStatus};
use eggcart_core::repository::OrderRepository;
use eggcart_core::session::Session;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::access::AdminAccess;
use crate::domain::pending::{PendingChange, StagedField};

/// Console failures.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Nobody is signed in.
    #[error("sign in to manage orders")]
    SignedOut,

    /// The signed-in identity is not on the operator allow-list.
    #[error("you don't have permission to access this area")]
    Forbidden,

    /// The order is not in the loaded list.
    #[error("order {0} is not loaded")]
    UnknownOrder(Uuid),

    /// Commit requested before both status and notes were staged.
    #[error("order {0} needs both status and notes staged")]
    Incomplete(Uuid),

    /// The backend call failed.
    #[error(transparent)]
    Repository(#[from] DomainError),
}

/// Loaded orders plus uncommitted edits.
pub struct OrderConsole {
    repository: Arc<dyn OrderRepository>,
    orders: Vec<Order>,
    pending: HashMap<Uuid, PendingChange>,
}

impl std::fmt::Debug for OrderConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderConsole")
            .field("orders", &self.orders.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl OrderConsole {
    /// Opens an empty console for an operator; call [`load`](Self::load)
    /// before use.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::SignedOut` without a session and
    /// `AdminError::Forbidden` when the session's email is not on `access`.
    #[instrument(skip_all, fields(user_id = ?session.map(|s| s.user_id)))]
    pub fn open(
        session: Option<&Session>,
        access: &AdminAccess,
        repository: Arc<dyn OrderRepository>,
    ) -> Result<Self, AdminError> {
        let session = session.ok_or(AdminError::SignedOut)?;
        if !session
            .email
            .as_deref()
            .is_some_and(|email| access.is_admin(email))
        {
            warn!("order console refused");
            return Err(AdminError::Forbidden);
        }
        Ok(Self {
            repository,
            orders: Vec::new(),
            pending: HashMap::new(),
        })
    }

    /// Fetches every order, newest first. Pending edits for orders that
    /// vanished are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` if the list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<&[Order], AdminError> {
        let mut orders = self.repository.list_orders().await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.pending
            .retain(|id, _| orders.iter().any(|order| order.id == *id));
        info!(count = orders.len(), "orders loaded");
        self.orders = orders;
        Ok(&self.orders)
    }

    /// Loaded orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders with `status`, or all of them for `None`.
    #[must_use]
    pub fn filter_by_status(&self, status: Option<OrderStatus>) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|order| status.is_none_or(|wanted| order.status == wanted))
            .collect()
    }

    /// Number of loaded orders per status; every status is present.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<OrderStatus, usize> {
        let mut counts: BTreeMap<OrderStatus, usize> =
            OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for order in &self.orders {
            *counts.entry(order.status).or_default() += 1;
        }
        counts
    }

    /// Line items of one order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` if the items cannot be loaded.
    pub async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, AdminError> {
        Ok(self.repository.order_items(order_id).await?)
    }

    /// Stages one field for `order_id`, merging with earlier edits.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UnknownOrder` if the order is not loaded.
    pub fn stage_change(&mut self, order_id: Uuid, field: StagedField) -> Result<(), AdminError> {
        if !self.orders.iter().any(|order| order.id == order_id) {
            return Err(AdminError::UnknownOrder(order_id));
        }
        self.pending
            .entry(order_id)
            .or_insert_with(|| PendingChange::new(order_id))
            .stage(field);
        Ok(())
    }

    /// Uncommitted edits for `order_id`.
    #[must_use]
    pub fn pending(&self, order_id: Uuid) -> Option<&PendingChange> {
        self.pending.get(&order_id)
    }

    /// Whether both status and notes are staged.
    #[must_use]
    pub fn can_commit(&self, order_id: Uuid) -> bool {
        self.pending
            .get(&order_id)
            .is_some_and(|change| change.complete().is_some())
    }

    /// Drops the edits for `order_id`. Returns whether any existed.
    pub fn discard_change(&mut self, order_id: Uuid) -> bool {
        self.pending.remove(&order_id).is_some()
    }

    /// Writes status and notes in one update and patches the loaded list.
    /// On failure the staged edits are kept for another try.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Incomplete` unless both fields are staged, or
    /// `AdminError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn commit_change(&mut self, order_id: Uuid) -> Result<&Order, AdminError> {
        let (status, notes) = self
            .pending
            .get(&order_id)
            .and_then(PendingChange::complete)
            .map(|(status, notes)| (status, notes.to_owned()))
            .ok_or(AdminError::Incomplete(order_id))?;

        if let Err(err) = self
            .repository
            .update_status_and_notes(order_id, status, &notes)
            .await
        {
            warn!(%order_id, error = %err, "order update failed, keeping staged change");
            return Err(err.into());
        }

        self.pending.remove(&order_id);
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(AdminError::UnknownOrder(order_id))?;
        order.status = status;
        order.notes = notes;
        info!(%order_id, %status, "order updated");
        Ok(order)
    }
}

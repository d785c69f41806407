//! The checkout orchestrator.
//!
//! One orchestrator per opened checkout view. A confirmation walks the
//! phases in [`CheckoutPhase`] order; the phase is published on a `watch`
//! channel for the view. A processing flag turns concurrent confirmations
//! into no-ops, so at most one order is created per successful commit.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use eggcart_cart::application::store::CartStore;
use eggcart_cart::domain::state::CartState;
use eggcart_core::clock::Clock;
use eggcart_core::error::DomainError;
use eggcart_core::model::{NewOrder, Order, OrderLineItem, OrderStatus};
use eggcart_core::navigation::{Connectivity, Navigator};
use eggcart_core::notification::{
    NotificationDispatcher, NotificationItem, NotificationOrder, OrderConfirmationRequest,
};
use eggcart_core::repository::OrderRepository;
use eggcart_core::retry::{Sleeper, retry};
use eggcart_core::session::SessionProvider;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::config::CheckoutConfig;
use crate::domain::errors::CheckoutError;
use crate::domain::phase::CheckoutPhase;
use crate::domain::pricing::OrderTotals;

/// Collaborators a checkout talks to.
#[derive(Clone)]
pub struct CheckoutPorts {
    /// Current identity.
    pub sessions: Arc<dyn SessionProvider>,
    /// `orders` and `order_items`.
    pub orders: Arc<dyn OrderRepository>,
    /// Confirmation email sender.
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    /// View navigation.
    pub navigator: Arc<dyn Navigator>,
    /// Network status.
    pub connectivity: Arc<dyn Connectivity>,
    /// Backoff, reveal and redirect delays.
    pub sleeper: Arc<dyn Sleeper>,
    /// Wall clock for session expiry and order timestamps.
    pub clock: Arc<dyn Clock>,
}

/// Result of a confirmation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The order was committed.
    Placed {
        /// The stored order.
        order: Order,
        /// Totals charged.
        totals: OrderTotals,
    },
    /// Another confirmation is running or already succeeded.
    Ignored,
}

struct Customer {
    user_id: Uuid,
    email: String,
    full_name: Option<String>,
}

struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives one checkout from confirmation to hand-off.
pub struct CheckoutOrchestrator {
    cart: Arc<CartStore>,
    ports: CheckoutPorts,
    config: CheckoutConfig,
    phase: watch::Sender<CheckoutPhase>,
    processing: AtomicBool,
    expired: AtomicBool,
    recovery_attempts: AtomicU32,
    deadline: OnceLock<Instant>,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("phase", &*self.phase.borrow())
            .field("processing", &self.processing.load(Ordering::SeqCst))
            .field("recovery_attempts", &self.recovery_attempts.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Creates an idle checkout over `cart`.
    #[must_use]
    pub fn new(cart: Arc<CartStore>, ports: CheckoutPorts, config: CheckoutConfig) -> Self {
        let (phase, _) = watch::channel(CheckoutPhase::Idle);
        Self {
            cart,
            ports,
            config,
            phase,
            processing: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            recovery_attempts: AtomicU32::new(0),
            deadline: OnceLock::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        self.phase.borrow().clone()
    }

    /// A receiver notified on every phase change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Remaining countdown, `None` before the view is revealed.
    #[must_use]
    pub fn time_left(&self) -> Option<Duration> {
        self.deadline
            .get()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Reveals the checkout view after the reveal delay and starts the
    /// countdown. When the countdown elapses the checkout expires.
    #[must_use]
    pub fn open(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.ports.sleeper.sleep(this.config.reveal_delay).await;
            let deadline = Instant::now() + this.config.countdown;
            if this.deadline.set(deadline).is_err() {
                warn!("checkout already opened");
                return;
            }
            info!(countdown = ?this.config.countdown, "checkout opened");
            tokio::time::sleep_until(deadline).await;
            this.expire();
        })
    }

    /// Abandons the checkout and closes the view unless the order is
    /// already committed. An in-flight order creation is left to finish.
    pub fn expire(&self) {
        let phase = self.phase();
        if phase.is_committed() || phase.is_terminal() {
            return;
        }
        self.expired.store(true, Ordering::SeqCst);
        if self.processing.load(Ordering::SeqCst) {
            warn!("checkout expired while an order commit is in flight");
        } else {
            self.set_phase(CheckoutPhase::Expired);
        }
        info!("checkout expired");
        self.ports.navigator.close_checkout();
    }

    /// Closes the checkout without ordering.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CommitStarted` once order creation has begun.
    pub fn cancel(&self) -> Result<(), CheckoutError> {
        if self.processing.load(Ordering::SeqCst) || !self.phase.borrow().accepts_confirm() {
            return Err(CheckoutError::CommitStarted);
        }
        self.set_phase(CheckoutPhase::Cancelled);
        self.ports.navigator.close_checkout();
        Ok(())
    }

    /// Places the order for the current cart.
    ///
    /// Returns [`ConfirmOutcome::Ignored`] when another confirmation is in
    /// progress or has already succeeded.
    ///
    /// # Errors
    ///
    /// Returns the `CheckoutError` that stopped the flow; the phase moves
    /// to `Error` for retryable failures.
    #[instrument(skip(self))]
    pub async fn confirm(&self) -> Result<ConfirmOutcome, CheckoutError> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("confirmation already in progress");
            return Ok(ConfirmOutcome::Ignored);
        }
        let _guard = ProcessingGuard(&self.processing);

        match self.phase() {
            CheckoutPhase::Expired => return Err(CheckoutError::Expired),
            CheckoutPhase::Cancelled => return Err(CheckoutError::Cancelled),
            phase if !phase.accepts_confirm() => return Ok(ConfirmOutcome::Ignored),
            _ => {}
        }
        if self.expired.load(Ordering::SeqCst) {
            self.set_phase(CheckoutPhase::Expired);
            return Err(CheckoutError::Expired);
        }
        if !self.ports.connectivity.is_online() {
            self.set_phase(CheckoutPhase::Error(CheckoutError::Offline));
            return Err(CheckoutError::Offline);
        }

        match self.run().await {
            Ok((order, totals)) => Ok(ConfirmOutcome::Placed { order, totals }),
            Err(err) => {
                error!(error = %err, "checkout failed");
                if self.expired.load(Ordering::SeqCst) {
                    self.set_phase(CheckoutPhase::Expired);
                } else {
                    self.set_phase(CheckoutPhase::Error(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Re-runs a failed checkout after the network comes back.
    ///
    /// Returns `None` when there is nothing to recover or the recovery
    /// budget is spent.
    pub async fn on_connectivity_restored(&self) -> Option<Result<ConfirmOutcome, CheckoutError>> {
        if !matches!(self.phase(), CheckoutPhase::Error(_)) {
            return None;
        }
        let attempt = self.recovery_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > self.config.max_recovery_attempts {
            warn!(
                max = self.config.max_recovery_attempts,
                "network recovery attempts exhausted"
            );
            return None;
        }
        info!(attempt, "connectivity restored, retrying checkout");
        Some(self.confirm().await)
    }

    /// Recovery attempts used so far.
    #[must_use]
    pub fn recovery_attempts(&self) -> u32 {
        self.recovery_attempts
            .load(Ordering::SeqCst)
            .min(self.config.max_recovery_attempts)
    }

    async fn run(&self) -> Result<(Order, OrderTotals), CheckoutError> {
        self.set_phase(CheckoutPhase::AuthVerifying);
        let customer = self.verify_session().await?;

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let totals = OrderTotals::for_cart(&cart, self.config.promo_delivery_fee);

        self.set_phase(CheckoutPhase::OrderCreating);
        let order = self.create_order(&customer, &totals).await?;
        info!(order_id = %order.id, total = %totals.grand_total, "order created");

        self.set_phase(CheckoutPhase::ItemsCreating);
        self.create_order_items(&order, &cart).await?;

        self.set_phase(CheckoutPhase::NotifyingEmail);
        self.notify(&customer, &order, &totals, &cart).await;

        self.cart.clear_cart();
        self.set_phase(CheckoutPhase::Cleared);

        self.set_phase(CheckoutPhase::Redirecting);
        self.ports.sleeper.sleep(self.config.redirect_delay).await;
        self.hand_off().await;
        self.set_phase(CheckoutPhase::Completed);

        Ok((order, totals))
    }

    async fn verify_session(&self) -> Result<Customer, CheckoutError> {
        let session = self
            .ports
            .sessions
            .current_session()
            .await
            .map_err(|err| CheckoutError::Authentication(err.to_string()))?
            .filter(|session| session.is_live(self.ports.clock.now()))
            .ok_or_else(|| CheckoutError::Authentication("no live session".into()))?;
        let email = session
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| CheckoutError::Authentication("session has no email".into()))?;
        Ok(Customer {
            user_id: session.user_id,
            email,
            full_name: session.full_name,
        })
    }

    async fn create_order(
        &self,
        customer: &Customer,
        totals: &OrderTotals,
    ) -> Result<Order, CheckoutError> {
        let new_order = NewOrder {
            user_id: customer.user_id,
            total_amount: totals.grand_total,
            status: OrderStatus::Processing,
            created_at: self.ports.clock.now(),
        };
        let orders = &self.ports.orders;
        let attempts = retry(&self.config.retry, self.ports.sleeper.as_ref(), || {
            orders.create_order(new_order.clone())
        });
        match tokio::time::timeout(self.config.order_timeout, attempts).await {
            Err(_) => Err(CheckoutError::NetworkTimeout),
            Ok(Err(DomainError::Unauthenticated(msg))) => Err(CheckoutError::Authentication(msg)),
            Ok(Err(err)) => Err(CheckoutError::OrderCreation(err.to_string())),
            Ok(Ok(order)) => Ok(order),
        }
    }

    async fn create_order_items(&self, order: &Order, cart: &CartState) -> Result<(), CheckoutError> {
        let items: Vec<OrderLineItem> = cart
            .items()
            .iter()
            .map(|line| OrderLineItem {
                order_id: order.id,
                product_id: line.id.clone(),
                product_name: line.title.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let orders = &self.ports.orders;
        let result = retry(&self.config.retry, self.ports.sleeper.as_ref(), || {
            orders.create_order_items(&items)
        })
        .await;
        let Err(err) = result else {
            return Ok(());
        };

        error!(order_id = %order.id, error = %err, "order items failed, removing order");
        if let Err(compensation) = orders.delete_order(order.id).await {
            error!(
                order_id = %order.id,
                error = %compensation,
                "could not remove orphaned order, manual reconciliation required"
            );
        }
        Err(CheckoutError::OrderItems(err.to_string()))
    }

    async fn notify(
        &self,
        customer: &Customer,
        order: &Order,
        totals: &OrderTotals,
        cart: &CartState,
    ) {
        let request = OrderConfirmationRequest {
            order: NotificationOrder {
                id: order.id.to_string(),
                user_full_name: customer.full_name.clone(),
                created_at: order.created_at,
                status: order.status.to_string(),
                order_notes: (!order.notes.is_empty()).then(|| order.notes.clone()),
                delivery_fee: Some(totals.delivery_fee),
                final_total: Some(totals.grand_total),
            },
            email: customer.email.clone(),
            items: cart
                .items()
                .iter()
                .map(|line| NotificationItem {
                    product_name: line.title.clone(),
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        };
        let dispatcher = &self.ports.dispatcher;
        let sent = retry(&self.config.retry, self.ports.sleeper.as_ref(), || {
            dispatcher.dispatch_order_confirmation(&request)
        })
        .await;
        if let Err(err) = sent {
            warn!(order_id = %order.id, error = %err, "confirmation email not sent");
        }
    }

    async fn hand_off(&self) {
        let route = self.config.order_history_route.as_str();
        match self.ports.navigator.navigate(route).await {
            Ok(()) => self.ports.navigator.close_checkout(),
            Err(err) => {
                warn!(error = %err, "navigation failed, falling back to hard redirect");
                self.ports.navigator.hard_redirect(route);
            }
        }
    }

    fn set_phase(&self, next: CheckoutPhase) {
        info!(phase = %next, "checkout phase");
        self.phase.send_replace(next);
    }
}

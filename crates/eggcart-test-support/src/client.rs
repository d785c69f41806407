//! Test doubles for the client-side ports: session, dispatcher, navigation
//! and connectivity.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eggcart_core::error::DomainError;
use eggcart_core::navigation::{Connectivity, NavigationError, Navigator};
use eggcart_core::notification::{
    EmailDispatchError, NotificationDispatcher, OrderConfirmationRequest,
};
use eggcart_core::session::{Session, SessionProvider};
use uuid::Uuid;

/// A session provider that returns whatever it was given.
#[derive(Debug)]
pub struct StaticSessionProvider(Mutex<Option<Session>>);

impl StaticSessionProvider {
    /// A signed-in customer whose session is valid for an hour after `now`.
    #[must_use]
    pub fn signed_in(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self(Mutex::new(Some(Session {
            user_id,
            email: Some("asha@example.com".to_owned()),
            full_name: Some("Asha Rao".to_owned()),
            expires_at: now + Duration::hours(1),
        })))
    }

    /// A provider with the given session.
    #[must_use]
    pub fn with_session(session: Option<Session>) -> Self {
        Self(Mutex::new(session))
    }

    /// No one is signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self(Mutex::new(None))
    }

    /// Replaces the current session.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set(&self, session: Option<Session>) {
        *self.0.lock().unwrap() = session;
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, DomainError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// A dispatcher that records every request and optionally fails.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    requests: Mutex<Vec<OrderConfirmationRequest>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    /// A dispatcher whose every call fails after being recorded.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    /// Returns every request received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<OrderConfirmationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch_order_confirmation(
        &self,
        request: &OrderConfirmationRequest,
    ) -> Result<(), EmailDispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailDispatchError("mail provider returned 502".into()));
        }
        Ok(())
    }
}

/// A navigator that records where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    navigations: Mutex<Vec<String>>,
    hard_redirects: Mutex<Vec<String>>,
    closes: Mutex<u32>,
    fail: AtomicBool,
}

impl RecordingNavigator {
    /// A navigator whose soft navigation always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Routes reached through soft navigation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// Routes reached through a hard redirect.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hard_redirects(&self) -> Vec<String> {
        self.hard_redirects.lock().unwrap().clone()
    }

    /// How many times the checkout view was closed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn closes(&self) -> u32 {
        *self.closes.lock().unwrap()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, route: &str) -> Result<(), NavigationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NavigationError {
                route: route.to_owned(),
                reason: "router unmounted".to_owned(),
            });
        }
        self.navigations.lock().unwrap().push(route.to_owned());
        Ok(())
    }

    fn hard_redirect(&self, route: &str) {
        self.hard_redirects.lock().unwrap().push(route.to_owned());
    }

    fn close_checkout(&self) {
        *self.closes.lock().unwrap() += 1;
    }
}

/// Connectivity that tests can switch on and off.
#[derive(Debug)]
pub struct ToggleConnectivity(AtomicBool);

impl ToggleConnectivity {
    /// Starts online.
    #[must_use]
    pub fn online() -> Self {
        Self(AtomicBool::new(true))
    }

    /// Starts offline.
    #[must_use]
    pub fn offline() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Switches the reported state.
    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ToggleConnectivity {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

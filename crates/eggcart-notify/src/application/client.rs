//! HTTP client for the dispatcher service, used by checkout.

use std::time::Duration;

use async_trait::async_trait;
use eggcart_core::notification::{
    EmailDispatchError, NotificationDispatcher, OrderConfirmationRequest,
};
use reqwest::Client;
use tracing::{debug, warn};

/// Invokes `POST {base}/functions/order-confirmation`.
#[derive(Debug, Clone)]
pub struct HttpNotificationDispatcher {
    client: Client,
    endpoint: String,
    bearer: Option<String>,
}

impl HttpNotificationDispatcher {
    /// Creates a client for the service at `base_url`, sending `bearer` as
    /// the authorization token when given.
    ///
    /// # Errors
    ///
    /// Returns `EmailDispatchError` if the HTTP client cannot be built.
    pub fn new(base_url: &str, bearer: Option<String>) -> Result<Self, EmailDispatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| EmailDispatchError(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/functions/order-confirmation",
                base_url.trim_end_matches('/')
            ),
            bearer,
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn dispatch_order_confirmation(
        &self,
        request: &OrderConfirmationRequest,
    ) -> Result<(), EmailDispatchError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.bearer {
            call = call.bearer_auth(token);
        }
        let response = call
            .send()
            .await
            .map_err(|err| EmailDispatchError(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(order_id = %request.order.id, "dispatcher accepted order email");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%status, %body, "dispatcher refused order email");
        Err(EmailDispatchError(format!("{status}: {body}")))
    }
}

//! Outbound mail transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// One message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// Sender, e.g. `browneggs.shop <contact@browneggs.shop>`.
    pub from: String,
    /// Recipients.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// The transport could not deliver a message.
#[derive(Debug, Error)]
pub enum MailError {
    /// The request never got a response.
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("mail provider rejected message ({status}): {body}")]
    Rejected {
        /// HTTP status returned.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
}

/// Sends email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email`.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Mailer backed by the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    /// Default API endpoint.
    pub const DEFAULT_API_URL: &'static str = "https://api.resend.com/emails";

    /// Creates a mailer posting to `api_url` with bearer `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Transport` if the HTTP client cannot be built.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, MailError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(subject = %email.subject, recipients = email.to.len(), "email accepted");
            return Ok(());
        }
        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        error!(%status, %body, "mail provider rejected message");
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

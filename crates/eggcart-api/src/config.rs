//! Server configuration read from the environment.

use std::net::SocketAddr;

use eggcart_notify::application::mailer::ResendMailer;
use thiserror::Error;

/// A required variable is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The variable is not set.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// The variable is set to something unusable.
    #[error("{name} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Settings for the API binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind, `HOST`.
    pub host: String,
    /// Port to bind, `PORT`.
    pub port: u16,
    /// Email API key, `RESEND_API_KEY`.
    pub resend_api_key: String,
    /// Email API endpoint, `RESEND_API_URL`.
    pub resend_api_url: String,
    /// Sender address, `MAIL_FROM`.
    pub mail_from: String,
    /// Address copied on every order email, `OPERATOR_MAILBOX`.
    pub operator_mailbox: String,
    /// Database to migrate and probe, `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Trace collector, `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{err}"),
            })?,
            None => 3000,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            resend_api_key: non_empty("RESEND_API_KEY")
                .ok_or(ConfigError::Missing("RESEND_API_KEY"))?,
            resend_api_url: non_empty("RESEND_API_URL")
                .unwrap_or_else(|| ResendMailer::DEFAULT_API_URL.to_owned()),
            mail_from: non_empty("MAIL_FROM")
                .unwrap_or_else(|| "browneggs.shop <contact@browneggs.shop>".to_owned()),
            operator_mailbox: non_empty("OPERATOR_MAILBOX")
                .unwrap_or_else(|| "contact@browneggs.shop".to_owned()),
            database_url: non_empty("DATABASE_URL"),
            otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `HOST` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| ConfigError::Invalid {
                name: "HOST",
                reason: format!("{err}"),
            })
    }
}

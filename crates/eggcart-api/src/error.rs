//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eggcart_notify::application::mailer::MailError;
use eggcart_notify::application::service::NotifyError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or trace export could not start.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// The mail client could not be built.
    #[error("mailer error: {0}")]
    Mailer(#[from] MailError),

    /// Database connection or migration error.
    #[error("database error: {0}")]
    Database(#[from] eggcart_core::error::DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Dispatcher failure, rendered as the plain-text bodies callers expect.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body was unreadable or lacked a required field.
    #[error("missing required data")]
    MissingData,

    /// The order figures do not fit in a decimal.
    #[error("invalid order amounts")]
    InvalidAmounts,

    /// The mail provider did not accept the message.
    #[error("error sending email: {0}")]
    Send(#[source] MailError),
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::MissingData(_) => Self::MissingData,
            NotifyError::Template(_) => Self::InvalidAmounts,
            NotifyError::Mail(source) => Self::Send(source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingData => (StatusCode::BAD_REQUEST, "Missing required data").into_response(),
            Self::InvalidAmounts => {
                (StatusCode::BAD_REQUEST, "Invalid order amounts").into_response()
            }
            Self::Send(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error sending email").into_response()
            }
        }
    }
}

//! Notification dispatcher functions.
//!
//! Both handlers answer in plain text: `Email sent successfully`, or the
//! bodies rendered by [`ApiError`]. `OPTIONS` is answered by the CORS layer
//! and other methods get `405`.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use eggcart_core::notification::OrderConfirmationRequest;
use eggcart_notify::application::service::WelcomeRequest;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::state::AppState;

const SENT: &str = "Email sent successfully";

/// POST /functions/order-confirmation
async fn order_confirmation(
    State(state): State<AppState>,
    body: Result<Json<OrderConfirmationRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection, "unreadable order confirmation body");
        ApiError::MissingData
    })?;
    state
        .email
        .send_order_confirmation(&request)
        .await
        .inspect_err(|err| error!(error = %err, "order confirmation not sent"))?;
    Ok(SENT)
}

/// POST /functions/welcome-email
async fn welcome_email(
    State(state): State<AppState>,
    body: Result<Json<WelcomeRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection, "unreadable welcome body");
        ApiError::MissingData
    })?;
    state
        .email
        .send_welcome(&request.record)
        .await
        .inspect_err(|err| error!(error = %err, "welcome email not sent"))?;
    Ok(SENT)
}

/// Returns the dispatcher router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order-confirmation", post(order_confirmation))
        .route("/welcome-email", post(welcome_email))
}

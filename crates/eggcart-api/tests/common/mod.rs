//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eggcart_notify::application::mailer::{MailError, Mailer, OutgoingEmail};
use eggcart_notify::application::service::EmailService;
use http_body_util::BodyExt;
use tower::ServiceExt;

use eggcart_api::state::AppState;

/// Mailer that records every message, or rejects all of them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    reject: bool,
}

impl RecordingMailer {
    /// A mailer whose provider refuses every message.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.reject {
            return Err(MailError::Rejected {
                status: 500,
                body: "provider down".into(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Build the full app router around `mailer`, without a database. Uses the
/// same router as `main.rs`.
pub fn build_test_app(mailer: Arc<RecordingMailer>) -> Router {
    let email = EmailService::new(
        mailer,
        "browneggs.shop <contact@browneggs.shop>",
        "contact@browneggs.shop",
    );
    eggcart_api::app(AppState::new(Arc::new(email), None))
}

/// Send a request and return the status and body text.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, String) {
    send(app, "POST", uri, Some(body)).await
}

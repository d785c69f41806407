//! Integration tests for the notification dispatcher functions.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::RecordingMailer;

fn order_request(status: &str) -> serde_json::Value {
    json!({
        "order": {
            "id": "0b6f4a3e-1c2d-4e5f-8a9b-0c1d2e3f4a5b",
            "user_full_name": "Asha Rao",
            "created_at": "2026-01-15T10:00:00Z",
            "status": status,
            "order_notes": null,
            "delivery_fee": 20
        },
        "email": "asha@example.com",
        "items": [
            { "product_name": "Brown eggs x6", "quantity": 1, "price": 90 },
            { "product_name": "Two free-range eggs", "quantity": 1, "price": 10 }
        ]
    })
}

#[tokio::test]
async fn test_order_confirmation_sends_to_customer_and_operator() {
    // Arrange
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app(mailer.clone());

    // Act
    let (status, body) = common::post_json(
        app,
        "/functions/order-confirmation",
        &order_request("Processing"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Email sent successfully");
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["asha@example.com", "contact@browneggs.shop"]);
    assert_eq!(
        sent[0].subject,
        "Order Confirmation #0b6f4a3e - browneggs.shop"
    );
    assert!(sent[0].html.contains("₹120"));
}

#[tokio::test]
async fn test_order_confirmation_without_email_is_400() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app(mailer.clone());
    let mut request = order_request("Delivered");
    request["email"] = json!("");

    let (status, body) =
        common::post_json(app, "/functions/order-confirmation", &request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required data");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_order_confirmation_with_overflowing_amounts_is_400() {
    // Arrange
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app(mailer.clone());
    let mut request = order_request("Processing");
    request["items"] = json!([
        { "product_name": "Brown eggs x6", "quantity": 4_000_000_000_u32, "price": 7e28 }
    ]);

    // Act
    let (status, _) = common::post_json(app, "/functions/order-confirmation", &request).await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_order_confirmation_with_malformed_body_is_400() {
    let app = common::build_test_app(Arc::default());

    let (status, body) = common::post_json(
        app,
        "/functions/order-confirmation",
        &json!({ "email": "asha@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required data");
}

#[tokio::test]
async fn test_mailer_failure_is_500() {
    let app = common::build_test_app(Arc::new(RecordingMailer::rejecting()));

    let (status, body) = common::post_json(
        app,
        "/functions/order-confirmation",
        &order_request("Cancelled"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error sending email");
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let app = common::build_test_app(Arc::default());

    let (status, _) = common::send(app, "GET", "/functions/order-confirmation", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_options_without_origin_is_answered() {
    let app = common::build_test_app(Arc::default());

    let (status, _) = common::send(app, "OPTIONS", "/functions/welcome-email", None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_allows_post_from_any_origin() {
    let app = common::build_test_app(Arc::default());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/functions/order-confirmation")
        .header("origin", "https://browneggs.shop")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_welcome_email_goes_to_new_profile() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = common::build_test_app(mailer.clone());

    let (status, body) = common::post_json(
        app,
        "/functions/welcome-email",
        &json!({ "record": { "email": "ravi@example.com", "full_name": "Ravi" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Email sent successfully");
    let sent = mailer.sent();
    assert_eq!(sent[0].to, vec!["ravi@example.com"]);
    assert!(sent[0].html.contains("Hi Ravi,"));
}

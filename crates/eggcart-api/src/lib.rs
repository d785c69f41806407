//! HTTP surface of the EggCart storefront.
//!
//! Hosts the notification dispatcher functions (`/functions/*`) and a
//! health probe. [`app`] builds the router used by both the binary and the
//! integration tests.

use axum::Router;
use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use state::AppState;

/// CORS policy for browser callers of the dispatcher.
#[must_use]
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Builds the application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/functions", routes::functions::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

//! EggCart API server entry point.

use std::sync::Arc;

use eggcart_api::config::AppConfig;
use eggcart_api::error::AppError;
use eggcart_api::state::AppState;
use eggcart_api::telemetry::Telemetry;
use eggcart_notify::application::mailer::ResendMailer;
use eggcart_notify::application::service::EmailService;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = Telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting EggCart API server");

    let db_pool = match &config.database_url {
        Some(url) => Some(eggcart_store::connect(url).await?),
        None => {
            tracing::info!("DATABASE_URL not set, running without a database");
            None
        }
    };

    let mailer = ResendMailer::new(&config.resend_api_url, &config.resend_api_key)?;
    let email = EmailService::new(
        Arc::new(mailer),
        &config.mail_from,
        &config.operator_mailbox,
    );
    let app = eggcart_api::app(AppState::new(Arc::new(email), db_pool));

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    telemetry.shutdown();
    Ok(())
}

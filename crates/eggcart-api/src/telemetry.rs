//! Structured logging and optional OpenTelemetry export.

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAME: &str = "eggcart-api";

/// Telemetry could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The OTLP exporter could not be built.
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// A global subscriber was already installed.
    #[error("failed to initialise tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Installed telemetry; call [`shutdown`](Self::shutdown) before exit to
/// flush spans.
#[derive(Debug)]
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Installs JSON logs filtered by `RUST_LOG` (default `info`), plus span
    /// export when `otlp_endpoint` is given.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError` if the exporter or subscriber cannot be set up.
    pub fn init(otlp_endpoint: Option<&str>) -> Result<Self, TelemetryError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,h2=warn,hyper=warn,tonic=warn"));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true));

        let Some(endpoint) = otlp_endpoint else {
            subscriber.try_init()?;
            return Ok(Self {
                tracer_provider: None,
            });
        };

        global::set_text_map_propagator(TraceContextPropagator::new());
        let provider = tracer_provider(endpoint)?;
        subscriber
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)))
            .try_init()?;
        Ok(Self {
            tracer_provider: Some(provider),
        })
    }

    /// Flushes and stops span export.
    pub fn shutdown(self) {
        let Some(provider) = self.tracer_provider else {
            return;
        };
        if let Err(err) = provider.shutdown() {
            error!("failed to shut down tracer provider: {err}");
        }
    }
}

fn tracer_provider(endpoint: &str) -> Result<SdkTracerProvider, TelemetryError> {
    let resource = Resource::builder_empty()
        .with_service_name(SERVICE_NAME)
        .with_attributes([KeyValue::new(
            "service.version",
            env!("CARGO_PKG_VERSION"),
        )])
        .build();
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

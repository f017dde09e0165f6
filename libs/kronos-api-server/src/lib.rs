mod error;
mod extract;
mod http;
mod zone;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;

use kronos_api::Zone;
use kronos_engine::{EngineError, InvocationGate, KronosConfig, TimeZoneConverter};

pub use error::{ApiError, ServerError};
pub use extract::ZonedJson;
pub use http::Appointment;
pub use zone::{ClientZone, resolve_client_zone};

/// Shared state of the HTTP boundary.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<KronosConfig>,
    converter: Arc<TimeZoneConverter>,
    gate: InvocationGate,
    default_client_zone: Zone,
}

impl AppState {
    /// State with the built-in converters.
    pub fn new(config: KronosConfig) -> Result<Self, EngineError> {
        let converter = Arc::new(TimeZoneConverter::new(&config)?);
        Self::with_converter(config, converter)
    }

    /// State around an existing converter (e.g. one with custom converters).
    pub fn with_converter(config: KronosConfig, converter: Arc<TimeZoneConverter>) -> Result<Self, EngineError> {
        config.validate()?;
        let default_client_zone = config.default_client_zone()?;
        let gate = InvocationGate::new(Arc::clone(&converter), &config);
        Ok(Self {
            config: Arc::new(config),
            converter,
            gate,
            default_client_zone,
        })
    }

    pub fn config(&self) -> &KronosConfig {
        &self.config
    }

    pub fn converter(&self) -> &Arc<TimeZoneConverter> {
        &self.converter
    }

    pub fn gate(&self) -> &InvocationGate {
        &self.gate
    }

    pub fn default_client_zone(&self) -> &Zone {
        &self.default_client_zone
    }
}

/// Routes with the client-zone middleware applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/test/date", get(http::handle_get_date).post(http::handle_post_date))
        .route("/api/zone", get(http::handle_zone))
        .route("/api/convert", post(http::handle_convert))
        .layer(axum::middleware::from_fn_with_state(state.clone(), resolve_client_zone))
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until `shutdown` is cancelled.
pub async fn run(port: u16, state: AppState, shutdown: CancellationToken) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| ServerError::Bind { port, source })?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "api listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ServerError::Serve)
}

use tokio_util::sync::CancellationToken;

use kronos_api_server::{AppState, ServerError};

use crate::config::{ServeArgs, ServerConfig};

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("kronos-server starting");

    let config = ServerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, "loaded config");

    let port = args.port.unwrap_or(config.api_port);
    let kronos = config.kronos;
    if !kronos.enabled {
        tracing::warn!("zone conversion is disabled, values pass through unchanged");
    }
    tracing::info!(
        backend = %kronos.backend_zone_id,
        default_client = %kronos.default_client_zone_id,
        header = %kronos.client_zone_id_header,
        format = %kronos.default_date_time_format,
        handle_request = kronos.handle_request,
        handle_response = kronos.handle_response,
        "zone conversion"
    );
    let state = AppState::new(kronos)?;

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("shutting down..."),
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
        }
        shutdown.cancel();
    });

    kronos_api_server::run(port, state, token).await?;
    tracing::info!("kronos-server stopped");
    Ok(())
}

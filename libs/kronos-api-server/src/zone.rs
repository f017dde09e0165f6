use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use kronos_api::{KronosError, Zone};
use kronos_engine::ZoneSource;

use crate::AppState;
use crate::error::ApiError;

/// Zone of the caller of the current request.
///
/// Set by [`resolve_client_zone`]; requests that bypass the middleware get
/// the default client zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientZone(pub Zone);

impl<S> FromRequestParts<S> for ClientZone
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(zone) = parts.extensions.get::<ClientZone>() {
            return Ok(zone.clone());
        }
        Ok(ClientZone(AppState::from_ref(state).default_client_zone().clone()))
    }
}

/// Middleware: read the configured zone header into a [`ClientZone`]
/// request extension.
///
/// A missing or blank header selects the default client zone; an
/// unknown zone is rejected with `400 Bad Request`.
pub async fn resolve_client_zone(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let header_name = state.config().client_zone_id_header.as_str();
    let header = match request.headers().get(header_name) {
        Some(value) => match value.to_str() {
            Ok(text) => Some(text.to_owned()),
            Err(_) => {
                let err = KronosError::zone("header value is not visible ASCII").with_context(header_name);
                return ApiError::InvalidZone(err).into_response();
            }
        },
        None => None,
    };

    let mut source = ZoneSource::new(state.default_client_zone().clone());
    match source.establish(header.as_deref()) {
        Ok(zone) => {
            tracing::debug!(zone = %zone, "client zone");
            request.extensions_mut().insert(ClientZone(zone));
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(header = header_name, error = %e, "rejecting request with unknown zone");
            ApiError::InvalidZone(e.with_context(header_name)).into_response()
        }
    }
}

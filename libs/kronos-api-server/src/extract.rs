use axum::Json;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use serde::de::DeserializeOwned;

use kronos_api::walk::Walk;
use kronos_engine::ConvertPolicy;

use crate::AppState;
use crate::error::ApiError;
use crate::zone::ClientZone;

/// JSON body converted from the caller's zone to the backend zone.
///
/// Conversion is skipped when the gate has request handling switched off.
#[derive(Debug, Clone)]
pub struct ZonedJson<T>(pub T);

impl<T, S> FromRequest<S> for ZonedJson<T>
where
    T: DeserializeOwned + Walk + Send,
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let ClientZone(zone) = ClientZone::from_request_parts(&mut parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        let Json(mut value) = Json::<T>::from_request(Request::from_parts(parts, body), state).await?;

        let app = AppState::from_ref(state);
        if app.gate().converts_arguments(ConvertPolicy::COMMAND) {
            app.converter().to_backend_in_place(&mut value, &zone);
        }
        Ok(ZonedJson(value))
    }
}

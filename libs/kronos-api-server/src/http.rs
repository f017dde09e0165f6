use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use kronos_api::Temporal;
use kronos_engine::ConvertPolicy;
use kronos_engine::pattern::Pattern;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::ZonedJson;
use crate::zone::ClientZone;

// ═══════════════════════════════════════════════════════════════
//  GET /test/date?date=2025-05-20 10:00:00
// ═══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub(crate) struct DateQuery {
    date: String,
}

#[derive(Debug, Serialize, Temporal)]
pub(crate) struct DateReply {
    message: &'static str,
    /// Echoed back in the caller's zone.
    #[time]
    date: NaiveDateTime,
    /// The value the handler saw, in the backend zone.
    backend: String,
}

pub(crate) async fn handle_get_date(
    State(state): State<AppState>,
    ClientZone(zone): ClientZone,
    query: Result<Query<DateQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<DateReply>, ApiError> {
    let Query(query) = query?;
    let pattern = Pattern::compile(&state.config().default_date_time_format)
        .map_err(|e| ApiError::InvalidDateTime(e.to_string()))?;
    let instant = pattern
        .parse(&query.date, &zone)
        .map_err(|e| ApiError::InvalidDateTime(format!("'{}': {e}", query.date)))?;
    let date = zone.at(&instant).naive_local();

    let backend_zone = state.converter().backend_zone();
    let reply = state.gate().around(&zone, ConvertPolicy::QUERY, date, |backend| {
        tracing::info!(%backend, "GET /test/date");
        let seen = backend_zone.resolve_local(&backend).with_timezone(&Utc);
        DateReply {
            message: "hello world",
            date: backend,
            backend: pattern.format(&seen, backend_zone).unwrap_or_else(|_| backend.to_string()),
        }
    });
    Ok(Json(reply))
}

// ═══════════════════════════════════════════════════════════════
//  POST /test/date
// ═══════════════════════════════════════════════════════════════

/// Demo payload: one marked textual field, two structured ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Temporal)]
pub struct Appointment {
    pub title: String,
    #[time]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reminders: Vec<NaiveDateTime>,
}

pub(crate) async fn handle_post_date(ZonedJson(appointment): ZonedJson<Appointment>) -> Response {
    tracing::info!(title = %appointment.title, starts_at = %appointment.starts_at, "POST /test/date");
    Json(serde_json::json!({
        "message": "hello world",
        "backend": appointment,
    }))
    .into_response()
}

// ═══════════════════════════════════════════════════════════════
//  GET /api/zone
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_zone(State(state): State<AppState>, ClientZone(zone): ClientZone) -> Response {
    Json(serde_json::json!({
        "client": zone,
        "backend": state.converter().backend_zone(),
    }))
    .into_response()
}

// ═══════════════════════════════════════════════════════════════
//  POST /api/convert?to=backend|client
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Target {
    #[default]
    Backend,
    Client,
}

#[derive(Deserialize)]
pub(crate) struct ConvertParams {
    #[serde(default)]
    to: Target,
}

/// Convert every date-time string of an arbitrary JSON document.
pub(crate) async fn handle_convert(
    State(state): State<AppState>,
    ClientZone(zone): ClientZone,
    Query(params): Query<ConvertParams>,
    Json(mut doc): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let gate = state.gate();
    match params.to {
        Target::Backend if gate.converts_arguments(ConvertPolicy::COMMAND) => {
            state.converter().to_backend_in_place(&mut doc, &zone);
        }
        Target::Client if gate.converts_result(ConvertPolicy::QUERY) => {
            state.converter().to_client_in_place(&mut doc, &zone);
        }
        target => tracing::debug!(?target, "conversion disabled for this direction"),
    }
    Json(doc)
}

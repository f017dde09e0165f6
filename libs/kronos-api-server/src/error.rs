use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use kronos_api::KronosError;
use kronos_engine::EngineError;

/// Errors starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bind api :{port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    #[error("axum serve: {0}")]
    Serve(std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid time zone: {0}")]
    InvalidZone(KronosError),

    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidZone(_) | ApiError::InvalidDateTime(_) => StatusCode::BAD_REQUEST,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

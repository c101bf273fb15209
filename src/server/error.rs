//! API errors with structured JSON bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::error::{IngestError, ProviderErrorKind};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: &'static str,
    pub message: String,
}

/// Request failures mapped to HTTP statuses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Ingest(IngestError::Validation(_)) => (StatusCode::BAD_REQUEST, "missing_file"),
            ApiError::Ingest(IngestError::Provider(e)) => {
                warn!(kind = %e.kind, "Classification unavailable: {}", e);
                match e.kind {
                    ProviderErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "provider_error"),
                    ProviderErrorKind::Transport | ProviderErrorKind::BackendRejected => {
                        (StatusCode::BAD_GATEWAY, "provider_error")
                    }
                }
            }
            ApiError::Ingest(IngestError::Policy(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorBody {
            ok: false,
            error: code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

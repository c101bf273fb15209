//! HTTP surface for the ingestion pipeline.
//!
//! - `POST /api/conversations/analyze`: classify one export
//! - `GET /health`: liveness

pub mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::ApiError;

use crate::models::ClassificationResult;
use crate::pipeline::{IngestRequest, IngestionPipeline};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub file_label: Option<String>,
    /// Raw export text
    #[serde(default)]
    pub text: String,
    /// Name the seller appears under in the export
    #[serde(default)]
    pub self_name: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub result: ClassificationResult,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub provider: &'static str,
}

/// Build the API router around a shared pipeline
pub fn router(pipeline: Arc<IngestionPipeline>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/conversations/analyze", post(analyze))
        .with_state(pipeline)
}

/// Serve until the process is stopped
pub async fn serve(pipeline: Arc<IngestionPipeline>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(pipeline))
        .await
        .context("HTTP server failed")
}

async fn health(State(pipeline): State<Arc<IngestionPipeline>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        provider: pipeline.provider_name(),
    })
}

/// `POST /api/conversations/analyze`
async fn analyze(
    State(pipeline): State<Arc<IngestionPipeline>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut request = IngestRequest::new(payload.text, payload.self_name);
    request.file_label = payload.file_label;

    let outcome = pipeline.ingest(request).await?;
    Ok(Json(AnalyzeResponse {
        ok: true,
        result: outcome.result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::llm::{ClassificationPolicy, ClassificationProvider, ClassificationRequest};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    struct ScriptedProvider(Result<&'static str, ProviderError>);

    #[async_trait]
    impl ClassificationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn classify(&self, _request: &ClassificationRequest) -> Result<String, ProviderError> {
            self.0.clone().map(str::to_string)
        }
    }

    fn app(response: Result<&'static str, ProviderError>) -> Router {
        let pipeline =
            IngestionPipeline::new(Arc::new(ScriptedProvider(response)), ClassificationPolicy::default())
                .unwrap();
        router(Arc::new(pipeline))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/api/conversations/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_analyze_returns_result() {
        let app = app(Ok(r#"{"summary":"s","intentLevel":"alta","color":"YELLOW","suggestedMessage":"m"}"#));
        let (status, body) = post_json(
            app,
            json!({"text": "09/11/2025 15:59 - Bruno: oi", "selfName": "Ana", "fileLabel": "chat.txt"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["result"]["color"], "yellow");
        assert_eq!(body["result"]["intentLevel"], "high");
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let (status, body) = post_json(app(Ok("{}")), json!({"text": "", "selfName": "Ana"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_file");
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let err = ProviderError::rejected("scripted", Some(500), "HTTP 500", None);
        let (status, body) =
            post_json(app(Err(err)), json!({"text": "09/11/2025 15:59 - Bruno: oi", "selfName": "Ana"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "provider_error");
    }

    #[tokio::test]
    async fn test_provider_timeout_is_gateway_timeout() {
        let err = ProviderError::timeout("scripted", Duration::from_secs(60));
        let (status, body) =
            post_json(app(Err(err)), json!({"text": "09/11/2025 15:59 - Bruno: oi", "selfName": "Ana"})).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "provider_error");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app(Ok("{}"))
            .oneshot(
                Request::post("/api/conversations/analyze")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Ok("{}"))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

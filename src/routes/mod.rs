use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::stream::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::generation::GenerationClient;
use crate::models::api::{GenerateTextRequest, GenerateTextResponse};
use crate::models::watsonx::GenerationRequest;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const MISSING_FIELDS: &str = "Missing required fields: model_id, input, and parameters";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<GenerationClient>,
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Text generation routes
pub fn generation_routes(state: AppState) -> Router {
    Router::new()
        .route("/generate-text", post(generate_text_handler))
        .route("/generate-text/stream", post(generate_text_stream_handler))
        .with_state(state)
}

/// GET / - Simple health check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "wxai gateway is running",
        "version": VERSION
    }))
}

/// GET /health - Detailed health check
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

/// Decode and validate an inbound body
fn parse_request(
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<GenerationRequest, ApiError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::ValidationError("Invalid request payload".to_string())
    })?;

    request
        .into_generation_request()
        .ok_or_else(|| ApiError::ValidationError(MISSING_FIELDS.to_string()))
}

/// POST /generate-text - Single-shot generation
async fn generate_text_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Json<GenerateTextResponse>, ApiError> {
    let request = parse_request(payload)?;
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    tracing::info!(
        "[{}] Request to /generate-text: model={}, input_len={}",
        request_id,
        request.model_id,
        request.input.len()
    );

    let generated_text = state.client.generate(&request).await?;

    tracing::debug!("[{}] Generated {} bytes", request_id, generated_text.len());

    Ok(Json(GenerateTextResponse { generated_text }))
}

/// POST /generate-text/stream - Streaming generation
///
/// Upstream chunks are forwarded as-is. A read failure mid-stream aborts the
/// response body; chunks already sent stand.
async fn generate_text_stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = parse_request(payload)?;
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    tracing::info!(
        "[{}] Request to /generate-text/stream: model={}",
        request_id,
        request.model_id
    );

    let stream = state.client.generate_stream(&request).await?;

    let byte_stream =
        stream.map(|chunk| chunk.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(byte_stream),
    )
        .into_response())
}

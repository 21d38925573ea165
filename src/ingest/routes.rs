//! Ingest receiver - HTTP endpoint accepting sealed uploads.
//!
//! Exposes endpoints for:
//! - Receiving an upload request (shared-secret protected)
//! - Health checks

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sealdrop_types::{IngestReceipt, AUTH_SECRET_HEADER};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DEFAULT_MAX_BODY_BYTES;

/// Ingest receiver errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unsupported Content-Type. Use application/json")]
    UnsupportedContentType,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Internal Server Error: {0}")]
    Storage(String),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestError::Unauthorized => StatusCode::UNAUTHORIZED,
            IngestError::UnsupportedContentType => StatusCode::BAD_REQUEST,
            IngestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Shared state for ingest endpoints.
#[derive(Debug)]
pub struct IngestState {
    /// Expected `X-Auth-Secret` value; `None` rejects everything
    pub auth_secret: Option<String>,
    /// Directory each accepted upload is written into
    pub storage_dir: PathBuf,
    /// Larger bodies are answered with `413 Payload Too Large`
    pub max_body_bytes: usize,
}

impl IngestState {
    pub fn new(auth_secret: Option<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            auth_secret: auth_secret.filter(|s| !s.is_empty()),
            storage_dir: storage_dir.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.auth_secret else {
            return false;
        };
        headers
            .get(AUTH_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|provided| bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Handler: GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler: POST /
///
/// Checks the shared secret, stores the JSON body as `<uuid>.json` and
/// returns the generated id.
async fn ingest(
    State(state): State<Arc<IngestState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestReceipt>, IngestError> {
    if !state.authorized(&headers) {
        warn!("Rejected upload with missing or wrong auth secret");
        return Err(IngestError::Unauthorized);
    }
    if !is_json(&headers) {
        return Err(IngestError::UnsupportedContentType);
    }

    let document: Value =
        serde_json::from_slice(&body).map_err(|e| IngestError::InvalidBody(e.to_string()))?;

    let id = Uuid::new_v4().to_string();
    let path = state.storage_dir.join(format!("{id}.json"));
    let contents = serde_json::to_vec(&document).map_err(|e| IngestError::Storage(e.to_string()))?;

    tokio::fs::create_dir_all(&state.storage_dir)
        .await
        .map_err(|e| {
            error!(error = %e, dir = %state.storage_dir.display(), "Failed to create storage directory");
            IngestError::Storage(e.to_string())
        })?;
    tokio::fs::write(&path, contents).await.map_err(|e| {
        error!(error = %e, path = %path.display(), "Failed to store upload");
        IngestError::Storage(e.to_string())
    })?;

    info!(id, bytes = body.len(), "Stored upload");
    Ok(Json(IngestReceipt::success(id)))
}

/// Create the ingest router.
pub fn ingest_router(state: Arc<IngestState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-auth-secret")])
        .max_age(Duration::from_secs(3600));
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/", post(ingest))
        .route("/health", get(health))
        .with_state(state)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

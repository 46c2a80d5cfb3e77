//! REST API Server for the hybrid query orchestrator
//!
//! Thin service layer: request parsing, status codes and shutdown.
//! All decision logic lives in [`HybridOrchestrator`].

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::HybridOrchestrator;
use crate::error::OrchestrationError;
use crate::gateway::FetchFilter;
use crate::models::{Document, Metadata};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub query: String,
    /// Restrict structured lookups to one user.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AddDocumentRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub id: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<HybridOrchestrator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Ask Endpoint
/// =============================

async fn ask(
    State(state): State<ApiState>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Query is required".into())),
        );
    }

    info!("Received query: {}", req.query);

    let filter = FetchFilter {
        subject: req.user_id,
        ..FetchFilter::default()
    };

    match state.orchestrator.answer_with_filter(&req.query, &filter).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "response": answer.text,
                "domains": answer.domains,
                "passages": answer.passages,
                "contextFingerprint": answer.context_fingerprint,
            }))),
        ),
        Err(e) => {
            error!("Error processing request: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to process the query".into())),
            )
        }
    }
}

/// =============================
/// Ingestion Endpoint
/// =============================

async fn add_document(
    State(state): State<ApiState>,
    Json(req): Json<AddDocumentRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let document = Document {
        text: req.text,
        metadata: req.metadata,
        id: req.id,
    };

    match state.orchestrator.ingest_document(document).await {
        Ok(document_id) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "message": "Document added successfully",
                "documentId": document_id,
            }))),
        ),
        Err(OrchestrationError::InvalidInput(message)) => {
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
        }
        Err(e) => {
            error!("Error adding document: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to add document".into())),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<HybridOrchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/ask", post(ask))
        .route("/add-document", post(add_document))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn start_server<F>(
    orchestrator: Arc<HybridOrchestrator>,
    port: u16,
    shutdown: F,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

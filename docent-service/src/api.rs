//! HTTP API for the Docent service.
//!
//! This module provides the REST API endpoints for:
//! - Health and metrics monitoring
//! - Chat (plain, expert-mode, and PDF-grounded)
//! - PDF document management

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{I18nError, ServiceError};
use crate::service::DocentService;

pub mod chat;
pub mod documents;

use chat::{chat_handler, expert_chat_handler, expert_modes_handler, pdf_chat_handler};
use documents::{
    delete_document_handler, get_document_handler, get_summary_handler, list_documents_handler,
    summarize_document_handler, upload_document_handler,
};

/// Application state
pub struct AppState {
    pub service: Arc<DocentService>,
    pub start_time: Instant,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Locale for user-facing messages
    pub fn locale(&self) -> &str {
        &self.service.config.locale
    }

    /// Create an i18n-aware error from a service error
    pub fn i18n_error(&self, error: ServiceError) -> I18nError {
        I18nError::new(error, self.service.i18n.clone(), self.locale())
    }
}

/// Build the API router
pub fn router(service: Arc<DocentService>, metrics: PrometheusHandle) -> Router {
    // Uploads get a larger body limit than the axum default
    let max_body_size = service.config.limits.max_pdf_size_bytes as usize;

    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
        metrics,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat endpoints
        .route("/chat/message", post(chat_handler))
        .route("/chat/expert", post(expert_chat_handler))
        .route("/chat/pdf", post(pdf_chat_handler))
        .route("/chat/expert-modes", get(expert_modes_handler))
        // Document endpoints
        .route(
            "/pdf/upload",
            post(upload_document_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/pdf", get(list_documents_handler))
        .route("/pdf/{id}", get(get_document_handler))
        .route("/pdf/{id}", delete(delete_document_handler))
        .route("/pdf/{id}/summary", get(get_summary_handler))
        .route("/pdf/{id}/summarize", post(summarize_document_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health & Metrics ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let completion_configured = state.service.completion.is_configured();

    let status = if completion_configured {
        state
            .service
            .i18n
            .get(state.locale(), "health-status-healthy", None)
    } else {
        state.service.i18n.format(
            state.locale(),
            "health-status-degraded",
            &[("reason", "completion API not configured")],
        )
    };

    let documents_total = state.service.db.count_documents(None).unwrap_or(0);

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        completion_configured,
        documents_total,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    completion_configured: bool,
    documents_total: u64,
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

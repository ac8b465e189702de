//! Chat API endpoints.
//!
//! Plain chat, expert-mode chat, and chat grounded in an uploaded PDF.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::prompts::ExpertMode;

use super::AppState;
use crate::error::I18nError;

/// Plain chat request
#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Expert-mode chat request
#[derive(Deserialize)]
pub struct ExpertChatRequest {
    pub message: String,
    /// Expert mode code ("java", "python", "javascript", "general").
    /// Missing or blank selects the general mode.
    pub expert_mode: Option<String>,
}

/// PDF-grounded chat request
#[derive(Deserialize)]
pub struct PdfChatRequest {
    pub message: String,
    pub pdf_id: String,
    pub expert_mode: Option<String>,
}

/// Chat response
#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Expert mode descriptor for the mode listing endpoint
#[derive(Serialize)]
pub struct ExpertModeInfo {
    pub code: &'static str,
    pub display_name: &'static str,
}

/// Plain chat without an expert mode
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, I18nError> {
    let response = state
        .service
        .send_message(&request.message)
        .await
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(ChatResponse { response }))
}

/// Chat with an expert-mode system prompt
pub async fn expert_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExpertChatRequest>,
) -> Result<Json<ChatResponse>, I18nError> {
    let response = state
        .service
        .send_expert_message(&request.message, request.expert_mode.as_deref())
        .await
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(ChatResponse { response }))
}

/// Chat grounded in a processed PDF document
pub async fn pdf_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PdfChatRequest>,
) -> Result<Json<ChatResponse>, I18nError> {
    let response = state
        .service
        .send_document_message(
            &request.pdf_id,
            &request.message,
            request.expert_mode.as_deref(),
        )
        .await
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(ChatResponse { response }))
}

/// List the available expert modes
pub async fn expert_modes_handler() -> Json<Vec<ExpertModeInfo>> {
    let modes = ExpertMode::all()
        .into_iter()
        .map(|mode| ExpertModeInfo {
            code: mode.code(),
            display_name: mode.display_name(),
        })
        .collect();

    Json(modes)
}

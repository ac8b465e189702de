//! Document API endpoints.
//!
//! Handlers for PDF upload, listing, retrieval, summaries, and deletion.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{DocumentFilter, PdfDocument, ProcessingStatus};
use crate::error::{I18nError, ServiceError};

use super::AppState;

/// List documents query parameters
#[derive(Deserialize)]
pub struct ListDocumentsParams {
    /// Filter by status ("uploaded", "processing", "completed", "failed")
    pub status: Option<ProcessingStatus>,
    /// Substring match against the original filename
    pub q: Option<String>,
    /// Only documents uploaded at or after this RFC 3339 timestamp
    pub from: Option<DateTime<Utc>>,
    /// Only documents uploaded at or before this RFC 3339 timestamp
    pub to: Option<DateTime<Utc>>,
}

/// Document metadata returned by the API.
/// Leaves out the storage path, content hash, and full extracted text.
#[derive(Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub file_name: String,
    pub original_file_name: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<PdfDocument> for DocumentInfo {
    fn from(doc: PdfDocument) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name,
            original_file_name: doc.original_file_name,
            file_size: doc.file_size,
            description: doc.description,
            summary: doc.summary,
            status: doc.status,
            error_message: doc.error_message,
            uploaded_at: doc.uploaded_at,
            processed_at: doc.processed_at,
        }
    }
}

/// Response for uploads
#[derive(Serialize)]
pub struct UploadResponse {
    pub document: DocumentInfo,
    pub duplicate: bool,
    pub message: String,
}

/// Response for stored-summary retrieval
#[derive(Serialize)]
pub struct SummaryResponse {
    pub pdf_id: String,
    pub summary: String,
}

/// Request for custom summarization
#[derive(Deserialize)]
pub struct SummarizeRequest {
    pub pdf_id: String,
    pub prompt: Option<String>,
}

/// Response for delete operations
#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Upload a new PDF document
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, I18nError> {
    let mut file_data: Option<(Vec<u8>, String)> = None;
    let mut description: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                let data = field.bytes().await.map_err(|e| {
                    state.i18n_error(ServiceError::InvalidRequest {
                        message: e.to_string(),
                    })
                })?;
                file_data = Some((data.to_vec(), filename));
            }
            "description" => {
                let text = field.text().await.map_err(|e| {
                    state.i18n_error(ServiceError::InvalidRequest {
                        message: e.to_string(),
                    })
                })?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            _ => {}
        }
    }

    let (data, filename) = file_data.ok_or_else(|| {
        state.i18n_error(ServiceError::InvalidRequest {
            message: "No file provided".to_string(),
        })
    })?;

    let outcome = state
        .service
        .upload_document(&data, &filename, description)
        .map_err(|e| state.i18n_error(e))?;

    let duplicate = outcome.is_duplicate();
    let message_key = if duplicate {
        "doc-upload-duplicate"
    } else {
        "doc-upload-success"
    };
    let message = state.service.i18n.get(state.locale(), message_key, None);

    Ok(Json(UploadResponse {
        document: outcome.into_document().into(),
        duplicate,
        message,
    }))
}

/// List documents with optional filters
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDocumentsParams>,
) -> Result<Json<Vec<DocumentInfo>>, I18nError> {
    let filter = DocumentFilter {
        status: params.status,
        keyword: params.q,
        uploaded_after: params.from,
        uploaded_before: params.to,
    };

    let documents = state
        .service
        .list_documents(&filter)
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(documents.into_iter().map(Into::into).collect()))
}

/// Get a specific document by ID
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentInfo>, I18nError> {
    let document = state
        .service
        .get_document(&id)
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(document.into()))
}

/// Get the stored summary of a processed document
pub async fn get_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, I18nError> {
    let summary = state
        .service
        .document_summary(&id)
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(SummaryResponse {
        pdf_id: id,
        summary,
    }))
}

/// The document id in the URL must match the one in the request body
fn ensure_matching_ids(path_id: &str, body_id: &str) -> Result<(), ServiceError> {
    if path_id != body_id {
        return Err(ServiceError::InvalidRequest {
            message: "Document ID in path and body do not match".to_string(),
        });
    }
    Ok(())
}

/// Generate a fresh summary with an optional custom prompt.
/// The result is returned to the caller, not stored.
pub async fn summarize_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>, I18nError> {
    ensure_matching_ids(&id, &request.pdf_id).map_err(|e| state.i18n_error(e))?;

    let summary = state
        .service
        .summarize_with_prompt(&id, request.prompt.as_deref())
        .await
        .map_err(|e| state.i18n_error(e))?;

    Ok(Json(SummaryResponse {
        pdf_id: id,
        summary,
    }))
}

/// Delete a document and its stored file
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, I18nError> {
    let deleted = state
        .service
        .delete_document(&id)
        .map_err(|e| state.i18n_error(e))?;

    if deleted {
        Ok(Json(DeleteResponse {
            success: true,
            message: state
                .service
                .i18n
                .get(state.locale(), "doc-delete-success", None),
        }))
    } else {
        Err(state.i18n_error(ServiceError::DocumentNotFound { document_id: id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_requires_matching_ids() {
        assert!(ensure_matching_ids("doc-1", "doc-1").is_ok());

        let err = ensure_matching_ids("doc-1", "doc-2").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }
}

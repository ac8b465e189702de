use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::i18n::I18n;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Document not found: {document_id}")]
    DocumentNotFound { document_id: String },

    #[error("Document not ready: {document_id} is {status}")]
    DocumentNotReady {
        document_id: String,
        status: &'static str,
    },

    #[error("Document has no extracted text: {document_id}")]
    DocumentEmpty { document_id: String },

    #[error("No summary available for document: {document_id}")]
    SummaryMissing { document_id: String },

    #[error("{0}")]
    Completion(#[from] CompletionError),

    #[error("Database error")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Processing(#[from] ProcessingError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message too long: {length} characters (max {max})")]
    MessageTooLong { length: usize, max: usize },

    #[error("Unsupported expert mode: {mode}")]
    UnknownExpertMode { mode: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Completion API client errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Connection failed to completion API at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Authentication with the completion API failed")]
    Authentication,

    #[error("Completion API rate limit exceeded")]
    RateLimited,

    #[error("Completion request timed out")]
    Timeout,

    #[error("Completion failed (status {status}): {message}")]
    Generation { status: u16, message: String },

    #[error("Completion API returned no choices")]
    EmptyResponse,

    #[error("Invalid response from completion API")]
    InvalidResponse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Completion API key is not configured")]
    NotConfigured,
}

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed")]
    Query(#[source] rusqlite::Error),

    #[error("Migration failed: {message}")]
    Migration { message: String },
}

/// PDF processing errors
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to load PDF: {0}")]
    PdfLoad(String),

    #[error("Failed to extract text from page {page}: {message}")]
    TextExtraction { page: u16, message: String },

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("IO error")]
    Io(#[source] std::io::Error),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DocumentNotFound { .. } | ServiceError::SummaryMissing { .. } => {
                StatusCode::NOT_FOUND
            }
            ServiceError::DocumentNotReady { .. } => StatusCode::CONFLICT,
            ServiceError::DocumentEmpty { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidRequest { .. }
            | ServiceError::EmptyMessage
            | ServiceError::MessageTooLong { .. }
            | ServiceError::UnknownExpertMode { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Completion(CompletionError::Authentication) => StatusCode::BAD_GATEWAY,
            ServiceError::Completion(CompletionError::RateLimited) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ServiceError::Completion(CompletionError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Completion(CompletionError::NotConfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServiceError::Processing(ProcessingError::EmptyFile) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::DocumentNotFound { .. } => "document_not_found",
            ServiceError::DocumentNotReady { .. } => "document_not_ready",
            ServiceError::DocumentEmpty { .. } => "document_empty",
            ServiceError::SummaryMissing { .. } => "summary_missing",
            ServiceError::Completion(CompletionError::Connection { .. }) => {
                "completion_connection"
            }
            ServiceError::Completion(CompletionError::Authentication) => {
                "completion_authentication"
            }
            ServiceError::Completion(CompletionError::RateLimited) => "completion_rate_limited",
            ServiceError::Completion(CompletionError::Timeout) => "completion_timeout",
            ServiceError::Completion(CompletionError::Generation { .. }) => "completion_failed",
            ServiceError::Completion(CompletionError::EmptyResponse) => "completion_empty",
            ServiceError::Completion(CompletionError::InvalidResponse { .. }) => {
                "completion_invalid_response"
            }
            ServiceError::Completion(CompletionError::NotConfigured) => "completion_not_configured",
            ServiceError::Database(_) => "database_error",
            ServiceError::Processing(ProcessingError::PdfLoad(_)) => "pdf_load_error",
            ServiceError::Processing(ProcessingError::TextExtraction { .. }) => {
                "text_extraction_error"
            }
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                "unsupported_format"
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => "file_too_large",
            ServiceError::Processing(ProcessingError::EmptyFile) => "empty_file",
            ServiceError::Processing(ProcessingError::Io(_)) => "io_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::EmptyMessage => "empty_message",
            ServiceError::MessageTooLong { .. } => "message_too_long",
            ServiceError::UnknownExpertMode { .. } => "unknown_expert_mode",
            ServiceError::Config { .. } => "config_error",
        }
    }

    /// Get a user-friendly translated message
    pub fn user_message(&self, i18n: &I18n, locale: &str) -> String {
        match self {
            ServiceError::DocumentNotFound { document_id } => {
                i18n.format(locale, "error-document-not-found", &[("id", document_id)])
            }
            ServiceError::DocumentNotReady { .. } => {
                i18n.get(locale, "error-document-not-ready", None)
            }
            ServiceError::DocumentEmpty { .. } => i18n.get(locale, "error-document-empty", None),
            ServiceError::SummaryMissing { .. } => i18n.get(locale, "doc-summary-missing", None),
            ServiceError::EmptyMessage => i18n.get(locale, "error-empty-message", None),
            ServiceError::MessageTooLong { max, .. } => {
                i18n.format(locale, "error-message-too-long", &[("max", &max.to_string())])
            }
            ServiceError::UnknownExpertMode { mode } => {
                i18n.format(locale, "error-unknown-expert-mode", &[("mode", mode)])
            }
            ServiceError::Completion(CompletionError::Authentication) => {
                i18n.get(locale, "error-completion-auth", None)
            }
            ServiceError::Completion(CompletionError::RateLimited) => {
                i18n.get(locale, "error-completion-rate-limit", None)
            }
            ServiceError::Completion(CompletionError::Timeout) => {
                i18n.get(locale, "error-completion-timeout", None)
            }
            ServiceError::Completion(CompletionError::NotConfigured)
            | ServiceError::Config { .. } => i18n.get(locale, "error-not-configured", None),
            ServiceError::Database(_) => i18n.get(locale, "error-internal", None),
            // For other errors, fall back to the technical message
            _ => self.to_string(),
        }
    }

    /// Convert to an error response with i18n support
    pub fn into_response_with_i18n(self, i18n: &I18n, locale: &str) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();
        let message = self.user_message(i18n, locale);

        let response = ErrorResponse {
            message,
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();

        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(code),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error wrapper with i18n support for API responses
pub struct I18nError {
    pub error: ServiceError,
    pub i18n: std::sync::Arc<I18n>,
    pub locale: String,
}

impl I18nError {
    pub fn new(error: ServiceError, i18n: std::sync::Arc<I18n>, locale: impl Into<String>) -> Self {
        Self {
            error,
            i18n,
            locale: locale.into(),
        }
    }
}

impl IntoResponse for I18nError {
    fn into_response(self) -> Response {
        self.error.into_response_with_i18n(&self.i18n, &self.locale)
    }
}

impl<E: Into<ServiceError>> From<E> for I18nError {
    fn from(error: E) -> Self {
        // This fallback doesn't have i18n, so uses default
        // Real usage should use I18nError::new()
        Self {
            error: error.into(),
            i18n: std::sync::Arc::new(I18n::new()),
            locale: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = ServiceError::DocumentNotFound {
            document_id: "abc".to_string(),
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let too_long = ServiceError::MessageTooLong {
            length: 1200,
            max: 1000,
        };
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);

        let mismatch = ServiceError::InvalidRequest {
            message: "Document ID in path and body do not match".to_string(),
        };
        assert_eq!(mismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(mismatch.error_code(), "invalid_request");

        let too_large = ServiceError::Processing(ProcessingError::FileTooLarge {
            size: 20_000_000,
            max: 10_485_760,
        });
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let rate_limited = ServiceError::Completion(CompletionError::RateLimited);
        assert_eq!(rate_limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ServiceError::EmptyMessage.error_code(), "empty_message");
        assert_eq!(
            ServiceError::UnknownExpertMode {
                mode: "rust".to_string()
            }
            .error_code(),
            "unknown_expert_mode"
        );
        assert_eq!(
            ServiceError::Completion(CompletionError::NotConfigured).error_code(),
            "completion_not_configured"
        );
    }

    #[test]
    fn test_user_message_localized() {
        let i18n = I18n::new();
        let err = ServiceError::EmptyMessage;
        let msg = err.user_message(&i18n, "en");
        assert_eq!(msg, "Please enter a message.");
    }

    #[test]
    fn test_summary_missing_message_fully_localized() {
        let i18n = I18n::new();
        let err = ServiceError::SummaryMissing {
            document_id: "doc-1".to_string(),
        };

        assert_eq!(
            err.user_message(&i18n, "ko"),
            "PDF 요약이 생성되지 않았습니다."
        );
        assert_eq!(
            err.user_message(&i18n, "en"),
            "No summary has been generated for this document."
        );
    }
}

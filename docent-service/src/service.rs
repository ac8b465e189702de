//! Main service coordinator.
//!
//! Ties together the database, the completion API client, PDF extraction,
//! and the background processing worker.

use chrono::Utc;
use metrics::counter;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::completion::{ChatMessage, CompletionClient};
use crate::config::ServiceConfig;
use crate::db::{Database, DocumentFilter, PdfDocument, ProcessingStatus};
use crate::error::{ProcessingError, ServiceError, ServiceResult};
use crate::extraction::{PdfExtractor, basic_summary, is_pdf_content};
use crate::i18n::I18n;
use crate::prompts::{
    ANALYST_SYSTEM_PROMPT, ASSISTANT_SYSTEM_PROMPT, DEFAULT_SUMMARY_PROMPT, ExpertMode,
    SUMMARIZER_SYSTEM_PROMPT, build_document_context_prompt,
};

/// Generation settings for worker summaries (tighter and more deterministic
/// than chat)
const SUMMARY_MAX_TOKENS: u32 = 1000;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Generation settings for the custom summarization endpoint
const CUSTOM_SUMMARY_MAX_TOKENS: u32 = 2000;
const CUSTOM_SUMMARY_TEMPERATURE: f32 = 0.7;

/// Classification of an incoming chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageValidation {
    Valid,
    Empty,
    TooLong { length: usize },
}

/// Classify a chat message against the configured length limit
pub fn classify_message(message: &str, max_chars: usize) -> MessageValidation {
    if message.trim().is_empty() {
        return MessageValidation::Empty;
    }
    let length = message.chars().count();
    if length > max_chars {
        return MessageValidation::TooLong { length };
    }
    MessageValidation::Valid
}

/// Result of an upload: either a fresh record or an existing one matched by
/// content hash
pub enum UploadOutcome {
    Created(PdfDocument),
    Duplicate(PdfDocument),
}

impl UploadOutcome {
    pub fn into_document(self) -> PdfDocument {
        match self {
            UploadOutcome::Created(doc) | UploadOutcome::Duplicate(doc) => doc,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, UploadOutcome::Duplicate(_))
    }
}

/// Main service coordinator
pub struct DocentService {
    pub config: Arc<ServiceConfig>,
    pub db: Arc<Database>,
    pub completion: Arc<CompletionClient>,
    pub i18n: Arc<I18n>,
    extractor: PdfExtractor,
}

impl DocentService {
    /// Create a new service instance
    pub fn new(db: Arc<Database>, config: Arc<ServiceConfig>) -> ServiceResult<Self> {
        info!("Initializing Docent service");

        let completion = Arc::new(CompletionClient::new(config.completion.clone())?);

        if completion.is_configured() {
            info!(model = %config.completion.model, "Completion API configured");
        } else {
            warn!("Completion API key not set; chat is unavailable and summaries fall back to extractive mode");
        }

        let i18n = Arc::new(I18n::new());

        Ok(Self {
            config,
            db,
            completion,
            i18n,
            extractor: PdfExtractor::new(),
        })
    }

    fn validate_message(&self, message: &str) -> ServiceResult<()> {
        let max = self.config.limits.max_message_chars;
        match classify_message(message, max) {
            MessageValidation::Valid => Ok(()),
            MessageValidation::Empty => Err(ServiceError::EmptyMessage),
            MessageValidation::TooLong { length } => {
                Err(ServiceError::MessageTooLong { length, max })
            }
        }
    }

    fn resolve_expert_mode(&self, code: Option<&str>) -> ServiceResult<ExpertMode> {
        ExpertMode::from_code_or_default(code).ok_or_else(|| ServiceError::UnknownExpertMode {
            mode: code.unwrap_or_default().to_string(),
        })
    }

    // === Chat ===

    /// Plain chat without an expert mode
    pub async fn send_message(&self, message: &str) -> ServiceResult<String> {
        self.validate_message(message)?;
        counter!("docent_chat_requests_total", "kind" => "plain").increment(1);

        info!("Handling chat message");
        let messages = vec![
            ChatMessage::system(ASSISTANT_SYSTEM_PROMPT),
            ChatMessage::user(message),
        ];

        self.completion.chat(messages).await
    }

    /// Chat with an expert-mode system prompt
    pub async fn send_expert_message(
        &self,
        message: &str,
        mode_code: Option<&str>,
    ) -> ServiceResult<String> {
        self.validate_message(message)?;
        let mode = self.resolve_expert_mode(mode_code)?;
        counter!("docent_chat_requests_total", "kind" => "expert").increment(1);

        info!(mode = mode.code(), "Handling expert chat message");
        let messages = vec![
            ChatMessage::system(mode.prompt()),
            ChatMessage::user(message),
        ];

        self.completion.chat(messages).await
    }

    /// Chat grounded in a processed PDF document
    pub async fn send_document_message(
        &self,
        document_id: &str,
        message: &str,
        mode_code: Option<&str>,
    ) -> ServiceResult<String> {
        self.validate_message(message)?;
        let mode = self.resolve_expert_mode(mode_code)?;

        let document = self.get_document(document_id)?;
        if document.status != ProcessingStatus::Completed {
            return Err(ServiceError::DocumentNotReady {
                document_id: document_id.to_string(),
                status: document.status.as_str(),
            });
        }
        if !document.has_text() {
            return Err(ServiceError::DocumentEmpty {
                document_id: document_id.to_string(),
            });
        }

        counter!("docent_chat_requests_total", "kind" => "document").increment(1);
        info!(doc_id = %document_id, mode = mode.code(), "Handling document chat message");

        let messages = vec![
            ChatMessage::system(build_document_context_prompt(mode, &document)),
            ChatMessage::user(message),
        ];

        self.completion.chat(messages).await
    }

    // === Documents ===

    /// Validate and store an uploaded PDF, queueing it for processing.
    /// Identical bytes uploaded twice return the existing record.
    pub fn upload_document(
        &self,
        content: &[u8],
        filename: &str,
        description: Option<String>,
    ) -> ServiceResult<UploadOutcome> {
        if content.is_empty() {
            return Err(ServiceError::Processing(ProcessingError::EmptyFile));
        }

        let max_size = self.config.limits.max_pdf_size_bytes;
        if content.len() as u64 > max_size {
            return Err(ServiceError::Processing(ProcessingError::FileTooLarge {
                size: content.len() as u64,
                max: max_size,
            }));
        }

        if !is_pdf_content(content) {
            return Err(ServiceError::Processing(ProcessingError::UnsupportedFormat {
                format: file_extension(filename),
            }));
        }

        // Duplicate detection by content hash
        let file_hash = format!("{:x}", Sha256::digest(content));
        if let Some(existing) = self.db.get_document_by_hash(&file_hash)? {
            info!(doc_id = %existing.id, "Duplicate upload matched existing document");
            return Ok(UploadOutcome::Duplicate(existing));
        }

        let doc_id = Uuid::new_v4().to_string();
        let stored_name = format!("{}.pdf", doc_id);

        let uploads_dir = self.config.storage.uploads_dir();
        std::fs::create_dir_all(&uploads_dir)
            .map_err(|e| ServiceError::Processing(ProcessingError::Io(e)))?;

        let file_path = uploads_dir.join(&stored_name);
        std::fs::write(&file_path, content)
            .map_err(|e| ServiceError::Processing(ProcessingError::Io(e)))?;

        let document = PdfDocument {
            id: doc_id.clone(),
            file_name: stored_name,
            original_file_name: filename.to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            file_size: content.len() as u64,
            file_hash: Some(file_hash),
            description,
            extracted_text: None,
            summary: None,
            status: ProcessingStatus::Uploaded,
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        };

        self.db.insert_document(&document)?;
        counter!("docent_documents_uploaded_total").increment(1);

        info!(
            doc_id = %doc_id,
            filename = %filename,
            size = content.len(),
            "PDF uploaded and queued for processing"
        );

        Ok(UploadOutcome::Created(document))
    }

    /// Start the document processing worker.
    /// This should be called once on server startup; it also resumes any
    /// documents left mid-processing by a previous run.
    pub fn start_processing_worker(service: Arc<DocentService>) {
        tokio::spawn(async move {
            info!("Document processing worker started");
            loop {
                match service.db.get_next_pending_document() {
                    Ok(Some(doc)) => {
                        info!(doc_id = %doc.id, file = %doc.original_file_name, "Processing queued document");
                        service.process_document(&doc).await;
                    }
                    Ok(None) => {
                        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to check for pending documents");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        });
    }

    /// Process one document: extract text, summarize, store results.
    /// Failures mark the document failed with the error message.
    async fn process_document(&self, document: &PdfDocument) {
        let doc_id = &document.id;

        let _ = self
            .db
            .update_document_status(doc_id, ProcessingStatus::Processing, None);

        let path = PathBuf::from(&document.file_path);
        let extracted_text = match self.extractor.extract_text(&path) {
            Ok(text) => text,
            Err(e) => {
                error!(doc_id = %doc_id, error = %e, "PDF text extraction failed");
                let _ = self.db.update_document_status(
                    doc_id,
                    ProcessingStatus::Failed,
                    Some(&e.to_string()),
                );
                counter!("docent_documents_processed_total", "status" => "failed").increment(1);
                return;
            }
        };

        let summary = self.generate_summary(&extracted_text).await;

        match self
            .db
            .complete_document_processing(doc_id, &extracted_text, &summary)
        {
            Ok(_) => {
                counter!("docent_documents_processed_total", "status" => "completed").increment(1);
                info!(doc_id = %doc_id, chars = extracted_text.len(), "Document processing completed");
            }
            Err(e) => {
                error!(doc_id = %doc_id, error = %e, "Failed to store processing results");
                let _ = self.db.update_document_status(
                    doc_id,
                    ProcessingStatus::Failed,
                    Some(&e.to_string()),
                );
                counter!("docent_documents_processed_total", "status" => "failed").increment(1);
            }
        }
    }

    /// Generate an AI summary of extracted text, falling back to an
    /// extractive summary when the API is unconfigured or the call fails.
    async fn generate_summary(&self, text: &str) -> String {
        if !self.completion.is_configured() {
            warn!("Completion API not configured, generating basic summary");
            return basic_summary(text);
        }

        let messages = vec![
            ChatMessage::system(SUMMARIZER_SYSTEM_PROMPT),
            ChatMessage::user(format!("Summarize the following document:\n\n{}", text)),
        ];

        match self
            .completion
            .chat_with(messages, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "AI summary generation failed, falling back to basic summary");
                basic_summary(text)
            }
        }
    }

    /// Summarize a processed document with an optional custom prompt.
    /// The result is returned to the caller, not stored.
    pub async fn summarize_with_prompt(
        &self,
        document_id: &str,
        custom_prompt: Option<&str>,
    ) -> ServiceResult<String> {
        let document = self.get_document(document_id)?;
        if document.status != ProcessingStatus::Completed {
            return Err(ServiceError::DocumentNotReady {
                document_id: document_id.to_string(),
                status: document.status.as_str(),
            });
        }
        if !document.has_text() {
            return Err(ServiceError::DocumentEmpty {
                document_id: document_id.to_string(),
            });
        }

        let prompt = custom_prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SUMMARY_PROMPT);

        let text = document.extracted_text.as_deref().unwrap_or_default();
        let messages = vec![
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(format!("{}\n\nDocument content:\n{}", prompt, text)),
        ];

        self.completion
            .chat_with(messages, CUSTOM_SUMMARY_MAX_TOKENS, CUSTOM_SUMMARY_TEMPERATURE)
            .await
    }

    /// Get a document or fail with not-found
    pub fn get_document(&self, document_id: &str) -> ServiceResult<PdfDocument> {
        self.db
            .get_document(document_id)?
            .ok_or_else(|| ServiceError::DocumentNotFound {
                document_id: document_id.to_string(),
            })
    }

    /// The stored summary of a processed document
    pub fn document_summary(&self, document_id: &str) -> ServiceResult<String> {
        let document = self.get_document(document_id)?;
        if document.status != ProcessingStatus::Completed {
            return Err(ServiceError::DocumentNotReady {
                document_id: document_id.to_string(),
                status: document.status.as_str(),
            });
        }

        document
            .summary
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ServiceError::SummaryMissing {
                document_id: document_id.to_string(),
            })
    }

    pub fn list_documents(&self, filter: &DocumentFilter) -> ServiceResult<Vec<PdfDocument>> {
        self.db.list_documents(filter)
    }

    /// Delete a document record and its stored file
    pub fn delete_document(&self, document_id: &str) -> ServiceResult<bool> {
        let document = match self.db.get_document(document_id)? {
            Some(doc) => doc,
            None => return Ok(false),
        };

        if let Err(e) = std::fs::remove_file(&document.file_path) {
            warn!(path = %document.file_path, error = %e, "Failed to remove stored PDF file");
        }

        self.db.delete_document(document_id)
    }
}

fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LimitsConfig, ServiceConfig, StorageConfig, default_completion, default_locale,
        default_server,
    };

    fn test_service(dir: &std::path::Path) -> DocentService {
        let config = Arc::new(ServiceConfig {
            server: default_server(),
            storage: StorageConfig {
                data_dir: dir.to_path_buf(),
            },
            completion: default_completion(),
            limits: LimitsConfig {
                max_message_chars: 1000,
                max_pdf_size_bytes: 1024,
            },
            locale: default_locale(),
        });
        let db = Arc::new(Database::open(&config.storage.db_path()).unwrap());
        DocentService::new(db, config).unwrap()
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(classify_message("hello", 1000), MessageValidation::Valid);
        assert_eq!(classify_message("", 1000), MessageValidation::Empty);
        assert_eq!(classify_message("   \n\t", 1000), MessageValidation::Empty);
        assert_eq!(
            classify_message(&"a".repeat(1001), 1000),
            MessageValidation::TooLong { length: 1001 }
        );
        // Limit is counted in characters, not bytes
        assert_eq!(classify_message(&"가".repeat(1000), 1000), MessageValidation::Valid);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_api_call() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let result = service.send_message("   ").await;
        assert!(matches!(result, Err(ServiceError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_too_long_message_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let result = service.send_message(&"x".repeat(1001)).await;
        assert!(matches!(
            result,
            Err(ServiceError::MessageTooLong { length: 1001, max: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_unknown_expert_mode_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let result = service.send_expert_message("question", Some("cobol")).await;
        assert!(matches!(
            result,
            Err(ServiceError::UnknownExpertMode { mode }) if mode == "cobol"
        ));
    }

    #[test]
    fn test_upload_validations() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let empty = service.upload_document(b"", "a.pdf", None);
        assert!(matches!(
            empty,
            Err(ServiceError::Processing(ProcessingError::EmptyFile))
        ));

        let not_pdf = service.upload_document(b"plain text", "notes.txt", None);
        assert!(matches!(
            not_pdf,
            Err(ServiceError::Processing(ProcessingError::UnsupportedFormat { format })) if format == "txt"
        ));

        let too_large = service.upload_document(&vec![b'%'; 2048], "big.pdf", None);
        assert!(matches!(
            too_large,
            Err(ServiceError::Processing(ProcessingError::FileTooLarge { .. }))
        ));
    }

    #[test]
    fn test_upload_stores_file_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let outcome = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", Some("the guide".to_string()))
            .unwrap();
        assert!(!outcome.is_duplicate());

        let doc = outcome.into_document();
        assert_eq!(doc.original_file_name, "guide.pdf");
        assert_eq!(doc.status, ProcessingStatus::Uploaded);
        assert_eq!(doc.description.as_deref(), Some("the guide"));
        assert!(std::path::Path::new(&doc.file_path).exists());

        let fetched = service.get_document(&doc.id).unwrap();
        assert_eq!(fetched.file_name, doc.file_name);
    }

    #[test]
    fn test_duplicate_upload_returns_existing() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let first = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", None)
            .unwrap();
        let second = service
            .upload_document(b"%PDF-1.7 content", "renamed.pdf", None)
            .unwrap();

        assert!(second.is_duplicate());
        assert_eq!(second.into_document().id, first.into_document().id);
        assert_eq!(service.db.count_documents(None).unwrap(), 1);
    }

    #[test]
    fn test_delete_removes_file_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let outcome = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", None)
            .unwrap();
        let doc = outcome.into_document();

        assert!(service.delete_document(&doc.id).unwrap());
        assert!(!std::path::Path::new(&doc.file_path).exists());
        assert!(!service.delete_document(&doc.id).unwrap());
    }

    #[tokio::test]
    async fn test_document_chat_requires_completed_status() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let outcome = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", None)
            .unwrap();
        let doc_id = outcome.into_document().id;

        let result = service
            .send_document_message(&doc_id, "what is this?", None)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::DocumentNotReady { status: "uploaded", .. })
        ));
    }

    #[tokio::test]
    async fn test_document_chat_requires_extracted_text() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let outcome = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", None)
            .unwrap();
        let doc_id = outcome.into_document().id;
        service
            .db
            .complete_document_processing(&doc_id, "   ", "summary")
            .unwrap();

        let result = service
            .send_document_message(&doc_id, "what is this?", None)
            .await;
        assert!(matches!(result, Err(ServiceError::DocumentEmpty { .. })));
    }

    #[test]
    fn test_document_summary_checks() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let missing = service.document_summary("nope");
        assert!(matches!(missing, Err(ServiceError::DocumentNotFound { .. })));

        let outcome = service
            .upload_document(b"%PDF-1.7 content", "guide.pdf", None)
            .unwrap();
        let doc_id = outcome.into_document().id;

        let not_ready = service.document_summary(&doc_id);
        assert!(matches!(not_ready, Err(ServiceError::DocumentNotReady { .. })));

        // Completed but with a blank summary
        service
            .db
            .complete_document_processing(&doc_id, "text", "   ")
            .unwrap();
        let missing_summary = service.document_summary(&doc_id);
        assert!(matches!(
            missing_summary,
            Err(ServiceError::SummaryMissing { .. })
        ));

        service
            .db
            .complete_document_processing(&doc_id, "text", "the summary")
            .unwrap();
        assert_eq!(service.document_summary(&doc_id).unwrap(), "the summary");
    }
}

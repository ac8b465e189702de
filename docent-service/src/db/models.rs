//! Database model structs.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Processing status for uploaded PDF documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// File stored, waiting for the processing worker
    Uploaded,
    /// Text extraction / summarization in progress
    Processing,
    /// Extraction and summary completed successfully
    Completed,
    /// Processing failed; `error_message` holds the reason
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Uploaded => "uploaded",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Unrecognized values map to `Failed`; a corrupt row must never read
    /// as completed.
    pub fn from_str(s: &str) -> Self {
        match s {
            "uploaded" => ProcessingStatus::Uploaded,
            "processing" => ProcessingStatus::Processing,
            "completed" => ProcessingStatus::Completed,
            _ => ProcessingStatus::Failed,
        }
    }
}

/// Uploaded PDF document record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfDocument {
    pub id: String,
    /// Unique stored filename (UUID-based)
    pub file_name: String,
    /// Filename as uploaded by the user
    pub original_file_name: String,
    pub file_path: String,
    pub file_size: u64,
    /// SHA-256 of the file contents, used for duplicate detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl PdfDocument {
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let file_size: i64 = row.get(4)?;
        let status_str: String = row.get(9)?;
        let uploaded_at_str: String = row.get(11)?;
        let processed_at_str: Option<String> = row.get(12)?;

        Ok(Self {
            id: row.get(0)?,
            file_name: row.get(1)?,
            original_file_name: row.get(2)?,
            file_path: row.get(3)?,
            file_size: file_size as u64,
            file_hash: row.get(5)?,
            description: row.get(6)?,
            extracted_text: row.get(7)?,
            summary: row.get(8)?,
            status: ProcessingStatus::from_str(&status_str),
            error_message: row.get(10)?,
            uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            processed_at: processed_at_str.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            }),
        })
    }

    /// Whether the document has text available for chat / summarization
    pub fn has_text(&self) -> bool {
        self.extracted_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

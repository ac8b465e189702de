//! PDF document CRUD operations.
//!
//! This module contains all document-related database operations including
//! insert, get, list, delete, and the processing worker queue.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params, params_from_iter, types::Value};

use super::Database;
use super::models::{PdfDocument, ProcessingStatus};
use crate::error::{DatabaseError, ServiceResult};

const DOCUMENT_COLUMNS: &str = "id, file_name, original_file_name, file_path, file_size, \
     file_hash, description, extracted_text, summary, status, error_message, \
     uploaded_at, processed_at";

/// Filters for listing documents
#[derive(Debug, Default, Clone)]
pub struct DocumentFilter {
    pub status: Option<ProcessingStatus>,
    /// Substring match against the original filename
    pub keyword: Option<String>,
    pub uploaded_after: Option<DateTime<Utc>>,
    pub uploaded_before: Option<DateTime<Utc>>,
}

impl Database {
    /// Insert a new document
    pub fn insert_document(&self, doc: &PdfDocument) -> ServiceResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO pdf_documents (id, file_name, original_file_name, file_path, file_size, file_hash, description, extracted_text, summary, status, error_message, uploaded_at, processed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                doc.id,
                doc.file_name,
                doc.original_file_name,
                doc.file_path,
                doc.file_size as i64,
                doc.file_hash,
                doc.description,
                doc.extracted_text,
                doc.summary,
                doc.status.as_str(),
                doc.error_message,
                doc.uploaded_at.to_rfc3339(),
                doc.processed_at.map(|dt| dt.to_rfc3339()),
            ],
        )
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Get a document by ID
    pub fn get_document(&self, id: &str) -> ServiceResult<Option<PdfDocument>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM pdf_documents WHERE id = ?1"),
            params![id],
            PdfDocument::from_row,
        )
        .optional()
        .map_err(DatabaseError::Query)
        .map_err(Into::into)
    }

    /// Check if a document with the given file hash already exists.
    /// Failed uploads don't count; re-uploading them is allowed.
    pub fn get_document_by_hash(&self, file_hash: &str) -> ServiceResult<Option<PdfDocument>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM pdf_documents WHERE file_hash = ?1 AND status != 'failed'"
            ),
            params![file_hash],
            PdfDocument::from_row,
        )
        .optional()
        .map_err(DatabaseError::Query)
        .map_err(Into::into)
    }

    /// List documents, most recently uploaded first, with optional filters
    pub fn list_documents(&self, filter: &DocumentFilter) -> ServiceResult<Vec<PdfDocument>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT {DOCUMENT_COLUMNS} FROM pdf_documents WHERE 1=1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", values.len() + 1));
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(keyword) = &filter.keyword {
            sql.push_str(&format!(
                " AND original_file_name LIKE ?{}",
                values.len() + 1
            ));
            values.push(Value::Text(format!("%{}%", keyword)));
        }
        if let Some(after) = filter.uploaded_after {
            sql.push_str(&format!(" AND uploaded_at >= ?{}", values.len() + 1));
            values.push(Value::Text(after.to_rfc3339()));
        }
        if let Some(before) = filter.uploaded_before {
            sql.push_str(&format!(" AND uploaded_at <= ?{}", values.len() + 1));
            values.push(Value::Text(before.to_rfc3339()));
        }

        sql.push_str(" ORDER BY uploaded_at DESC");

        let mut stmt = conn.prepare(&sql).map_err(DatabaseError::Query)?;
        let rows = stmt
            .query_map(params_from_iter(values), PdfDocument::from_row)
            .map_err(DatabaseError::Query)?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(row.map_err(DatabaseError::Query)?);
        }

        Ok(docs)
    }

    /// Delete a document record
    pub fn delete_document(&self, id: &str) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();

        let rows = conn
            .execute("DELETE FROM pdf_documents WHERE id = ?1", params![id])
            .map_err(DatabaseError::Query)?;

        Ok(rows > 0)
    }

    /// Update a document's processing status
    pub fn update_document_status(
        &self,
        document_id: &str,
        status: ProcessingStatus,
        error: Option<&str>,
    ) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();

        let rows = conn
            .execute(
                "UPDATE pdf_documents SET status = ?1, error_message = ?2 WHERE id = ?3",
                params![status.as_str(), error, document_id],
            )
            .map_err(DatabaseError::Query)?;

        Ok(rows > 0)
    }

    /// Store extraction results and mark the document completed
    pub fn complete_document_processing(
        &self,
        document_id: &str,
        extracted_text: &str,
        summary: &str,
    ) -> ServiceResult<bool> {
        let conn = self.conn.lock().unwrap();

        let rows = conn
            .execute(
                "UPDATE pdf_documents SET extracted_text = ?1, summary = ?2, status = 'completed', error_message = NULL, processed_at = ?3 WHERE id = ?4",
                params![
                    extracted_text,
                    summary,
                    Utc::now().to_rfc3339(),
                    document_id
                ],
            )
            .map_err(DatabaseError::Query)?;

        Ok(rows > 0)
    }

    /// Get the next document waiting for processing (oldest first).
    /// Documents stuck in 'processing' (worker restart) are resumed before
    /// fresh uploads.
    pub fn get_next_pending_document(&self) -> ServiceResult<Option<PdfDocument>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM pdf_documents \
                 WHERE status IN ('processing', 'uploaded') \
                 ORDER BY CASE status WHEN 'processing' THEN 0 ELSE 1 END, uploaded_at ASC \
                 LIMIT 1"
            ),
            [],
            PdfDocument::from_row,
        )
        .optional()
        .map_err(DatabaseError::Query)
        .map_err(Into::into)
    }

    /// Count documents by status, for metrics and health reporting
    pub fn count_documents(&self, status: Option<ProcessingStatus>) -> ServiceResult<u64> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = match status {
            Some(status) => conn
                .query_row(
                    "SELECT COUNT(*) FROM pdf_documents WHERE status = ?1",
                    params![status.as_str()],
                    |row| row.get(0),
                )
                .map_err(DatabaseError::Query)?,
            None => conn
                .query_row("SELECT COUNT(*) FROM pdf_documents", [], |row| row.get(0))
                .map_err(DatabaseError::Query)?,
        };

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn test_document(id: &str, original_name: &str) -> PdfDocument {
        PdfDocument {
            id: id.to_string(),
            file_name: format!("{}.pdf", id),
            original_file_name: original_name.to_string(),
            file_path: format!("/tmp/{}.pdf", id),
            file_size: 1024,
            file_hash: Some(format!("hash-{}", id)),
            description: None,
            extracted_text: None,
            summary: None,
            status: ProcessingStatus::Uploaded,
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, db) = test_db();

        let doc = test_document("doc-1", "handbook.pdf");
        db.insert_document(&doc).unwrap();

        let fetched = db.get_document("doc-1").unwrap().unwrap();
        assert_eq!(fetched.original_file_name, "handbook.pdf");
        assert_eq!(fetched.status, ProcessingStatus::Uploaded);
        assert!(fetched.processed_at.is_none());

        assert!(db.get_document("missing").unwrap().is_none());
    }

    #[test]
    fn test_status_lifecycle() {
        let (_dir, db) = test_db();

        db.insert_document(&test_document("doc-1", "a.pdf")).unwrap();

        assert!(
            db.update_document_status("doc-1", ProcessingStatus::Processing, None)
                .unwrap()
        );
        let doc = db.get_document("doc-1").unwrap().unwrap();
        assert_eq!(doc.status, ProcessingStatus::Processing);

        assert!(
            db.complete_document_processing("doc-1", "extracted text", "a summary")
                .unwrap()
        );
        let doc = db.get_document("doc-1").unwrap().unwrap();
        assert_eq!(doc.status, ProcessingStatus::Completed);
        assert_eq!(doc.extracted_text.as_deref(), Some("extracted text"));
        assert_eq!(doc.summary.as_deref(), Some("a summary"));
        assert!(doc.processed_at.is_some());
    }

    #[test]
    fn test_failed_status_stores_error() {
        let (_dir, db) = test_db();

        db.insert_document(&test_document("doc-1", "a.pdf")).unwrap();
        db.update_document_status("doc-1", ProcessingStatus::Failed, Some("boom"))
            .unwrap();

        let doc = db.get_document("doc-1").unwrap().unwrap();
        assert_eq!(doc.status, ProcessingStatus::Failed);
        assert_eq!(doc.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_pending_queue_prioritizes_interrupted() {
        let (_dir, db) = test_db();

        let mut older = test_document("doc-older", "older.pdf");
        older.uploaded_at = Utc::now() - Duration::minutes(10);
        db.insert_document(&older).unwrap();

        let mut interrupted = test_document("doc-interrupted", "interrupted.pdf");
        interrupted.uploaded_at = Utc::now();
        interrupted.status = ProcessingStatus::Processing;
        db.insert_document(&interrupted).unwrap();

        // The newer document stuck in 'processing' resumes first
        let next = db.get_next_pending_document().unwrap().unwrap();
        assert_eq!(next.id, "doc-interrupted");

        db.complete_document_processing("doc-interrupted", "t", "s")
            .unwrap();
        let next = db.get_next_pending_document().unwrap().unwrap();
        assert_eq!(next.id, "doc-older");

        db.update_document_status("doc-older", ProcessingStatus::Failed, Some("err"))
            .unwrap();
        assert!(db.get_next_pending_document().unwrap().is_none());
    }

    #[test]
    fn test_list_with_filters() {
        let (_dir, db) = test_db();

        let mut first = test_document("doc-1", "rust-guide.pdf");
        first.uploaded_at = Utc::now() - Duration::hours(2);
        db.insert_document(&first).unwrap();

        let second = test_document("doc-2", "java-notes.pdf");
        db.insert_document(&second).unwrap();
        db.complete_document_processing("doc-2", "t", "s").unwrap();

        // Most recent first
        let all = db.list_documents(&DocumentFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "doc-2");

        // Status filter
        let completed = db
            .list_documents(&DocumentFilter {
                status: Some(ProcessingStatus::Completed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, "doc-2");

        // Keyword filter
        let rust = db
            .list_documents(&DocumentFilter {
                keyword: Some("rust".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].id, "doc-1");

        // Date range filter
        let recent = db
            .list_documents(&DocumentFilter {
                uploaded_after: Some(Utc::now() - Duration::hours(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "doc-2");
    }

    #[test]
    fn test_duplicate_hash_lookup() {
        let (_dir, db) = test_db();

        db.insert_document(&test_document("doc-1", "a.pdf")).unwrap();

        let dup = db.get_document_by_hash("hash-doc-1").unwrap();
        assert_eq!(dup.unwrap().id, "doc-1");

        // Failed documents are not counted as duplicates
        db.update_document_status("doc-1", ProcessingStatus::Failed, Some("err"))
            .unwrap();
        assert!(db.get_document_by_hash("hash-doc-1").unwrap().is_none());
    }

    #[test]
    fn test_delete_and_count() {
        let (_dir, db) = test_db();

        db.insert_document(&test_document("doc-1", "a.pdf")).unwrap();
        db.insert_document(&test_document("doc-2", "b.pdf")).unwrap();

        assert_eq!(db.count_documents(None).unwrap(), 2);
        assert!(db.delete_document("doc-1").unwrap());
        assert!(!db.delete_document("doc-1").unwrap());
        assert_eq!(db.count_documents(None).unwrap(), 1);
        assert_eq!(
            db.count_documents(Some(ProcessingStatus::Uploaded)).unwrap(),
            1
        );
    }
}

//! Database schema migrations.
//!
//! This module contains all database migrations and schema setup.

use rusqlite::Connection;

use crate::error::{DatabaseError, ServiceResult};

/// Run all database migrations.
///
/// This function is called during database initialization to ensure
/// the schema is up to date.
pub(super) fn run_migrations(conn: &Connection) -> ServiceResult<()> {
    // Initial schema setup
    conn.execute_batch(
        r#"
        -- Uploaded PDF documents
        CREATE TABLE IF NOT EXISTS pdf_documents (
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL UNIQUE,
            original_file_name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            file_hash TEXT,
            description TEXT,
            extracted_text TEXT,
            summary TEXT,
            status TEXT NOT NULL DEFAULT 'uploaded',
            error_message TEXT,
            uploaded_at TEXT NOT NULL DEFAULT (datetime('now')),
            processed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_pdf_documents_status ON pdf_documents(status);
        CREATE INDEX IF NOT EXISTS idx_pdf_documents_uploaded_at ON pdf_documents(uploaded_at);
        CREATE INDEX IF NOT EXISTS idx_pdf_documents_hash ON pdf_documents(file_hash);
        "#,
    )
    .map_err(|e| DatabaseError::Migration {
        message: format!("Initial schema setup failed: {}", e),
    })?;

    Ok(())
}

//! PDF text extraction and fallback summarization.

use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ProcessingError, ServiceError, ServiceResult};

/// Create a new Pdfium instance (dynamically linked)
/// Searches for libpdfium in:
/// 1. Current directory (./libpdfium.so)
/// 2. vendor/pdfium/lib/
/// 3. System library paths
fn create_pdfium() -> Result<Pdfium, ProcessingError> {
    // Try local paths first, then system
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| {
            ProcessingError::PdfLoad(format!(
                "Failed to load PDFium library. Install libpdfium or place it next to the binary: {:?}",
                e
            ))
        })?;

    Ok(Pdfium::new(bindings))
}

/// PDF text extractor
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the full text of a PDF, page by page
    pub fn extract_text(&self, path: &Path) -> ServiceResult<String> {
        let pdfium = create_pdfium()?;

        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            ProcessingError::PdfLoad(format!("Failed to load PDF {}: {:?}", path.display(), e))
        })?;

        let page_count = document.pages().len();
        info!(path = %path.display(), pages = page_count, "Extracting PDF text");

        let mut pages = Vec::new();
        for (page_index, page) in document.pages().iter().enumerate() {
            let page_num = page_index as u16 + 1;

            let text = page.text().map_err(|e| {
                warn!(page = page_num, error = ?e, "Failed to get text object for page");
                ProcessingError::TextExtraction {
                    page: page_num,
                    message: format!("{:?}", e),
                }
            })?;

            let page_text = text.all();
            let page_text = page_text.trim();
            if !page_text.is_empty() {
                pages.push(page_text.to_string());
            }
        }

        if pages.is_empty() {
            return Err(ServiceError::Processing(ProcessingError::TextExtraction {
                page: 0,
                message: "No text could be extracted from PDF".to_string(),
            }));
        }

        Ok(pages.join("\n\n"))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that uploaded bytes look like a PDF (magic header)
pub fn is_pdf_content(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}

/// Extractive fallback summary used when the completion API is unavailable:
/// the first few sentences, bulleted.
pub fn basic_summary(text: &str) -> String {
    const MAX_SENTENCES: usize = 5;
    const MIN_SENTENCE_CHARS: usize = 10;

    let text = text.trim();
    if text.is_empty() {
        return "No text could be extracted.".to_string();
    }

    let mut summary = String::from("Document summary:\n");
    let mut taken = 0;
    for sentence in text.split(['.', '!', '?']) {
        if taken >= MAX_SENTENCES {
            break;
        }
        let sentence = sentence.trim();
        if sentence.chars().count() > MIN_SENTENCE_CHARS {
            summary.push_str("\n\u{2022} ");
            summary.push_str(sentence);
            taken += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_content() {
        assert!(is_pdf_content(b"%PDF-1.7 rest of file"));
        assert!(!is_pdf_content(b"PK\x03\x04 zip archive"));
        assert!(!is_pdf_content(b""));
    }

    #[test]
    fn test_basic_summary_takes_leading_sentences() {
        let text = "The first sentence is here. A second sentence follows! Tiny. \
                    Third real sentence with content? Fourth sentence goes on. \
                    Fifth sentence arrives now. Sixth sentence is dropped.";
        let summary = basic_summary(text);

        assert!(summary.starts_with("Document summary:"));
        assert!(summary.contains("\u{2022} The first sentence is here"));
        // Sentences at or below the length floor are skipped
        assert!(!summary.contains("Tiny"));
        // Capped at five sentences
        assert!(!summary.contains("Sixth sentence"));
        assert_eq!(summary.matches('\u{2022}').count(), 5);
    }

    #[test]
    fn test_basic_summary_empty_text() {
        assert_eq!(basic_summary("   "), "No text could be extracted.");
    }
}

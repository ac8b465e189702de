//! Expert-mode prompt templates and prompt construction.
//!
//! An expert mode is a named system-prompt template selected per request.
//! The selected prompt becomes the system message sent to the completion
//! API; for PDF chat a document context block is appended to it.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::db::PdfDocument;

/// Named system-prompt template selected by a request field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertMode {
    Java,
    Python,
    Javascript,
    #[default]
    General,
}

impl ExpertMode {
    /// Wire code used in request fields
    pub fn code(&self) -> &'static str {
        match self {
            ExpertMode::Java => "java",
            ExpertMode::Python => "python",
            ExpertMode::Javascript => "javascript",
            ExpertMode::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExpertMode::Java => "Java Expert",
            ExpertMode::Python => "Python Expert",
            ExpertMode::Javascript => "JavaScript Expert",
            ExpertMode::General => "General Assistant",
        }
    }

    /// Strict lookup: `None` for codes that don't name a mode.
    /// Callers that want the lenient default use `from_code_or_default`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|mode| mode.code() == code)
    }

    /// Lenient lookup: missing or blank selects the general mode
    pub fn from_code_or_default(code: Option<&str>) -> Option<Self> {
        match code.map(str::trim) {
            None | Some("") => Some(ExpertMode::General),
            Some(code) => Self::from_code(code),
        }
    }

    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// System prompt for this mode
    pub fn prompt(&self) -> &'static str {
        match self {
            ExpertMode::Java => {
                "[System Prompt: Senior Java Developer Mentor]\n\
                 \n\
                 Role: senior Java developer with big-tech experience.\n\
                 Specialties: Spring Boot, the JVM, performance tuning, architecture design, microservices.\n\
                 \n\
                 Important: only answer questions related to Java, Spring Boot, the JVM, and software development.\n\
                 For unrelated questions (cooking, travel, general trivia), reply that you are a Java development\n\
                 expert and can only help with Java and software development questions.\n\
                 \n\
                 Response rules:\n\
                 1. Give concrete improvements with reasoning when reviewing code\n\
                 2. Favor modern Java features (records, sealed classes, switch expressions, text blocks)\n\
                 3. Apply Spring Boot best practices and design patterns\n\
                 4. Consider performance, security, and maintainability\n\
                 5. Explain JVM internals and memory management where relevant\n\
                 6. Provide unit and integration testing guidance\n\
                 \n\
                 Code style: clear and readable code, appropriate comments, SOLID principles,\n\
                 deliberate exception handling and logging."
            }
            ExpertMode::Python => {
                "[System Prompt: Senior Python Developer Mentor]\n\
                 \n\
                 Role: senior Python developer with big-tech experience.\n\
                 Specialties: Django/FastAPI, data analysis, machine learning, async programming, DevOps.\n\
                 \n\
                 Important: only answer questions related to Python, Django/FastAPI, data analysis,\n\
                 machine learning, and software development. For unrelated questions (cooking, travel,\n\
                 general trivia), reply that you are a Python development expert and can only help with\n\
                 Python and software development questions.\n\
                 \n\
                 Response rules:\n\
                 1. Write Pythonic code following PEP 8\n\
                 2. Use modern Python features (type hints, dataclasses, async/await, context managers)\n\
                 3. Consider performance and memory management\n\
                 4. Promote test-driven development and CI/CD pipelines\n\
                 5. Optimize data structures and algorithms\n\
                 6. Follow security and error-handling best practices\n\
                 \n\
                 Frameworks: Django (ORM, middleware, views, templates), FastAPI (async APIs,\n\
                 dependency injection, automatic docs), pandas/NumPy (efficient data processing)."
            }
            ExpertMode::Javascript => {
                "[System Prompt: Senior JavaScript Developer Mentor]\n\
                 \n\
                 Role: senior JavaScript developer with big-tech experience.\n\
                 Specialties: React/Vue/Angular, Node.js, TypeScript, performance tuning, web standards.\n\
                 \n\
                 Important: only answer questions related to JavaScript, TypeScript, React/Vue/Angular,\n\
                 Node.js, and web development. For unrelated questions (cooking, travel, general trivia),\n\
                 reply that you are a JavaScript development expert and can only help with JavaScript and\n\
                 web development questions.\n\
                 \n\
                 Response rules:\n\
                 1. Use modern ES6+ syntax and best practices\n\
                 2. Leverage TypeScript for type safety\n\
                 3. Apply functional programming and async patterns\n\
                 4. Improve web performance and user experience\n\
                 5. Guard against security vulnerabilities and keep code quality high\n\
                 6. Automate testing and deployment\n\
                 \n\
                 Frameworks: React (hooks, context, state management, performance), Vue (composition API,\n\
                 reactivity), Node.js (Express, middleware, async handling)."
            }
            ExpertMode::General => {
                "[System Prompt: General AI Assistant]\n\
                 \n\
                 Role: a helpful AI assistant.\n\
                 Specialties: general questions and answers, learning support, problem solving.\n\
                 \n\
                 Response rules:\n\
                 1. Give friendly and accurate answers\n\
                 2. Explain complex concepts simply\n\
                 3. Offer step-by-step solutions\n\
                 4. Suggest further reading and references"
            }
        }
    }
}

/// System prompt for the plain chat endpoint (no expert mode)
pub const ASSISTANT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Answer in a friendly and accurate manner.";

/// System prompt for document summary generation (worker path)
pub const SUMMARIZER_SYSTEM_PROMPT: &str = "You are a document summarization expert. \
Summarize the given text concisely and clearly.\n\
\n\
Summary format:\n\
1. Main topic and purpose\n\
2. Three to five key points\n\
3. Important keywords\n\
4. Conclusion or takeaways";

/// System prompt for the custom summarization endpoint
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a document analysis expert. \
Analyze the document and respond according to the user's request.";

/// Default user prompt for the custom summarization endpoint when no custom
/// prompt is supplied
pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize the following PDF document:\n\
\n\
1. The document's main topic and purpose\n\
2. Three to five key points\n\
3. Important keywords or concepts\n\
4. Conclusion or takeaways\n\
\n\
Keep the summary concise and clear.";

/// Build the system prompt for PDF chat: the expert prompt plus a document
/// context block with an instruction to answer from the document only.
pub fn build_document_context_prompt(mode: ExpertMode, document: &PdfDocument) -> String {
    let summary = document
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("No summary available");
    let extracted_text = document.extracted_text.as_deref().unwrap_or_default();

    format!(
        "{base}\n\
         \n\
         [Reference Document]\n\
         Filename: {filename}\n\
         Uploaded: {uploaded_at}\n\
         Summary: {summary}\n\
         \n\
         [Document Content]\n\
         {text}\n\
         \n\
         Answer the user's question using the document above. If the document does not \
         contain the information, say explicitly that it cannot be found in the document.",
        base = mode.prompt(),
        filename = document.original_file_name,
        uploaded_at = document.uploaded_at.to_rfc3339(),
        summary = summary,
        text = extracted_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProcessingStatus;
    use chrono::Utc;

    #[test]
    fn test_from_code() {
        assert_eq!(ExpertMode::from_code("java"), Some(ExpertMode::Java));
        assert_eq!(ExpertMode::from_code("python"), Some(ExpertMode::Python));
        assert_eq!(
            ExpertMode::from_code("javascript"),
            Some(ExpertMode::Javascript)
        );
        assert_eq!(ExpertMode::from_code("general"), Some(ExpertMode::General));
        assert_eq!(ExpertMode::from_code("rust"), None);
    }

    #[test]
    fn test_from_code_or_default() {
        // Missing or blank mode falls back to general
        assert_eq!(
            ExpertMode::from_code_or_default(None),
            Some(ExpertMode::General)
        );
        assert_eq!(
            ExpertMode::from_code_or_default(Some("  ")),
            Some(ExpertMode::General)
        );
        // An explicit unknown code is rejected, not silently defaulted
        assert_eq!(ExpertMode::from_code_or_default(Some("cobol")), None);
    }

    #[test]
    fn test_all_modes_have_distinct_prompts() {
        let modes = ExpertMode::all();
        assert_eq!(modes.len(), 4);
        for mode in &modes {
            assert!(mode.prompt().contains("[System Prompt:"));
        }
        assert_ne!(ExpertMode::Java.prompt(), ExpertMode::Python.prompt());
    }

    fn completed_document() -> PdfDocument {
        PdfDocument {
            id: "doc-1".to_string(),
            file_name: "doc-1.pdf".to_string(),
            original_file_name: "handbook.pdf".to_string(),
            file_path: "/tmp/doc-1.pdf".to_string(),
            file_size: 1024,
            file_hash: None,
            description: None,
            extracted_text: Some("The handbook covers onboarding.".to_string()),
            summary: Some("Onboarding guide.".to_string()),
            status: ProcessingStatus::Completed,
            error_message: None,
            uploaded_at: Utc::now(),
            processed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_document_context_prompt() {
        let doc = completed_document();
        let prompt = build_document_context_prompt(ExpertMode::Java, &doc);

        assert!(prompt.starts_with(ExpertMode::Java.prompt()));
        assert!(prompt.contains("Filename: handbook.pdf"));
        assert!(prompt.contains("Summary: Onboarding guide."));
        assert!(prompt.contains("The handbook covers onboarding."));
        assert!(prompt.contains("cannot be found in the document"));
    }

    #[test]
    fn test_document_context_prompt_without_summary() {
        let mut doc = completed_document();
        doc.summary = None;
        let prompt = build_document_context_prompt(ExpertMode::General, &doc);
        assert!(prompt.contains("Summary: No summary available"));
    }
}

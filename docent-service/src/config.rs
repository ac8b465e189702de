//! Service configuration loaded from an optional `config` file and
//! `DOCENT__`-prefixed environment variables.

// Leading `::` disambiguates the config crate from this module
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{ServiceError, ServiceResult};

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_completion")]
    pub completion: CompletionConfig,

    #[serde(default = "default_limits")]
    pub limits: LimitsConfig,

    /// Locale used for user-facing messages ("en" or "ko")
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Directory where uploaded PDFs are stored
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Path to the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("docent.db")
    }
}

/// Completion API (OpenAI-compatible) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// API key. Empty means the completion API is not configured; chat
    /// endpoints fail fast and summaries fall back to extractive mode.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl CompletionConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.model.trim().is_empty()
            && self.max_tokens > 0
            && (0.0..=2.0).contains(&self.temperature)
    }
}

/// Request limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum chat message length in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Maximum uploaded PDF size in bytes
    #[serde(default = "default_max_pdf_size_bytes")]
    pub max_pdf_size_bytes: u64,
}

/// Load configuration from file and env vars
pub fn load_config() -> ServiceResult<ServiceConfig> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("DOCENT")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to deserialize config: {}", e),
        })
}

// ==================== Default Value Functions ====================

pub(crate) fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_storage() -> StorageConfig {
    StorageConfig {
        data_dir: default_data_dir(),
    }
}

pub(crate) fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

pub(crate) fn default_completion() -> CompletionConfig {
    CompletionConfig {
        api_key: String::new(),
        base_url: default_base_url(),
        model: default_model(),
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
        request_timeout_secs: default_request_timeout_secs(),
    }
}

pub(crate) fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub(crate) fn default_model() -> String {
    "gpt-4o".to_string()
}

pub(crate) fn default_max_tokens() -> u32 {
    2000
}

pub(crate) fn default_temperature() -> f32 {
    0.7
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_limits() -> LimitsConfig {
    LimitsConfig {
        max_message_chars: default_max_message_chars(),
        max_pdf_size_bytes: default_max_pdf_size_bytes(),
    }
}

pub(crate) fn default_max_message_chars() -> usize {
    1000
}

pub(crate) fn default_max_pdf_size_bytes() -> u64 {
    10 * 1024 * 1024
}

pub(crate) fn default_locale() -> String {
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let completion = default_completion();
        assert_eq!(completion.model, "gpt-4o");
        assert_eq!(completion.max_tokens, 2000);
        assert!((completion.temperature - 0.7).abs() < f32::EPSILON);

        let limits = default_limits();
        assert_eq!(limits.max_message_chars, 1000);
        assert_eq!(limits.max_pdf_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_completion_not_configured_without_key() {
        let completion = default_completion();
        assert!(!completion.is_configured());
    }

    #[test]
    fn test_completion_configured_with_key() {
        let mut completion = default_completion();
        completion.api_key = "sk-test".to_string();
        assert!(completion.is_configured());
    }

    #[test]
    fn test_completion_rejects_out_of_range_temperature() {
        let mut completion = default_completion();
        completion.api_key = "sk-test".to_string();
        completion.temperature = 2.5;
        assert!(!completion.is_configured());
    }

    #[test]
    fn test_storage_paths() {
        let storage = default_storage();
        assert_eq!(storage.db_path(), PathBuf::from("./data/docent.db"));
        assert_eq!(storage.uploads_dir(), PathBuf::from("./data/uploads"));
    }
}

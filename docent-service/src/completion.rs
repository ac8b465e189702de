//! Client for an OpenAI-compatible chat-completions API.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::CompletionConfig;
use crate::error::{CompletionError, ServiceError, ServiceResult};

/// Completion API client
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a new completion client
    pub fn new(config: CompletionConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::Completion(CompletionError::Connection {
                    url: config.base_url.clone(),
                    source: e,
                })
            })?;

        Ok(Self { client, config })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send a chat completion request with the configured generation settings
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> ServiceResult<String> {
        self.chat_with(messages, self.config.max_tokens, self.config.temperature)
            .await
    }

    /// Send a chat completion request with explicit generation settings
    /// (summaries use tighter limits and a lower temperature than chat)
    pub async fn chat_with(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> ServiceResult<String> {
        if !self.is_configured() {
            return Err(ServiceError::Completion(CompletionError::NotConfigured));
        }

        let url = format!("{}/chat/completions", self.config.base_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        debug!(model = %self.config.model, max_tokens, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Connection {
                        url: url.clone(),
                        source: e,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Completion(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CompletionError::Authentication
                }
                StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited,
                _ => CompletionError::Generation {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                },
            }));
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::InvalidResponse {
                    source: serde_json::Error::io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        e.to_string(),
                    )),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ServiceError::Completion(CompletionError::EmptyResponse))
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// Internal completion API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_completion;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::system("be helpful");
        assert_eq!(msg.role, "system");

        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 100,
            temperature: 0.7,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hello!");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = CompletionClient::new(default_completion()).unwrap();
        let result = client.chat(vec![ChatMessage::user("hi")]).await;
        assert!(matches!(
            result,
            Err(ServiceError::Completion(CompletionError::NotConfigured))
        ));
    }
}

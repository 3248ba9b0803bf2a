//! Text-completion oracle used for profile extraction, record extraction and
//! open questions.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default OpenAI-compatible API base URL
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Errors that can occur when calling the oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Oracle request timed out")]
    Timeout,

    #[error("API returned error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Oracle returned an empty response")]
    EmptyResponse,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Timeout => true,
            OracleError::Request(e) => e.is_timeout() || e.is_connect(),
            OracleError::Api { status, .. } => StatusCode::from_u16(*status).is_ok_and(is_retryable_status),
            OracleError::EmptyResponse | OracleError::InvalidResponse(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// One completion request
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OracleRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Text of the last user message
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A text-completion service
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiOracle {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiOracle {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            client,
            max_retries,
            retry_backoff,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn complete_once(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: request.system.clone(),
        });
        messages.extend(request.messages.iter().cloned());

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { OracleError::Timeout } else { OracleError::Request(e) })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(OracleError::Api { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let mut attempt = 0u32;

        loop {
            match self.complete_once(request).await {
                Ok(content) => {
                    tracing::debug!("Oracle response received, {} chars", content.len());
                    return Ok(content);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.retry_backoff * attempt;
                    tracing::warn!("Oracle call failed ({}), retry {} in {:?}", e, attempt, backoff);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    tracing::error!("Oracle call failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

/// Whether a status code is one the client retries on
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(OracleError::Timeout.is_retryable());
        assert!(OracleError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(OracleError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(!OracleError::Api { status: 401, body: String::new() }.is_retryable());
        assert!(!OracleError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_request_builder() {
        let request = OracleRequest::new("system", vec![ChatMessage::assistant("hi"), ChatMessage::user("hello")])
            .temperature(0.1)
            .max_tokens(2000);

        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.last_user_message(), Some("hello"));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_value(ChatMessage::user("x")).unwrap();
        assert_eq!(json["role"], "user");
    }
}

//! AI backend abstraction.
//!
//! Supports multiple AI backends:
//! - Local: Ollama (default)
//! - Remote: Anthropic (feature-flagged)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AgentError;
use crate::config::AiConfig;

/// A message in a conversation with the AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to the AI backend.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from the AI backend.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
}

/// Trait for AI backends.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Check if the backend is available.
    async fn health_check(&self) -> Result<bool, AgentError>;
}

fn build_client(timeout_seconds: u64) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| AgentError::BackendUnavailable(e.to_string()))
}

fn request_error(e: reqwest::Error, timeout_seconds: u64) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout(timeout_seconds)
    } else {
        AgentError::BackendUnavailable(e.to_string())
    }
}

/// Ollama backend implementation.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_seconds: u64,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String, timeout_seconds: u64) -> Result<Self, AgentError> {
        Ok(Self {
            client: build_client(timeout_seconds)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout_seconds,
        })
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl AiBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = format!("{}/api/chat", self.base_url);

        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .into_iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BackendUnavailable(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParseError(e.to_string()))?;

        Ok(ChatResponse {
            content: ollama_response.message.content,
            model: ollama_response.model,
        })
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// --- Anthropic backend ---

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

/// Anthropic API backend implementation.
#[cfg(feature = "remote-ai")]
pub struct AnthropicBackend {
    client: reqwest::Client,
    model: String,
    api_key: String,
    timeout_seconds: u64,
}

#[cfg(feature = "remote-ai")]
impl AnthropicBackend {
    pub fn new(api_key: String, model: String, timeout_seconds: u64) -> Result<Self, AgentError> {
        Ok(Self {
            client: build_client(timeout_seconds)?,
            model,
            api_key,
            timeout_seconds,
        })
    }
}

#[cfg(feature = "remote-ai")]
#[async_trait]
impl AiBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = "https://api.anthropic.com/v1/messages";

        // Anthropic takes system prompts as a top-level field
        let mut system_parts: Vec<String> = Vec::new();
        let mut messages: Vec<AnthropicMessage> = Vec::new();
        for msg in request.messages {
            match msg.role {
                MessageRole::System => system_parts.push(msg.content),
                role => messages.push(AnthropicMessage {
                    role: role.as_str().to_string(),
                    content: msg.content,
                }),
            }
        }

        let anthropic_request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(1024),
            messages,
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            temperature: request.temperature,
        };

        debug!("Sending request to Anthropic API");

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BackendUnavailable(format!(
                "Anthropic API returned {}: {}",
                status, body
            )));
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParseError(e.to_string()))?;

        Ok(ChatResponse {
            content: anthropic_response
                .content
                .into_iter()
                .map(|c| c.text)
                .collect::<Vec<_>>()
                .join(""),
            model: anthropic_response.model,
        })
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        // Anthropic has no health endpoint; assume available if key is set
        Ok(true)
    }
}

/// Create an AI backend from configuration.
pub fn create_backend(config: &AiConfig) -> Result<Box<dyn AiBackend>, AgentError> {
    match config.backend.as_str() {
        "ollama" => Ok(Box::new(OllamaBackend::new(
            config.base_url.clone(),
            config.model.clone(),
            config.timeout_seconds,
        )?)),
        #[cfg(feature = "remote-ai")]
        "anthropic" => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                AgentError::BackendUnavailable(format!(
                    "Environment variable {} not set",
                    config.api_key_env
                ))
            })?;
            Ok(Box::new(AnthropicBackend::new(
                api_key,
                config.model.clone(),
                config.timeout_seconds,
            )?))
        }
        other => Err(AgentError::UnsupportedBackend(other.to_string())),
    }
}

/// Mock backend for testing.
#[cfg(test)]
pub struct MockBackend {
    response: Result<String, String>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            response: Err(reason.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl AiBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, AgentError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "mock".to_string(),
            }),
            Err(reason) => Err(AgentError::BackendUnavailable(reason.clone())),
        }
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        Ok(self.response.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let system = ChatMessage::system("You are a coach");
        assert_eq!(system.role, MessageRole::System);

        let user = ChatMessage::user("Summarise");
        assert_eq!(user.role, MessageRole::User);
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("Test")])
            .with_temperature(0.4)
            .with_max_tokens(300);

        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(300));
    }

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("The team is improving.");

        let request = ChatRequest::new(vec![ChatMessage::user("Test")]);
        let response = backend.chat(request).await.unwrap();

        assert_eq!(response.content, "The team is improving.");
        assert_eq!(backend.calls(), 1);
        assert!(backend.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_mock_backend() {
        let backend = MockBackend::failing("offline");
        let result = backend
            .chat(ChatRequest::new(vec![ChatMessage::user("Test")]))
            .await;

        assert!(matches!(result, Err(AgentError::BackendUnavailable(_))));
        assert!(!backend.health_check().await.unwrap());
    }

    #[test]
    fn test_ollama_request_serialization() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: Some(0.5),
                num_predict: None,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_ollama_response_deserialization() {
        let json = r#"{"model": "llama3.2", "message": {"role": "assistant", "content": "Hi"}, "done": true}"#;
        let response: OllamaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.message.content, "Hi");
    }

    #[test]
    fn test_create_backend_ollama() {
        let backend = create_backend(&AiConfig::default()).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn test_create_backend_unknown() {
        let config = AiConfig {
            backend: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_backend(&config),
            Err(AgentError::UnsupportedBackend(_))
        ));
    }

    #[cfg(feature = "remote-ai")]
    #[test]
    fn test_anthropic_response_deserialization() {
        let json = r#"{
            "content": [{"type": "text", "text": "Short summary."}],
            "model": "claude-sonnet-4-20250514",
            "usage": {"input_tokens": 100, "output_tokens": 50}
        }"#;

        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].text, "Short summary.");
    }
}

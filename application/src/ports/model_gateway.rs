//! Model gateway port
//!
//! Defines the interface for talking to the generative model.

use async_trait::async_trait;
use mcp_chat_domain::{ErrorKind, Message};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during model gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Network(_) => ErrorKind::Network,
            GatewayError::RateLimited(_) => ErrorKind::RateLimit,
            GatewayError::Unauthorized(_) => ErrorKind::Auth,
            GatewayError::InvalidJson(_) => ErrorKind::Parse,
            GatewayError::RequestFailed(detail) => {
                ErrorKind::from_status_text(detail).unwrap_or(ErrorKind::Unknown)
            }
        }
    }
}

/// Output mode requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// JSON mode (`application/json` response MIME type)
    Json,
}

/// A single request to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    /// Auxiliary context framed in front of the prompt
    pub context: Option<String>,
    pub response_format: ResponseFormat,
    /// Whether the exchange is appended to the conversation history
    pub persist_history: bool,
}

impl ModelRequest {
    /// A plain text request that is recorded in history.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            response_format: ResponseFormat::Text,
            persist_history: true,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.persist_history = false;
        self
    }
}

/// Gateway for model communication
///
/// Implementations (adapters) live in the infrastructure layer and own the
/// conversation history.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send a request and return the response text.
    async fn send(&self, request: ModelRequest) -> Result<String, GatewayError>;

    /// Send a prompt in JSON mode, without history, and parse the reply.
    async fn send_structured(&self, prompt: &str) -> Result<Value, GatewayError> {
        let text = self
            .send(ModelRequest::new(prompt).json().without_history())
            .await?;
        serde_json::from_str(text.trim()).map_err(|e| GatewayError::InvalidJson(e.to_string()))
    }

    /// Snapshot of the conversation history.
    fn history(&self) -> Vec<Message>;

    /// Forget the conversation history.
    fn reset_history(&self);
}

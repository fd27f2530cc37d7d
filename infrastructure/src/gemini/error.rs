//! Error types for the Gemini adapter

use mcp_chat_application::ports::model_gateway::GatewayError;
use mcp_chat_domain::ErrorKind;
use thiserror::Error;

/// Result type alias for Gemini operations
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Errors that can occur when calling the Gemini API
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response was blocked: {0}")]
    Blocked(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

impl GeminiError {
    /// Failure category shown to the user.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeminiError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                ErrorKind::Network
            }
            GeminiError::Http(e) => ErrorKind::from_status_text(&e.to_string()).unwrap_or(ErrorKind::Unknown),
            GeminiError::Status { status, body } => ErrorKind::from_status_code(*status)
                .or_else(|| ErrorKind::from_status_text(body))
                .unwrap_or(ErrorKind::Unknown),
            GeminiError::Blocked(_) | GeminiError::EmptyResponse => ErrorKind::Unknown,
        }
    }
}

impl From<GeminiError> for GatewayError {
    fn from(e: GeminiError) -> Self {
        let detail = e.to_string();
        match e.kind() {
            ErrorKind::Network => GatewayError::Network(detail),
            ErrorKind::RateLimit => GatewayError::RateLimited(detail),
            ErrorKind::Auth => GatewayError::Unauthorized(detail),
            _ => GatewayError::RequestFailed(detail),
        }
    }
}

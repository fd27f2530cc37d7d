//! Error classification shared by every layer.
//!
//! Transports report failures as their own error types; each of them maps
//! onto an [`ErrorKind`], and the orchestrator turns a kind into an
//! [`ErrorReport`] with a user-facing message.
//!
//! | Kind | Raised by | Recoverable |
//! |------|-----------|:-----------:|
//! | `network` | connection failures, timeouts | yes |
//! | `rate_limit` | HTTP 429 / "Too Many Requests" | yes |
//! | `auth` | HTTP 401 / 403 / "Unauthorized" / "Forbidden" | no |
//! | `protocol` | tool server handshake, listing, context | yes |
//! | `tool` | tool invocation round-trip failures | yes |
//! | `parse` | model output that is not valid JSON | no |
//! | `unknown` | everything else | no |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    RateLimit,
    Auth,
    Protocol,
    Tool,
    Parse,
    Unknown,
}

impl ErrorKind {
    /// Short machine-readable classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Auth => "auth",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Tool => "tool",
            ErrorKind::Parse => "parse",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Message shown to the user when a failure of this kind ends a turn.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => {
                "A network problem occurred. Please check your internet connection."
            }
            ErrorKind::RateLimit => {
                "The API rate limit was reached. Please wait a moment and try again."
            }
            ErrorKind::Auth => {
                "API key authentication failed. Please check that your API key is set correctly."
            }
            ErrorKind::Protocol | ErrorKind::Tool => {
                "Communication with the MCP server failed. Please check that the MCP server is running."
            }
            ErrorKind::Parse => "The model returned a response that could not be understood.",
            ErrorKind::Unknown => "An unexpected error occurred. Please check the logs.",
        }
    }

    /// Whether retrying the same operation later is reasonable.
    ///
    /// Auth failures will not fix themselves within a session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::Protocol | ErrorKind::Tool
        )
    }

    /// Classify a raw error message by the status signals it contains.
    ///
    /// Returns `None` when the text carries no rate-limit or auth signal;
    /// callers decide the fallback kind.
    pub fn from_status_text(text: &str) -> Option<Self> {
        if text.contains("429") || text.contains("Too Many Requests") {
            return Some(ErrorKind::RateLimit);
        }
        if text.contains("401")
            || text.contains("403")
            || text.contains("Unauthorized")
            || text.contains("Forbidden")
        {
            return Some(ErrorKind::Auth);
        }
        None
    }

    /// Classify an HTTP status code.
    pub fn from_status_code(status: u16) -> Option<Self> {
        match status {
            429 => Some(ErrorKind::RateLimit),
            401 | 403 => Some(ErrorKind::Auth),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handled failure, ready to be shown and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub user_message: String,
    pub log_message: String,
    pub recoverable: bool,
}

impl ErrorReport {
    /// Build a report for `kind`, prefixing the log line with `context` when given.
    pub fn new(kind: ErrorKind, detail: impl fmt::Display, context: Option<&str>) -> Self {
        let log_message = match context {
            Some(context) => format!("{} - [{}] {}", context, kind, detail),
            None => format!("[{}] {}", kind, detail),
        };
        Self {
            kind,
            user_message: kind.user_message().to_string(),
            log_message,
            recoverable: kind.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_classification() {
        assert_eq!(
            ErrorKind::from_status_text("HTTP 429 Too Many Requests"),
            Some(ErrorKind::RateLimit)
        );
        assert_eq!(
            ErrorKind::from_status_text("401: Unauthorized"),
            Some(ErrorKind::Auth)
        );
        assert_eq!(
            ErrorKind::from_status_text("403 Forbidden"),
            Some(ErrorKind::Auth)
        );
        assert_eq!(ErrorKind::from_status_text("something broke"), None);
    }

    #[test]
    fn test_status_code_classification() {
        assert_eq!(ErrorKind::from_status_code(429), Some(ErrorKind::RateLimit));
        assert_eq!(ErrorKind::from_status_code(403), Some(ErrorKind::Auth));
        assert_eq!(ErrorKind::from_status_code(500), None);
    }

    #[test]
    fn test_recoverability() {
        assert!(!ErrorKind::Auth.is_recoverable());
        assert!(ErrorKind::Network.is_recoverable());
        assert!(ErrorKind::RateLimit.is_recoverable());
        assert!(ErrorKind::Protocol.is_recoverable());
        assert!(ErrorKind::Tool.is_recoverable());
        assert!(!ErrorKind::Unknown.is_recoverable());
    }

    #[test]
    fn test_report_carries_context() {
        let report = ErrorReport::new(
            ErrorKind::Network,
            "connection refused",
            Some("handling message"),
        );
        assert_eq!(report.kind, ErrorKind::Network);
        assert!(report.recoverable);
        assert!(report.user_message.contains("network"));
        assert_eq!(
            report.log_message,
            "handling message - [network] connection refused"
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RateLimit).unwrap();
        assert_eq!(json, "\"rate_limit\"");
    }
}

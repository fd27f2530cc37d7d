//! Types for the chat use case

use crate::ports::model_gateway::GatewayError;
use mcp_chat_domain::ErrorKind;
use thiserror::Error;

/// Failure that ended a turn before an answer was produced.
///
/// Tool server failures never end a turn; they fall back to the plain path.
#[derive(Error, Debug)]
pub enum HandleMessageError {
    #[error("Model request failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl HandleMessageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandleMessageError::Gateway(e) => e.kind(),
        }
    }
}

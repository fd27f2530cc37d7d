//! Tool transport port
//!
//! Defines the interface for talking to an MCP tool server.

use async_trait::async_trait;
use mcp_chat_domain::{ErrorKind, ToolDescriptor, ToolInvocationResult};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while talking to the tool server
///
/// A tool that runs and reports failure is NOT an error here; that comes
/// back as a [`ToolInvocationResult`] with `is_error` set.
#[derive(Error, Debug)]
pub enum ToolTransportError {
    #[error("Not connected to a tool server")]
    NotConnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Tool call failed: {0}")]
    Call(String),
}

impl ToolTransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolTransportError::NotConnected | ToolTransportError::Protocol(_) => {
                ErrorKind::Protocol
            }
            ToolTransportError::Call(_) => ErrorKind::Tool,
        }
    }
}

/// Connection to a tool server
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Establish the connection and run the handshake.
    ///
    /// Ordinary failures are logged and reported as `false`; resources
    /// acquired along the way are released before returning.
    async fn connect(&self) -> bool;

    /// Tools offered by the server, cached until `force_refresh` is set.
    async fn list_tools(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<ToolDescriptor>, ToolTransportError>;

    /// Invoke a tool once.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<ToolInvocationResult, ToolTransportError>;

    /// Human-readable summary of the server's resources, `None` when not connected.
    async fn get_context(&self) -> Result<Option<String>, ToolTransportError>;

    /// Close the connection and release the underlying resources.
    async fn disconnect(&self) -> Result<(), ToolTransportError>;

    fn is_connected(&self) -> bool;
}

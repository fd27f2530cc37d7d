//! Infrastructure layer for mcp-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the Gemini model gateway, the MCP tool
//! transport, settings loading, and the JSONL conversation logger.

pub mod config;
pub mod gemini;
pub mod logging;
pub mod mcp;

// Re-export commonly used types
pub use config::{
    FileConfig, GeminiSettings, McpServerSettings, McpTransportSettings, Settings, SettingsError,
    SettingsLoader, SettingsOverrides,
};
pub use gemini::{GeminiClient, GeminiError};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpClient, McpError};

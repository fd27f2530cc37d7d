//! Settings loading for mcp-chat
//!
//! Scalar settings come from figment (defaults, TOML files, environment);
//! the MCP server comes from the JSON descriptor file (`mcp.json`).

mod file_config;
mod loader;
mod mcp_json;
mod settings;

pub use file_config::{
    DEFAULT_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_MCP_CONFIG_PATH, DEFAULT_MODEL, FileConfig,
};
pub use loader::SettingsLoader;
pub use mcp_json::{load_mcp_server, parse_mcp_servers};
pub use settings::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, GeminiSettings, McpServerSettings,
    McpTransportSettings, Settings, SettingsError, SettingsOverrides, SseSettings, StdioSettings,
    redact,
};

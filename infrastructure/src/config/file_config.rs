//! Raw configuration data
//!
//! One flat record shared by every source: TOML files use the lowercase key
//! (`gemini_model = "..."`), the environment uses the uppercase variable
//! (`GEMINI_MODEL=...`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_MCP_CONFIG_PATH: &str = "mcp.json";

/// Environment variables read into [`FileConfig`].
pub const ENV_KEYS: &[&str] = &[
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_SYSTEM_INSTRUCTION",
    "GEMINI_BASE_URL",
    "LOG_LEVEL",
    "LOG_FILE",
    "MCP_CONFIG_PATH",
    "MCP_SERVER",
];

/// Raw settings before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_system_instruction: Option<String>,
    /// API root, overridable for proxies and tests
    pub gemini_base_url: String,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub mcp_config_path: PathBuf,
    /// Server to pick from the MCP descriptor file
    pub mcp_server: Option<String>,
    /// REPL history file; defaults under the platform data dir
    pub history_file: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_system_instruction: None,
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            mcp_config_path: PathBuf::from(DEFAULT_MCP_CONFIG_PATH),
            mcp_server: None,
            history_file: None,
        }
    }
}

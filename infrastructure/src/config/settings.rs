//! Validated settings
//!
//! [`Settings::resolve`] turns a raw [`FileConfig`] plus command-line
//! overrides into the settings the adapters are built from.

use super::file_config::FileConfig;
use super::mcp_json::load_mcp_server;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors raised while resolving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid setting '{field}': {message}")]
    Validation { field: String, message: String },
}

impl SettingsError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SettingsError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Command-line overrides, applied on top of every other source
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub mcp_config_path: Option<PathBuf>,
    pub mcp_server: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Skip the MCP descriptor entirely
    pub no_tools: bool,
}

/// Gemini connection settings
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("system_instruction", &self.system_instruction)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Child-process MCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioSettings {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// HTTP server-sent-events MCP server
#[derive(Debug, Clone, PartialEq)]
pub struct SseSettings {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
    pub read_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum McpTransportSettings {
    Stdio(StdioSettings),
    Sse(SseSettings),
}

impl McpTransportSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            McpTransportSettings::Stdio(_) => "stdio",
            McpTransportSettings::Sse(_) => "sse",
        }
    }
}

/// The MCP server selected from the descriptor file
#[derive(Debug, Clone, PartialEq)]
pub struct McpServerSettings {
    pub name: String,
    pub transport: McpTransportSettings,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini: GeminiSettings,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub mcp_config_path: PathBuf,
    /// `None` when no tool server is configured
    pub mcp_server: Option<McpServerSettings>,
    pub history_file: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: &SettingsOverrides) -> Result<Self, SettingsError> {
        let api_key = file
            .gemini_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingApiKey)?;

        let model = overrides.model.clone().unwrap_or(file.gemini_model);
        if model.trim().is_empty() {
            return Err(SettingsError::validation(
                "GEMINI_MODEL",
                "model name cannot be empty",
            ));
        }

        let mcp_config_path = overrides
            .mcp_config_path
            .clone()
            .unwrap_or(file.mcp_config_path);
        let selection = overrides.mcp_server.clone().or(file.mcp_server);

        let mcp_server = if overrides.no_tools {
            None
        } else {
            load_mcp_server(&mcp_config_path, selection.as_deref())?
        };

        Ok(Self {
            gemini: GeminiSettings {
                api_key,
                model,
                system_instruction: file
                    .gemini_system_instruction
                    .filter(|instruction| !instruction.trim().is_empty()),
                base_url: file.gemini_base_url.trim_end_matches('/').to_string(),
            },
            log_level: file.log_level,
            log_file: overrides.log_file.clone().or(file.log_file),
            mcp_config_path,
            mcp_server,
            history_file: file.history_file,
        })
    }
}

/// Mask a secret for display, keeping a short prefix.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_config(dir: &tempfile::TempDir) -> FileConfig {
        FileConfig {
            gemini_api_key: Some("AIzaSyExampleKey123".to_string()),
            mcp_config_path: dir.path().join("mcp.json"),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_missing_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = file_config(&dir);
        file.gemini_api_key = Some("   ".to_string());

        let err = Settings::resolve(file, &SettingsOverrides::default()).unwrap_err();
        assert!(matches!(err, SettingsError::MissingApiKey));
    }

    #[test]
    fn test_defaults_without_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            Settings::resolve(file_config(&dir), &SettingsOverrides::default()).unwrap();

        assert_eq!(settings.gemini.model, "models/gemini-1.5-flash");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.mcp_server.is_none());
        assert!(settings.gemini.system_instruction.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("mcp.json"),
            r#"{"mcpServers": {"a": {"command": "a"}, "b": {"command": "b"}}}"#,
        )
        .unwrap();

        let overrides = SettingsOverrides {
            model: Some("models/gemini-2.0-flash".to_string()),
            mcp_server: Some("b".to_string()),
            ..SettingsOverrides::default()
        };
        let settings = Settings::resolve(file_config(&dir), &overrides).unwrap();

        assert_eq!(settings.gemini.model, "models/gemini-2.0-flash");
        assert_eq!(settings.mcp_server.unwrap().name, "b");
    }

    #[test]
    fn test_no_tools_skips_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mcp.json"), "not json").unwrap();

        let overrides = SettingsOverrides {
            no_tools: true,
            ..SettingsOverrides::default()
        };
        let settings = Settings::resolve(file_config(&dir), &overrides).unwrap();
        assert!(settings.mcp_server.is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            Settings::resolve(file_config(&dir), &SettingsOverrides::default()).unwrap();
        let debug = format!("{:?}", settings.gemini);

        assert!(!debug.contains("AIzaSyExampleKey123"));
        assert!(debug.contains("AIza****"));
        assert_eq!(redact("short"), "****");
    }
}

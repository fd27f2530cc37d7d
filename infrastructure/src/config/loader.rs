//! Settings loader with multi-source merging

use super::file_config::{ENV_KEYS, FileConfig};
use super::settings::{Settings, SettingsError, SettingsOverrides};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PROJECT_CONFIG_FILES: &[&str] = &["mcp-chat.toml", ".mcp-chat.toml"];

/// Loader that handles `.env`, file discovery and merging
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Command-line overrides
    /// 2. Environment variables (including those from `.env`)
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./mcp-chat.toml` or `./.mcp-chat.toml`
    /// 5. Global: `~/.config/mcp-chat/config.toml`
    /// 6. Default values
    pub fn load(
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Settings, SettingsError> {
        Self::load_dotenv();
        let file = Self::extract(Self::figment(config_path))?;
        Settings::resolve(file, overrides)
    }

    /// Populate the process environment from `.env`, if present.
    ///
    /// Variables already set in the environment are not overwritten.
    pub fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Ignoring unreadable .env file: {}", e),
        }
    }

    /// Build the merged provider chain.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Self::file_figment(config_path);
        figment = figment.merge(Env::raw().only(ENV_KEYS));
        figment
    }

    /// Defaults and TOML files only.
    fn file_figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    pub fn extract(figment: Figment) -> Result<FileConfig, SettingsError> {
        figment.extract().map_err(|e| SettingsError::Figment(Box::new(e)))
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mcp-chat").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Command-line flags");
        println!("  [     ] Environment: {}", ENV_KEYS.join(", "));

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:^5}] Explicit: {}", mark, path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./mcp-chat.toml or ./.mcp-chat.toml"),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", mark, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_path_returns_some() {
        let path = SettingsLoader::global_config_path().unwrap();
        assert!(path.ends_with("mcp-chat/config.toml"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "gemini_api_key = \"from-file\"\nlog_level = \"DEBUG\"\n",
        )
        .unwrap();

        let config = SettingsLoader::extract(SettingsLoader::file_figment(Some(&path))).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.gemini_model, "models/gemini-1.5-flash");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "log_level = [1, 2]\n").unwrap();

        let err = SettingsLoader::extract(SettingsLoader::file_figment(Some(&path))).unwrap_err();
        assert!(matches!(err, SettingsError::Figment(_)));
    }
}

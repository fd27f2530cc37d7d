//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for mcp-chat
#[derive(Parser, Debug)]
#[command(name = "mcp-chat")]
#[command(author, version, about = "Chat with Gemini, backed by an MCP tool server")]
#[command(long_about = r#"
mcp-chat sends each message to Gemini. When the connected MCP server offers
a tool that helps, the model may call exactly one tool and then answer from
its result.

Settings are read from (lowest to highest priority):
1. Built-in defaults
2. ~/.config/mcp-chat/config.toml      Global config
3. ./mcp-chat.toml                     Project config
4. --config <path>                     Explicit config file
5. Environment variables (and .env)    GEMINI_API_KEY, GEMINI_MODEL, ...
6. Command-line flags

The MCP server is taken from mcp.json (see --mcp-config and --server).

Example:
  mcp-chat "How many users signed up last week?"
  mcp-chat --server sqlite
  mcp-chat --no-tools -m models/gemini-2.0-flash
"#)]
pub struct Cli {
    /// Send one message and exit (interactive chat when omitted)
    pub message: Option<String>,

    /// Gemini model, e.g. models/gemini-1.5-flash
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Path to the MCP server descriptor (default: mcp.json)
    #[arg(long, value_name = "PATH")]
    pub mcp_config: Option<PathBuf>,

    /// Name of the server to use from the descriptor
    #[arg(short, long, value_name = "NAME")]
    pub server: Option<String>,

    /// Chat without connecting to any MCP server
    #[arg(long)]
    pub no_tools: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show configuration sources and resolved settings, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Write the operation log to this file (default: mcp-chat.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Record a JSONL transcript of each turn
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_one_shot_with_overrides() {
        let cli = Cli::parse_from([
            "mcp-chat",
            "--server",
            "sqlite",
            "-m",
            "models/gemini-2.0-flash",
            "-vv",
            "How many rows?",
        ]);

        assert_eq!(cli.message.as_deref(), Some("How many rows?"));
        assert_eq!(cli.server.as_deref(), Some("sqlite"));
        assert_eq!(cli.model.as_deref(), Some("models/gemini-2.0-flash"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.no_tools);
    }

    #[test]
    fn test_interactive_defaults() {
        let cli = Cli::parse_from(["mcp-chat", "--no-tools", "-q"]);
        assert!(cli.message.is_none());
        assert!(cli.no_tools);
        assert!(cli.quiet);
        assert!(cli.config.is_none());
    }
}

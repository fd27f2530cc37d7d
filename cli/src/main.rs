//! CLI entrypoint for mcp-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use mcp_chat_application::{ChatOrchestrator, ToolTransport};
use mcp_chat_infrastructure::config::{McpTransportSettings, redact};
use mcp_chat_infrastructure::{
    GeminiClient, JsonlConversationLogger, McpClient, Settings, SettingsLoader, SettingsOverrides,
};
use mcp_chat_presentation::chat::default_history_path;
use mcp_chat_presentation::{ChatRepl, Cli, ConsoleFormatter, ProgressReporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILE: &str = "mcp-chat.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = SettingsOverrides {
        model: cli.model.clone(),
        mcp_config_path: cli.mcp_config.clone(),
        mcp_server: cli.server.clone(),
        log_file: cli.log_file.clone(),
        no_tools: cli.no_tools,
    };

    if cli.show_config {
        SettingsLoader::print_config_sources(cli.config.as_deref());
        println!();
        match SettingsLoader::load(cli.config.as_deref(), &overrides) {
            Ok(settings) => print_settings(&settings),
            Err(e) => println!("Settings could not be resolved: {}", e),
        }
        return Ok(());
    }

    let settings = SettingsLoader::load(cli.config.as_deref(), &overrides)
        .context("Failed to load settings")?;
    let _log_guard = init_logging(&cli, &settings)?;

    info!("Starting mcp-chat");

    // === Dependency Injection ===
    let gateway = Arc::new(GeminiClient::new(settings.gemini.clone())?);
    let tool_transport = settings
        .mcp_server
        .clone()
        .map(|server| Arc::new(McpClient::new(server)) as Arc<dyn ToolTransport>);

    let mut orchestrator = ChatOrchestrator::start(gateway, tool_transport).await;
    if !cli.quiet {
        orchestrator = orchestrator.with_progress(Arc::new(ProgressReporter::new()));
    }
    if let Some(path) = &cli.conversation_log {
        match JsonlConversationLogger::open(path) {
            Ok(logger) => {
                info!("Recording conversation to {}", logger.path().display());
                orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
            }
            Err(e) => warn!("Could not open conversation log {}: {}", path.display(), e),
        }
    }

    let server_name = settings.mcp_server.as_ref().map(|server| server.name.clone());
    if let Some(name) = &server_name
        && !orchestrator.is_tool_connected()
    {
        eprintln!(
            "{}",
            ConsoleFormatter::warning(&format!(
                "Could not connect to MCP server '{}'; continuing without tools.",
                name
            ))
        );
    }

    let mut orchestrator = match cli.message {
        Some(message) => {
            let answer = orchestrator.handle_message(&message).await;
            println!("{}", answer);
            orchestrator
        }
        None => {
            let history_path = settings.history_file.clone().or_else(default_history_path);
            let mut repl = ChatRepl::new(orchestrator, settings.gemini.model.clone())
                .with_server(server_name)
                .with_history_path(history_path);
            let outcome = repl.run().await;
            let mut orchestrator = repl.into_orchestrator();
            if let Err(e) = outcome {
                orchestrator.shutdown().await;
                return Err(anyhow::Error::new(e).context("Line editor failed"));
            }
            orchestrator
        }
    };

    orchestrator.shutdown().await;
    info!("mcp-chat finished");
    Ok(())
}

/// Map a `LOG_LEVEL` value (`INFO`, `WARNING`, ...) to a tracing level.
fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        _ => "info",
    }
}

/// File layer always; stderr layer only with `-v`.
fn init_logging(cli: &Cli, settings: &Settings) -> Result<WorkerGuard> {
    let level = match cli.verbose {
        0 => level_directive(&settings.log_level),
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let directives = format!("{},reqwest=warn,hyper=warn,hyper_util=warn", level);

    let path = settings
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let stderr_layer = (cli.verbose > 0).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new(&directives))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(&directives)),
        )
        .with(stderr_layer)
        .init();

    Ok(guard)
}

fn print_settings(settings: &Settings) {
    println!("Resolved settings:");
    println!("  GEMINI_API_KEY            {}", redact(&settings.gemini.api_key));
    println!("  GEMINI_MODEL              {}", settings.gemini.model);
    println!("  GEMINI_BASE_URL           {}", settings.gemini.base_url);
    println!(
        "  GEMINI_SYSTEM_INSTRUCTION {}",
        settings.gemini.system_instruction.as_deref().unwrap_or("(none)")
    );
    println!("  LOG_LEVEL                 {}", settings.log_level);
    println!(
        "  LOG_FILE                  {}",
        settings
            .log_file
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_LOG_FILE))
            .display()
    );
    println!("  MCP_CONFIG_PATH           {}", settings.mcp_config_path.display());

    match &settings.mcp_server {
        None => println!("  MCP server                (none)"),
        Some(server) => match &server.transport {
            McpTransportSettings::Stdio(stdio) => {
                println!(
                    "  MCP server                {} (stdio): {} {}",
                    server.name,
                    stdio.command,
                    stdio.args.join(" ")
                );
                for key in stdio.env.keys() {
                    println!("    env {}=****", key);
                }
            }
            McpTransportSettings::Sse(sse) => {
                println!(
                    "  MCP server                {} (sse): {} (timeout {:?}, read timeout {:?})",
                    server.name, sse.url, sse.timeout, sse.read_timeout
                );
                for key in sse.headers.keys() {
                    println!("    header {}: ****", key);
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive(" critical "), "error");
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("verbose"), "info");
    }
}

//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::output::console::{ConsoleFormatter, SessionInfo};
use mcp_chat_application::ChatOrchestrator;
use mcp_chat_domain::ErrorReport;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Tools,
    Refresh,
    Reset,
    History,
    Status,
    Quit,
    Unknown,
}

impl ReplCommand {
    /// Parse a slash command; `None` for ordinary chat input.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().split_whitespace().next()?;
        if !word.starts_with('/') {
            return None;
        }
        Some(match word {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/tools" => ReplCommand::Tools,
            "/refresh" => ReplCommand::Refresh,
            "/reset" | "/clear" => ReplCommand::Reset,
            "/history" => ReplCommand::History,
            "/status" => ReplCommand::Status,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown,
        })
    }
}

/// Default line-editor history: `<data dir>/mcp-chat/history.txt`
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("mcp-chat").join("history.txt"))
}

/// Interactive chat REPL
pub struct ChatRepl {
    orchestrator: ChatOrchestrator,
    model: String,
    server: Option<String>,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(orchestrator: ChatOrchestrator, model: impl Into<String>) -> Self {
        Self {
            orchestrator,
            model: model.into(),
            server: None,
            history_path: default_history_path(),
        }
    }

    /// Name of the configured MCP server, for the header and `/status`
    pub fn with_server(mut self, server: Option<String>) -> Self {
        self.server = server;
        self
    }

    /// Override the line-editor history file (`None` keeps history in memory)
    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Give the orchestrator back, e.g. for shutdown.
    pub fn into_orchestrator(self) -> ChatOrchestrator {
        self.orchestrator
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_path else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Could not open history file {}: {}", path.display(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("mcp-chat".to_string()),
            DefaultPromptSegment::Empty,
        );

        println!("{}", ConsoleFormatter::welcome(&self.session_info()));

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(buffer) => {
                    let line = buffer.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command, line).await {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn session_info(&self) -> SessionInfo<'_> {
        SessionInfo {
            model: &self.model,
            server: self.server.as_deref(),
            connected: self.orchestrator.is_tool_connected(),
            tool_count: self.orchestrator.tools().len(),
            history_len: self.orchestrator.history().len(),
        }
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, command: ReplCommand, line: &str) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => println!("\n{}", ConsoleFormatter::help()),
            ReplCommand::Tools => {
                println!("\n{}", ConsoleFormatter::tools(self.orchestrator.tools()))
            }
            ReplCommand::Refresh => match self.orchestrator.refresh_tools().await {
                Ok(catalog) => println!("\n{}", ConsoleFormatter::tools(catalog)),
                Err(e) => {
                    let report = ErrorReport::new(e.kind(), &e, Some("refresh_tools"));
                    warn!("{}", report.log_message);
                    println!("{}\n", ConsoleFormatter::warning(&report.user_message));
                }
            },
            ReplCommand::Reset => {
                self.orchestrator.reset_conversation();
                println!("{}\n", ConsoleFormatter::notice("Conversation history cleared."));
            }
            ReplCommand::History => {
                println!("\n{}", ConsoleFormatter::history(&self.orchestrator.history()))
            }
            ReplCommand::Status => {
                println!("\n{}", ConsoleFormatter::status(&self.session_info()))
            }
            ReplCommand::Unknown => {
                println!("Unknown command: {}", line);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn process_message(&self, message: &str) {
        println!();
        let answer = self.orchestrator.handle_message(message).await;
        println!("{}", ConsoleFormatter::answer(&answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcp_chat_application::{GatewayError, ModelGateway, ModelRequest};
    use mcp_chat_domain::{Conversation, Message};
    use std::sync::{Arc, Mutex};

    /// Gateway that echoes the prompt and keeps history
    struct EchoGateway {
        history: Mutex<Conversation>,
    }

    #[async_trait]
    impl ModelGateway for EchoGateway {
        async fn send(&self, request: ModelRequest) -> Result<String, GatewayError> {
            let reply = format!("echo: {}", request.prompt);
            self.history
                .lock()
                .unwrap()
                .push_exchange(request.prompt, reply.clone());
            Ok(reply)
        }

        fn history(&self) -> Vec<Message> {
            self.history.lock().unwrap().messages().to_vec()
        }

        fn reset_history(&self) {
            self.history.lock().unwrap().clear();
        }
    }

    async fn repl() -> ChatRepl {
        let gateway = Arc::new(EchoGateway {
            history: Mutex::new(Conversation::new()),
        });
        let orchestrator = ChatOrchestrator::start(gateway, None).await;
        ChatRepl::new(orchestrator, "models/gemini-1.5-flash").with_history_path(None)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("/help"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse("  /q  "), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("/refresh now"), Some(ReplCommand::Refresh));
        assert_eq!(ReplCommand::parse("/nope"), Some(ReplCommand::Unknown));
        assert_eq!(ReplCommand::parse("what is /tools?"), None);
        assert_eq!(ReplCommand::parse("   "), None);
    }

    #[tokio::test]
    async fn test_quit_ends_loop() {
        let mut repl = repl().await;
        assert!(repl.handle_command(ReplCommand::Quit, "/quit").await);
        assert!(!repl.handle_command(ReplCommand::Status, "/status").await);
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let mut repl = repl().await;
        repl.process_message("hello").await;
        assert_eq!(repl.orchestrator.history().len(), 2);

        repl.handle_command(ReplCommand::Reset, "/reset").await;
        assert!(repl.orchestrator.history().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_without_server_keeps_running() {
        let mut repl = repl().await;
        assert!(!repl.handle_command(ReplCommand::Refresh, "/refresh").await);
        assert!(repl.orchestrator.tools().is_empty());
        assert!(!repl.session_info().connected);
    }
}

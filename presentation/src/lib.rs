//! Presentation layer for mcp-chat
//!
//! This crate contains the CLI definition, console output,
//! the progress spinner, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand};
pub use cli::commands::Cli;
pub use output::console::{ConsoleFormatter, SessionInfo};
pub use progress::reporter::ProgressReporter;

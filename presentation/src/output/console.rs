//! Console output for chat sessions

use colored::Colorize;
use mcp_chat_domain::{Message, Role, ToolCatalog};

/// What the header and `/status` show about the session
#[derive(Debug, Clone)]
pub struct SessionInfo<'a> {
    pub model: &'a str,
    /// Configured MCP server name, if any
    pub server: Option<&'a str>,
    pub connected: bool,
    pub tool_count: usize,
    pub history_len: usize,
}

/// Formats chat output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn welcome(info: &SessionInfo<'_>) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(&Self::header("mcp-chat"));
        output.push_str("\n\n");
        output.push_str(&Self::status(info));
        output.push('\n');
        output.push_str(&Self::help());
        output
    }

    pub fn status(info: &SessionInfo<'_>) -> String {
        let server = match (info.server, info.connected) {
            (None, _) => "none".dimmed().to_string(),
            (Some(name), true) => format!("{} {}", name, "(connected)".green()),
            (Some(name), false) => format!("{} {}", name, "(not connected)".red()),
        };

        format!(
            "{} {}\n{} {}\n{} {}\n{} {}\n",
            "Model:".cyan().bold(),
            info.model,
            "MCP server:".cyan().bold(),
            server,
            "Tools:".cyan().bold(),
            info.tool_count,
            "History:".cyan().bold(),
            format!("{} message(s)", info.history_len)
        )
    }

    pub fn help() -> String {
        let commands = [
            ("/help, /h, /?", "Show this help"),
            ("/tools", "List the MCP tools"),
            ("/refresh", "Re-fetch the tool list from the server"),
            ("/reset", "Forget the conversation history"),
            ("/history", "Show the conversation history"),
            ("/status", "Show model and server status"),
            ("/quit, /exit, /q", "Exit chat"),
        ];

        let mut output = format!("{}\n", "Commands:".bold());
        for (command, description) in commands {
            output.push_str(&format!("  {:<18} - {}\n", command, description));
        }
        output
    }

    pub fn tools(catalog: &ToolCatalog) -> String {
        if catalog.is_empty() {
            return format!("{}\n", "No MCP tools available.".dimmed());
        }

        let mut output = format!("{} ({})\n", "Available tools".cyan().bold(), catalog.len());
        for tool in catalog.iter() {
            let description = if tool.description.is_empty() {
                "No description provided".dimmed().to_string()
            } else {
                tool.description.clone()
            };
            output.push_str(&format!("  {} {}\n", tool.name.yellow().bold(), description));
        }
        output
    }

    pub fn history(messages: &[Message]) -> String {
        if messages.is_empty() {
            return format!("{}\n", "No conversation yet.".dimmed());
        }

        let mut output = String::new();
        for message in messages {
            let label = match message.role {
                Role::User => "You:".green().bold(),
                Role::Model => "Gemini:".blue().bold(),
            };
            output.push_str(&format!("{}\n{}\n\n", label, Self::indent(&message.content, "  ")));
        }
        output
    }

    pub fn answer(text: &str) -> String {
        format!("{}\n{}\n", "Gemini:".blue().bold(), text)
    }

    pub fn notice(text: &str) -> String {
        format!("{} {}", "->".cyan(), text)
    }

    pub fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow().bold(), text)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(50);
        format!("{}\n{:^50}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_chat_domain::ToolDescriptor;

    fn info(server: Option<&str>, connected: bool) -> SessionInfo<'_> {
        SessionInfo {
            model: "models/gemini-1.5-flash",
            server,
            connected,
            tool_count: 2,
            history_len: 4,
        }
    }

    #[test]
    fn test_status_lines() {
        let text = ConsoleFormatter::status(&info(Some("sqlite"), true));
        assert!(text.contains("models/gemini-1.5-flash"));
        assert!(text.contains("sqlite"));
        assert!(text.contains("(connected)"));
        assert!(text.contains("4 message(s)"));

        let text = ConsoleFormatter::status(&info(Some("sqlite"), false));
        assert!(text.contains("(not connected)"));
    }

    #[test]
    fn test_tools_listing() {
        let catalog = ToolCatalog::new(vec![
            ToolDescriptor::new("execute_sql", "Run a query"),
            ToolDescriptor::new("list_tables", ""),
        ]);
        let text = ConsoleFormatter::tools(&catalog);
        assert!(text.contains("execute_sql"));
        assert!(text.contains("Run a query"));
        assert!(text.contains("No description provided"));

        assert!(ConsoleFormatter::tools(&ToolCatalog::default()).contains("No MCP tools"));
    }

    #[test]
    fn test_history_indents_content() {
        let text = ConsoleFormatter::history(&[
            Message::user("hi"),
            Message::model("line one\nline two"),
        ]);
        assert!(text.contains("  line one\n  line two"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = ConsoleFormatter::help();
        for command in ["/tools", "/refresh", "/reset", "/history", "/status", "/quit"] {
            assert!(help.contains(command), "missing {}", command);
        }
    }
}

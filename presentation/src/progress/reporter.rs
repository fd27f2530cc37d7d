//! Progress reporting while a message is handled

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mcp_chat_application::ports::progress::ChatProgressNotifier;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner on stderr, one per handled message
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Show `message`, starting the spinner if none is running.
    fn set_message(&self, message: String) {
        let mut spinner = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match spinner.as_ref() {
            Some(bar) => bar.set_message(message),
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(Self::spinner_style());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar.set_message(message);
                *spinner = Some(bar);
            }
        }
    }

    fn println(&self, line: String) {
        match self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(bar) => bar.println(line),
            None => eprintln!("{}", line),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProgressNotifier for ProgressReporter {
    fn on_planning_start(&self) {
        self.set_message("Deciding whether a tool is needed...".to_string());
    }

    fn on_tool_call_start(&self, tool: &str) {
        self.set_message(format!("Calling {}...", tool.yellow()));
    }

    fn on_tool_call_complete(&self, tool: &str, is_error: bool) {
        if is_error {
            self.println(format!("  {} {} (reported an error)", "x".red(), tool));
        } else {
            self.println(format!("  {} {}", "v".green(), tool));
        }
    }

    fn on_synthesis_start(&self, tool: &str) {
        self.set_message(format!("Summarizing {} result...", tool));
    }

    fn on_answer_start(&self) {
        self.set_message("Thinking...".to_string());
    }

    fn on_complete(&self) {
        if let Some(bar) = self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            bar.finish_and_clear();
        }
    }
}

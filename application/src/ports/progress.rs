//! Progress notification port
//!
//! Defines the hooks fired while a message is being handled.

/// Callback for progress updates during message handling
///
/// Implementations live in the presentation layer (spinner, plain log).
pub trait ChatProgressNotifier: Send + Sync {
    /// The planning request was sent.
    fn on_planning_start(&self) {}

    fn on_tool_call_start(&self, _tool: &str) {}

    fn on_tool_call_complete(&self, _tool: &str, _is_error: bool) {}

    /// The tool output is being turned into a final answer.
    fn on_synthesis_start(&self, _tool: &str) {}

    /// A direct (non-tool) answer was requested.
    fn on_answer_start(&self) {}

    /// Called once per message, whatever the outcome.
    fn on_complete(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoChatProgress;

impl ChatProgressNotifier for NoChatProgress {}

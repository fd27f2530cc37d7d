//! Port for structured conversation logging.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! while this port records what happened in each turn (plan, tool call,
//! tool result, answer) as machine-readable events.

use serde_json::Value;

/// The steps of a turn that are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Raw planning JSON from the model
    PlanReceived,
    /// The plan failed validation; the turn fell through
    PlanRejected,
    ToolCall,
    ToolResult,
    /// Synthesis failed; raw tool output was returned instead
    SynthesisFailed,
    /// The text shown to the user
    Answer,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlanReceived => "plan_received",
            EventKind::PlanRejected => "plan_rejected",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::SynthesisFailed => "synthesis_failed",
            EventKind::Answer => "answer",
        }
    }
}

/// One recorded step with its event-specific fields
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// `log` never fails: implementations swallow write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Logger used when no transcript was requested
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

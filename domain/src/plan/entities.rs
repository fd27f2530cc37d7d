//! Plan entities: the structured decision produced by the planning step.

use serde_json::{Map, Value};
use thiserror::Error;

/// Arguments proposed for a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanArguments {
    /// The plan had no `arguments` key (or it was `null`)
    Absent,
    /// A JSON object to pass to the tool as-is
    Provided(Map<String, Value>),
    /// Present but not an object; ignored and treated as absent
    Discarded(Value),
}

impl PlanArguments {
    /// The arguments to send, if any.
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            PlanArguments::Provided(map) => Some(map),
            PlanArguments::Absent | PlanArguments::Discarded(_) => None,
        }
    }

    pub fn into_map(self) -> Option<Map<String, Value>> {
        match self {
            PlanArguments::Provided(map) => Some(map),
            PlanArguments::Absent | PlanArguments::Discarded(_) => None,
        }
    }

    /// JSON rendering used in the synthesis prompt (`{}` when none).
    pub fn to_json_string(&self) -> String {
        match self.as_map() {
            Some(map) => Value::Object(map.clone()).to_string(),
            None => "{}".to_string(),
        }
    }
}

/// What the model decided to do with a user message.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Answer directly; no tool needed
    Respond { message: String },
    /// Call exactly one tool, then synthesize
    CallTool {
        tool: String,
        arguments: PlanArguments,
    },
}

/// Why a planning response could not be used.
///
/// Every rejection means "no tool usable"; none of them is surfaced to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanRejection {
    #[error("plan is not a JSON object: {0}")]
    NotAnObject(Value),

    #[error("respond plan has no usable message")]
    EmptyMessage,

    #[error("unknown plan action: {0}")]
    UnknownAction(Value),

    #[error("call_tool plan has no tool name")]
    MissingTool,

    #[error("tool '{0}' is not among the available tools")]
    UnknownTool(String),
}

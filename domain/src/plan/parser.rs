//! Plan parsing from the structured (JSON-mode) planning response.
//!
//! Accepted shapes:
//!
//! ```json
//! {"action": "respond", "message": "<answer>"}
//! {"action": "call_tool", "tool": "<name>", "arguments": { ... }}
//! ```
//!
//! Anything else becomes a [`PlanRejection`].

use super::entities::{Plan, PlanArguments, PlanRejection};
use crate::tool::entities::ToolCatalog;
use serde_json::Value;

/// Parse a planning response and check it against the known tools.
///
/// A `respond` plan is accepted regardless of the catalog. A `call_tool`
/// plan must name a tool that is present in `catalog`.
pub fn parse_plan(value: &Value, catalog: &ToolCatalog) -> Result<Plan, PlanRejection> {
    let Some(object) = value.as_object() else {
        return Err(PlanRejection::NotAnObject(value.clone()));
    };

    match object.get("action").and_then(Value::as_str) {
        Some("respond") => match object.get("message").and_then(Value::as_str) {
            Some(message) if !message.trim().is_empty() => Ok(Plan::Respond {
                message: message.to_string(),
            }),
            _ => Err(PlanRejection::EmptyMessage),
        },
        Some("call_tool") => {
            let tool = match object.get("tool").and_then(Value::as_str) {
                Some(tool) if !tool.is_empty() => tool,
                _ => return Err(PlanRejection::MissingTool),
            };
            if !catalog.contains(tool) {
                return Err(PlanRejection::UnknownTool(tool.to_string()));
            }

            let arguments = match object.get("arguments") {
                None | Some(Value::Null) => PlanArguments::Absent,
                Some(Value::Object(map)) => PlanArguments::Provided(map.clone()),
                Some(other) => PlanArguments::Discarded(other.clone()),
            };

            Ok(Plan::CallTool {
                tool: tool.to_string(),
                arguments,
            })
        }
        _ => Err(PlanRejection::UnknownAction(
            object.get("action").cloned().unwrap_or(Value::Null),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolDescriptor;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(vec![ToolDescriptor::new("execute_sql", "Run SQL")])
    }

    #[test]
    fn test_parse_respond() {
        let plan = parse_plan(&json!({"action": "respond", "message": "Hi!"}), &catalog()).unwrap();
        assert_eq!(
            plan,
            Plan::Respond {
                message: "Hi!".to_string()
            }
        );
    }

    #[test]
    fn test_respond_with_blank_message_is_rejected() {
        let err = parse_plan(&json!({"action": "respond", "message": "   "}), &catalog());
        assert_eq!(err, Err(PlanRejection::EmptyMessage));

        let err = parse_plan(&json!({"action": "respond", "message": 7}), &catalog());
        assert_eq!(err, Err(PlanRejection::EmptyMessage));
    }

    #[test]
    fn test_parse_call_tool_with_arguments() {
        let plan = parse_plan(
            &json!({
                "action": "call_tool",
                "tool": "execute_sql",
                "arguments": {"sql": "SELECT 1"}
            }),
            &catalog(),
        )
        .unwrap();

        match plan {
            Plan::CallTool { tool, arguments } => {
                assert_eq!(tool, "execute_sql");
                assert_eq!(arguments.as_map().unwrap()["sql"], "SELECT 1");
                assert_eq!(arguments.to_json_string(), r#"{"sql":"SELECT 1"}"#);
            }
            other => panic!("Expected CallTool, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_arguments_are_discarded() {
        let plan = parse_plan(
            &json!({"action": "call_tool", "tool": "execute_sql", "arguments": "SELECT 1"}),
            &catalog(),
        )
        .unwrap();

        match plan {
            Plan::CallTool { arguments, .. } => {
                assert_eq!(arguments, PlanArguments::Discarded(json!("SELECT 1")));
                assert!(arguments.as_map().is_none());
                assert_eq!(arguments.to_json_string(), "{}");
            }
            other => panic!("Expected CallTool, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_arguments_are_absent() {
        let plan = parse_plan(
            &json!({"action": "call_tool", "tool": "execute_sql", "arguments": null}),
            &catalog(),
        )
        .unwrap();
        assert!(matches!(
            plan,
            Plan::CallTool {
                arguments: PlanArguments::Absent,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        let err = parse_plan(
            &json!({"action": "call_tool", "tool": "drop_database"}),
            &catalog(),
        );
        assert_eq!(
            err,
            Err(PlanRejection::UnknownTool("drop_database".to_string()))
        );
    }

    #[test]
    fn test_missing_or_invalid_tool_name() {
        for plan in [
            json!({"action": "call_tool"}),
            json!({"action": "call_tool", "tool": ""}),
            json!({"action": "call_tool", "tool": 42}),
        ] {
            assert_eq!(
                parse_plan(&plan, &catalog()),
                Err(PlanRejection::MissingTool)
            );
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = parse_plan(&json!({"action": "dance"}), &catalog());
        assert_eq!(err, Err(PlanRejection::UnknownAction(json!("dance"))));

        let err = parse_plan(&json!({"message": "no action"}), &catalog());
        assert_eq!(err, Err(PlanRejection::UnknownAction(Value::Null)));
    }

    #[test]
    fn test_non_object_plan() {
        let err = parse_plan(&json!(["respond"]), &catalog());
        assert!(matches!(err, Err(PlanRejection::NotAnObject(_))));
    }
}

//! Prompt templates for the chat flow

use crate::tool::entities::ToolCatalog;

/// Line shown in the planning prompt when the server exposes no tools.
const NO_TOOLS_LINE: &str = "(no MCP tools are available)";

/// Description used for tools that did not provide one.
const NO_DESCRIPTION: &str = "No description provided";

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// One `- name: description` line per tool.
    pub fn tool_summary(catalog: &ToolCatalog) -> String {
        if catalog.is_empty() {
            return NO_TOOLS_LINE.to_string();
        }

        catalog
            .iter()
            .map(|tool| {
                let description = if tool.description.trim().is_empty() {
                    NO_DESCRIPTION
                } else {
                    tool.description.as_str()
                };
                format!("- {}: {}", tool.name, description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Planning prompt: asks for one of two strict JSON shapes.
    pub fn tool_decision(user_message: &str, catalog: &ToolCatalog) -> String {
        format!(
            r#"You are an assistant that supports the Model Context Protocol.
You may use at most ONE of the MCP tools below before answering the user's request.
If no tool is needed, answer without using one.

Available tools:
{}

You must reply in exactly one of these JSON formats:
- No tool needed: {{"action": "respond", "message": "<answer>"}}
- Use a tool: {{"action": "call_tool", "tool": "<tool name>", "arguments": {{ ... }}}}
When running SQL, choose `execute_sql` and put the query under the `sql` key of arguments.
Do not include any text or explanation outside the JSON.

User request:
{}
"#,
            Self::tool_summary(catalog),
            user_message
        )
    }

    /// Synthesis prompt: turns a tool result into the final answer.
    pub fn synthesis(
        user_message: &str,
        tool_name: &str,
        arguments_json: &str,
        tool_output: &str,
    ) -> String {
        format!(
            r#"Below are a user's question and the result of an MCP tool call.
Using the result, write a final answer that is easy for the user to understand.

[User question]
{}

[Tool used]
{}
[Tool arguments]
{}

[Tool result]
{}
"#,
            user_message, tool_name, arguments_json, tool_output
        )
    }

    /// Prepend auxiliary context to a plain-path message.
    pub fn with_context(message: &str, context: Option<&str>) -> String {
        match context {
            Some(context) if !context.is_empty() => {
                format!("[Context]\n{}\n\n[User Message]\n{}", context, message)
            }
            _ => message.to_string(),
        }
    }

    /// Final answer when the tool reported a logical failure.
    pub fn tool_failure(tool_name: &str, rendered_error: &str) -> String {
        let details = if rendered_error.is_empty() {
            "The tool reported an error."
        } else {
            rendered_error
        };
        format!("Tool {} failed. Details: {}", tool_name, details)
    }

    /// Final answer when synthesis failed but the tool output is in hand.
    pub fn synthesis_fallback(tool_output: &str) -> String {
        const NOTE: &str =
            "The tool returned a result, but the model could not produce a final answer.";
        if tool_output.is_empty() {
            NOTE.to_string()
        } else {
            format!("{} Raw tool output:\n{}", NOTE, tool_output)
        }
    }
}

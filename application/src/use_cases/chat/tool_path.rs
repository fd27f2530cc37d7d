//! Tool-assisted path: plan, call at most one tool, synthesize.
//!
//! Every failure before the tool has produced output yields `None`, and the
//! caller answers the message directly instead.

use super::ChatOrchestrator;
use crate::ports::conversation_logger::{ConversationEvent, EventKind};
use crate::ports::model_gateway::ModelRequest;
use crate::ports::tool_transport::ToolTransport;
use mcp_chat_domain::preview;
use mcp_chat_domain::{ErrorReport, Plan, PlanArguments, PromptTemplate, parse_plan};
use serde_json::json;
use tracing::{debug, info, warn};

impl ChatOrchestrator {
    pub(super) async fn run_tool_path(
        &self,
        transport: &dyn ToolTransport,
        message: &str,
    ) -> Option<String> {
        self.progress.on_planning_start();
        let prompt = PromptTemplate::tool_decision(message, &self.catalog);
        let raw_plan = match self.gateway.send_structured(&prompt).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Planning request failed, answering directly: {}", e);
                return None;
            }
        };
        debug!("Plan: {}", preview(&raw_plan.to_string(), 500));
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::PlanReceived,
            json!({ "plan": raw_plan }),
        ));

        let plan = match parse_plan(&raw_plan, &self.catalog) {
            Ok(plan) => plan,
            Err(rejection) => {
                warn!("Plan rejected, answering directly: {}", rejection);
                self.conversation_logger.log(ConversationEvent::new(
                    EventKind::PlanRejected,
                    json!({ "reason": rejection.to_string() }),
                ));
                return None;
            }
        };

        let (tool, arguments) = match plan {
            Plan::Respond { message } => return Some(message),
            Plan::CallTool { tool, arguments } => (tool, arguments),
        };

        if let PlanArguments::Discarded(value) = &arguments {
            warn!("Ignoring non-object arguments for tool '{}': {}", tool, value);
        }
        let arguments_json = arguments.to_json_string();

        info!("Calling tool '{}' with {}", tool, preview(&arguments_json, 200));
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::ToolCall,
            json!({ "tool": tool, "arguments": arguments.as_map() }),
        ));
        self.progress.on_tool_call_start(&tool);

        let result = match transport.call_tool(&tool, arguments.into_map()).await {
            Ok(result) => result,
            Err(e) => {
                self.progress.on_tool_call_complete(&tool, true);
                let report = ErrorReport::new(e.kind(), &e, Some("call_tool"));
                warn!("{}", report.log_message);
                return None;
            }
        };
        self.progress.on_tool_call_complete(&tool, result.is_error);

        let output = result.render();
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::ToolResult,
            json!({ "tool": tool, "is_error": result.is_error, "output": output }),
        ));

        if result.is_error {
            warn!("Tool '{}' reported an error: {}", tool, preview(&output, 200));
            return Some(PromptTemplate::tool_failure(&tool, &output));
        }

        self.progress.on_synthesis_start(&tool);
        let prompt = PromptTemplate::synthesis(message, &tool, &arguments_json, &output);
        match self
            .gateway
            .send(ModelRequest::new(prompt).without_history())
            .await
        {
            Ok(answer) => Some(answer),
            Err(e) => {
                warn!("Synthesis after tool '{}' failed: {}", tool, e);
                self.conversation_logger.log(ConversationEvent::new(
                    EventKind::SynthesisFailed,
                    json!({ "tool": tool, "error": e.to_string() }),
                ));
                Some(PromptTemplate::synthesis_fallback(&output))
            }
        }
    }
}

//! Chat use case
//!
//! Produces exactly one answer per user message:
//!
//! | Step                       | Runs when                              | On failure                  |
//! |----------------------------|----------------------------------------|-----------------------------|
//! | 1. Context fetch           | tool server connected                  | treated as no context       |
//! | 2. Planning                | connected and at least one tool known  | fall through to step 4      |
//! | 3. Tool call + synthesis   | plan names a known tool                | fall through / raw output   |
//! | 4. Direct answer           | steps 2-3 produced nothing             | error report for the user   |
//!
//! Only step 4 writes to the model's conversation history.

mod tool_path;
mod types;

pub use types::HandleMessageError;

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, EventKind, NoConversationLogger,
};
use crate::ports::model_gateway::{ModelGateway, ModelRequest};
use crate::ports::progress::{ChatProgressNotifier, NoChatProgress};
use crate::ports::tool_transport::{ToolTransport, ToolTransportError};
use mcp_chat_domain::{ErrorReport, Message, ToolCatalog};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Use case for handling chat messages with optional single-tool assistance
pub struct ChatOrchestrator {
    gateway: Arc<dyn ModelGateway>,
    tool_transport: Option<Arc<dyn ToolTransport>>,
    catalog: ToolCatalog,
    progress: Arc<dyn ChatProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ChatOrchestrator {
    /// Build an orchestrator, connecting the tool transport if one is given.
    ///
    /// A transport that fails to connect is disconnected and dropped; the
    /// orchestrator then answers every message directly.
    pub async fn start(
        gateway: Arc<dyn ModelGateway>,
        tool_transport: Option<Arc<dyn ToolTransport>>,
    ) -> Self {
        let mut orchestrator = Self {
            gateway,
            tool_transport: None,
            catalog: ToolCatalog::default(),
            progress: Arc::new(NoChatProgress),
            conversation_logger: Arc::new(NoConversationLogger),
        };

        let Some(transport) = tool_transport else {
            info!("No MCP server configured; tool features disabled");
            return orchestrator;
        };

        if !transport.connect().await {
            warn!("Could not connect to the MCP server; tool features disabled");
            if let Err(e) = transport.disconnect().await {
                debug!("Cleanup after failed connect: {}", e);
            }
            return orchestrator;
        }

        orchestrator.tool_transport = Some(transport.clone());
        orchestrator.catalog = match transport.list_tools(false).await {
            Ok(tools) => ToolCatalog::new(tools),
            Err(e) => {
                let report = ErrorReport::new(e.kind(), &e, Some("list_tools"));
                warn!("{}", report.log_message);
                ToolCatalog::default()
            }
        };
        info!(
            "Connected to MCP server with {} tool(s): {}",
            orchestrator.catalog.len(),
            orchestrator.catalog.names().collect::<Vec<_>>().join(", ")
        );
        orchestrator
    }

    pub fn with_progress(mut self, progress: Arc<dyn ChatProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Current tool snapshot.
    pub fn tools(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn is_tool_connected(&self) -> bool {
        self.tool_transport
            .as_ref()
            .is_some_and(|transport| transport.is_connected())
    }

    /// Re-fetch the tool list from the server and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh_tools(&mut self) -> Result<&ToolCatalog, ToolTransportError> {
        let transport = self
            .tool_transport
            .as_ref()
            .filter(|transport| transport.is_connected())
            .ok_or(ToolTransportError::NotConnected)?;

        let tools = transport.list_tools(true).await?;
        self.catalog = ToolCatalog::new(tools);
        info!("Tool list refreshed: {} tool(s)", self.catalog.len());
        Ok(&self.catalog)
    }

    /// Conversation history held by the model gateway.
    pub fn history(&self) -> Vec<Message> {
        self.gateway.history()
    }

    pub fn reset_conversation(&self) {
        self.gateway.reset_history();
        info!("Conversation history cleared");
    }

    /// Disconnect the tool server and forget its tools.
    pub async fn shutdown(&mut self) {
        if let Some(transport) = self.tool_transport.take()
            && let Err(e) = transport.disconnect().await
        {
            let report = ErrorReport::new(e.kind(), &e, Some("disconnect"));
            warn!("{}", report.log_message);
        }
        self.catalog = ToolCatalog::default();
    }

    /// Handle one user message and return the text to show.
    ///
    /// Failures are reported as a user-facing message, never as an error.
    pub async fn handle_message(&self, message: &str) -> String {
        let answer = match self.try_handle_message(message).await {
            Ok(answer) => answer,
            Err(e) => {
                let report = ErrorReport::new(e.kind(), &e, Some("handle_message"));
                error!("{}", report.log_message);
                report.user_message
            }
        };
        self.progress.on_complete();
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::Answer,
            json!({ "message": message, "answer": answer }),
        ));
        answer
    }

    /// Same flow as [`handle_message`](Self::handle_message), with the
    /// terminating failure returned to the caller.
    pub async fn try_handle_message(&self, message: &str) -> Result<String, HandleMessageError> {
        let transport = self
            .tool_transport
            .as_ref()
            .filter(|transport| transport.is_connected());

        let context = match transport {
            Some(transport) => self.fetch_context(transport.as_ref()).await,
            None => None,
        };

        if let Some(transport) = transport
            && !self.catalog.is_empty()
            && let Some(answer) = self.run_tool_path(transport.as_ref(), message).await
            && !answer.is_empty()
        {
            return Ok(answer);
        }

        self.progress.on_answer_start();
        let answer = self
            .gateway
            .send(ModelRequest::new(message).with_context(context))
            .await?;
        Ok(answer)
    }

    async fn fetch_context(&self, transport: &dyn ToolTransport) -> Option<String> {
        match transport.get_context().await {
            Ok(context) => context,
            Err(e) => {
                let report = ErrorReport::new(e.kind(), &e, Some("get_context"));
                warn!("{}", report.log_message);
                None
            }
        }
    }
}

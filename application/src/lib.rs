//! Application layer for mcp-chat
//!
//! This crate contains the chat use case and the port definitions it
//! depends on. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    conversation_logger::{
        ConversationEvent, ConversationLogger, EventKind, NoConversationLogger,
    },
    model_gateway::{GatewayError, ModelGateway, ModelRequest, ResponseFormat},
    progress::{ChatProgressNotifier, NoChatProgress},
    tool_transport::{ToolTransport, ToolTransportError},
};
pub use use_cases::chat::{ChatOrchestrator, HandleMessageError};

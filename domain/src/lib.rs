//! Domain layer for mcp-chat
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Single-step tool use
//!
//! Every user message goes through one planning step. The model either
//! answers directly or names exactly one MCP tool to call; the tool result is
//! then fed back for a synthesized final answer.
//!
//! - **Plan**: the parsed planning decision ([`Plan`])
//! - **Tool catalog**: the tools advertised by the connected MCP server
//! - **Invocation result**: the tool output, flattened to text for synthesis

pub mod core;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use core::{
    error::{ErrorKind, ErrorReport},
    string::preview,
};
pub use plan::{
    entities::{Plan, PlanArguments, PlanRejection},
    parser::parse_plan,
};
pub use prompt::PromptTemplate;
pub use session::entities::{Conversation, Message, Role};
pub use tool::{
    entities::{ToolCatalog, ToolDescriptor},
    value_objects::{ContentBlock, ToolInvocationResult},
};

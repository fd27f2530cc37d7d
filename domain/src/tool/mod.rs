//! Tool domain module
//!
//! Tools live on an external MCP server. The domain only knows what the
//! server told us about them and what came back from calling one:
//!
//! ```text
//! ┌────────────────┐   plan: call_tool   ┌──────────────────────┐
//! │ ToolCatalog    │ ──────────────────▶ │ ToolInvocationResult │ ──▶ render()
//! │ (descriptors)  │                     │ (isError, content)   │
//! └────────────────┘                     └──────────────────────┘
//! ```
//!
//! - [`ToolDescriptor`](entities::ToolDescriptor): name + description of one tool
//! - [`ToolCatalog`](entities::ToolCatalog): the per-connection snapshot
//! - [`ToolInvocationResult`](value_objects::ToolInvocationResult): outcome of one call
//! - [`ContentBlock`](value_objects::ContentBlock): text, binary or resource output

pub mod entities;
pub mod value_objects;

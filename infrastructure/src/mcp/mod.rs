//! MCP (Model Context Protocol) adapter
//!
//! JSON-RPC 2.0 client for a single tool server, over a child process
//! ([`stdio`]) or HTTP server-sent events ([`sse`]).

pub mod client;
pub mod error;
pub mod protocol;
pub mod sse;
pub mod stdio;
pub mod transport;

pub use client::McpClient;
pub use error::McpError;

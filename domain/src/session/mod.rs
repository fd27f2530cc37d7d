//! Conversation history domain.
//!
//! - [`entities::Message`]: one user or model turn
//! - [`entities::Conversation`]: the ordered history sent with each request

pub mod entities;

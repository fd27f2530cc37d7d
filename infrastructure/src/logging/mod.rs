//! Conversation transcripts
//!
//! [`JsonlConversationLogger`] appends one JSON object per chat event
//! (plan, tool call, tool result, answer) to a `.jsonl` file.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;

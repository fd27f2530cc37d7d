//! Gemini generative-language adapter

pub mod client;
pub mod error;
pub mod protocol;

pub use client::GeminiClient;
pub use error::GeminiError;

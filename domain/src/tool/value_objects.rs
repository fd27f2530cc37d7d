//! Tool domain value objects: the outcome of one tool invocation.
//!
//! [`ToolInvocationResult`] mirrors the wire shape of an MCP `tools/call`
//! result (`isError`, `structuredContent`, `content`). The orchestrator only
//! ever needs it as text, so [`ToolInvocationResult::render`] flattens it:
//!
//! 1. pretty-printed `structuredContent`, if present
//! 2. each content block, in order:
//!    - its text, if it has any
//!    - a redaction placeholder for binary (image/audio) data
//!    - the stringified resource reference
//!    - the block's JSON as a last resort
//!
//! Pieces are joined with newlines; empty pieces are skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of tool output.
///
/// Unknown block shapes are preserved as [`ContentBlock::Other`] rather than
/// failing deserialization of the whole result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        mime_type: String,
    },
    Audio {
        data: String,
        mime_type: String,
    },
    /// Embedded resource (`{"uri": ..., "text"|"blob": ...}`)
    Resource {
        resource: Value,
    },
    ResourceLink {
        uri: String,
        name: Option<String>,
    },
    Other(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Render this block as text (see the module docs for the precedence).
    pub fn render(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Image { data, mime_type } | ContentBlock::Audio { data, mime_type } => {
                binary_placeholder(mime_type, data.len())
            }
            ContentBlock::Resource { resource } => match resource.get("text").and_then(Value::as_str)
            {
                Some(text) => text.to_string(),
                None => resource.to_string(),
            },
            ContentBlock::ResourceLink { uri, name } => match name {
                Some(name) => format!("{} ({})", name, uri),
                None => uri.clone(),
            },
            ContentBlock::Other(value) => match value.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None if value.get("data").is_some() => {
                    let mime = value
                        .get("mimeType")
                        .and_then(Value::as_str)
                        .unwrap_or("application/octet-stream");
                    let len = value.get("data").and_then(Value::as_str).map_or(0, str::len);
                    binary_placeholder(mime, len)
                }
                None => match value.get("resource") {
                    Some(resource) => resource.to_string(),
                    None => value.to_string(),
                },
            },
        }
    }
}

fn binary_placeholder(mime_type: &str, encoded_len: usize) -> String {
    format!("[binary data omitted: {}, {} bytes encoded]", mime_type, encoded_len)
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        let str_field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        match value.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = str_field("text") {
                    return ContentBlock::Text { text };
                }
            }
            Some(kind @ ("image" | "audio")) => {
                if let (Some(data), Some(mime_type)) = (str_field("data"), str_field("mimeType")) {
                    return if kind == "image" {
                        ContentBlock::Image { data, mime_type }
                    } else {
                        ContentBlock::Audio { data, mime_type }
                    };
                }
            }
            Some("resource") => {
                if let Some(resource) = value.get("resource").filter(|r| r.is_object()) {
                    return ContentBlock::Resource {
                        resource: resource.clone(),
                    };
                }
            }
            Some("resource_link") => {
                if let Some(uri) = str_field("uri") {
                    return ContentBlock::ResourceLink {
                        uri,
                        name: str_field("name"),
                    };
                }
            }
            _ => {}
        }
        ContentBlock::Other(value)
    }
}

impl From<ContentBlock> for Value {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => serde_json::json!({"type": "text", "text": text}),
            ContentBlock::Image { data, mime_type } => {
                serde_json::json!({"type": "image", "data": data, "mimeType": mime_type})
            }
            ContentBlock::Audio { data, mime_type } => {
                serde_json::json!({"type": "audio", "data": data, "mimeType": mime_type})
            }
            ContentBlock::Resource { resource } => {
                serde_json::json!({"type": "resource", "resource": resource})
            }
            ContentBlock::ResourceLink { uri, name } => {
                let mut value = serde_json::json!({"type": "resource_link", "uri": uri});
                if let Some(name) = name {
                    value["name"] = Value::String(name);
                }
                value
            }
            ContentBlock::Other(value) => value,
        }
    }
}

/// Structured outcome of executing one named tool.
///
/// `is_error` marks a successful round-trip that reports a logical failure
/// (bad SQL, missing file); transport failures never produce a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationResult {
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ToolInvocationResult {
    /// A successful result carrying a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            structured_content: None,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// A logical failure carrying a single text block.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    pub fn with_structured_content(mut self, value: Value) -> Self {
        self.structured_content = Some(value);
        self
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    /// Flatten the result into a single string.
    pub fn render(&self) -> String {
        let mut pieces: Vec<String> = Vec::with_capacity(self.content.len() + 1);

        if let Some(structured) = &self.structured_content {
            let pretty =
                serde_json::to_string_pretty(structured).unwrap_or_else(|_| structured.to_string());
            pieces.push(pretty);
        }

        pieces.extend(self.content.iter().map(ContentBlock::render));

        pieces
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

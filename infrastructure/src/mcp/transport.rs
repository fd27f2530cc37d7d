//! Transport layer shared by the stdio and SSE connections.
//!
//! Both connections run one background reader that owns the read side and
//! hands each incoming frame to [`PendingResponses::route`]:
//!
//! - **Response** → the `oneshot` registered for its id
//! - **Server request** → a reply the reader writes back (`ping` is answered,
//!   everything else is refused with "method not found")
//! - **Notification** → logged and dropped

use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut, METHOD_NOT_FOUND,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// A connection to an MCP server carrying JSON-RPC messages
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and wait for the correlated response.
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse>;

    /// Send a notification (no response expected).
    async fn notify(&self, notification: JsonRpcNotification) -> Result<()>;

    /// Stop the reader and release the underlying process or stream.
    async fn close(&self);

    fn is_open(&self) -> bool;
}

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response { id: u64 },
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    ServerRequest { id: Value, method: String },
    /// A notification (has `method`, no `id`).
    Notification,
    /// Neither a usable id nor a method.
    Unroutable,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let id = json.get("id").filter(|id| !id.is_null());
    let method = json.get("method").and_then(Value::as_str);

    match (id, method) {
        (Some(id), Some(method)) => MessageKind::ServerRequest {
            id: id.clone(),
            method: method.to_string(),
        },
        (Some(id), None) => match id.as_u64() {
            Some(id) => MessageKind::Response { id },
            None => MessageKind::Unroutable,
        },
        (None, Some(_)) => MessageKind::Notification,
        (None, None) => MessageKind::Unroutable,
    }
}

/// Request-response correlation (request id -> oneshot sender).
///
/// Uses `std::sync::Mutex`: the lock is only held for a map insert/remove.
/// Once closed, no new request can be registered.
#[derive(Clone, Default)]
pub(crate) struct PendingResponses {
    inner: Arc<Mutex<PendingState>>,
}

#[derive(Default)]
struct PendingState {
    senders: HashMap<u64, oneshot::Sender<JsonRpcResponse>>,
    closed: bool,
}

impl PendingResponses {
    pub(crate) fn register(&self, id: u64) -> Result<oneshot::Receiver<JsonRpcResponse>> {
        let mut state = self.lock();
        if state.closed {
            return Err(McpError::TransportClosed);
        }
        let (tx, rx) = oneshot::channel();
        state.senders.insert(id, tx);
        Ok(rx)
    }

    pub(crate) fn remove(&self, id: u64) {
        self.lock().senders.remove(&id);
    }

    /// Drop every pending sender so waiting callers see the transport as closed.
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.senders.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PendingState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for the response to `id`, giving up after `timeout`.
    pub(crate) async fn wait(
        &self,
        id: u64,
        rx: oneshot::Receiver<JsonRpcResponse>,
        timeout: Duration,
    ) -> Result<JsonRpcResponse> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(McpError::TransportClosed),
            Err(_) => {
                self.remove(id);
                Err(McpError::Timeout(timeout))
            }
        }
    }

    /// Route one incoming frame; returns the reply owed to a server request.
    pub(crate) fn route(&self, frame: &str) -> Option<JsonRpcResponseOut> {
        trace!("MCP received: {}", frame);

        let value: Value = match serde_json::from_str(frame) {
            Ok(value) => value,
            Err(e) => {
                warn!("MCP: ignoring non-JSON frame: {}", e);
                return None;
            }
        };

        match classify_message(&value) {
            MessageKind::Response { id } => {
                let response: JsonRpcResponse = match serde_json::from_value(value) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("MCP: failed to parse response: {}", e);
                        return None;
                    }
                };
                let sender = self.lock().senders.remove(&id);
                match sender {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("MCP: no pending receiver for response id={}", id),
                }
                None
            }
            MessageKind::ServerRequest { id, method } => {
                if method == "ping" {
                    Some(JsonRpcResponseOut::result(id, json!({})))
                } else {
                    debug!("MCP: refusing server request method={}", method);
                    Some(JsonRpcResponseOut::error(
                        id,
                        METHOD_NOT_FOUND,
                        "Method not supported by client",
                    ))
                }
            }
            MessageKind::Notification => {
                let method = value.get("method").and_then(Value::as_str).unwrap_or("");
                trace!("MCP: ignoring notification method={}", method);
                None
            }
            MessageKind::Unroutable => {
                debug!("MCP: dropping frame without id or method");
                None
            }
        }
    }
}

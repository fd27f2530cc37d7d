//! SSE transport: the MCP server is reached over HTTP.
//!
//! 1. `GET {url}` with `Accept: text/event-stream` opens the event stream.
//! 2. The server's first `endpoint` event names the URL to POST requests to
//!    (resolved relative to `{url}`).
//! 3. Responses come back as `message` events on the stream.

use crate::config::SseSettings;
use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::transport::{McpTransport, PendingResponses};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` parser.
///
/// Bytes are buffered until a full line is available, so chunk boundaries
/// may fall anywhere (including inside a UTF-8 sequence).
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feed a chunk and return every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let decoded = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line: &str = &decoded;
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// HTTP/SSE MCP connection
pub struct SseTransport {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    pending: PendingResponses,
    reader_handle: JoinHandle<()>,
    open: Arc<AtomicBool>,
    read_timeout: Duration,
}

impl SseTransport {
    /// Open the event stream and wait for the `endpoint` event.
    pub async fn connect(settings: &SseSettings) -> Result<Self> {
        let base = Url::parse(&settings.url)
            .map_err(|e| McpError::InvalidUrl(format!("{}: {}", settings.url, e)))?;
        let headers = build_headers(&settings.headers)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .build()?;

        debug!("Opening MCP event stream: {}", base);
        let response = tokio::time::timeout(
            settings.timeout,
            client
                .get(base.clone())
                .headers(headers.clone())
                .header(ACCEPT, "text/event-stream")
                .send(),
        )
        .await
        .map_err(|_| McpError::Timeout(settings.timeout))??;

        if !response.status().is_success() {
            return Err(McpError::HttpStatus {
                status: response.status().as_u16(),
                url: base.to_string(),
            });
        }

        let pending = PendingResponses::default();
        let open = Arc::new(AtomicBool::new(true));
        let (endpoint_tx, endpoint_rx) = oneshot::channel();

        let reader_handle = tokio::spawn(Self::reader_loop(
            response,
            base,
            ReplyChannel {
                client: client.clone(),
                headers: headers.clone(),
            },
            pending.clone(),
            Arc::clone(&open),
            endpoint_tx,
        ));

        let endpoint = match tokio::time::timeout(settings.timeout, endpoint_rx).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) => {
                reader_handle.abort();
                return Err(McpError::UnexpectedResponse(
                    "event stream ended before the endpoint event".into(),
                ));
            }
            Err(_) => {
                reader_handle.abort();
                return Err(McpError::Timeout(settings.timeout));
            }
        };
        info!("MCP SSE endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            headers,
            pending,
            reader_handle,
            open,
            read_timeout: settings.read_timeout,
        })
    }

    /// Background reader loop: single owner of the event stream.
    async fn reader_loop(
        response: reqwest::Response,
        base: Url,
        replies: ReplyChannel,
        pending: PendingResponses,
        open: Arc<AtomicBool>,
        endpoint_tx: oneshot::Sender<Url>,
    ) {
        let mut endpoint_tx = Some(endpoint_tx);
        let mut endpoint: Option<Url> = None;
        let mut parser = SseParser::default();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("MCP SSE: stream error: {}", e);
                    break;
                }
            };

            for event in parser.feed(&chunk) {
                match event.event.as_str() {
                    "endpoint" => match base.join(event.data.trim()) {
                        Ok(url) => {
                            endpoint = Some(url.clone());
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(url);
                            }
                        }
                        Err(e) => warn!("MCP SSE: invalid endpoint '{}': {}", event.data, e),
                    },
                    "message" => {
                        if let Some(reply) = pending.route(&event.data)
                            && let Some(url) = &endpoint
                            && let Err(e) = replies.post(url, &reply).await
                        {
                            warn!("MCP SSE: failed to answer server request: {}", e);
                        }
                    }
                    other => trace!("MCP SSE: ignoring event '{}'", other),
                }
            }
        }

        info!("MCP SSE: event stream ended");
        open.store(false, Ordering::SeqCst);
        pending.close();
    }
}

/// What the reader needs to POST replies to server requests.
struct ReplyChannel {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl ReplyChannel {
    async fn post<T: Serialize>(&self, url: &Url, body: &T) -> Result<()> {
        post_json(&self.client, url, &self.headers, body).await
    }
}

async fn post_json<T: Serialize>(
    client: &reqwest::Client,
    url: &Url,
    headers: &HeaderMap,
    body: &T,
) -> Result<()> {
    trace!(
        "MCP sending: {}",
        serde_json::to_string(body).unwrap_or_default()
    );
    let response = client
        .post(url.clone())
        .headers(headers.clone())
        .json(body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(McpError::HttpStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| McpError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| McpError::InvalidHeader(name.clone()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl McpTransport for SseTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if !self.is_open() {
            return Err(McpError::TransportClosed);
        }

        let id = request.id;
        let rx = self.pending.register(id)?;
        if let Err(e) = post_json(&self.client, &self.endpoint, &self.headers, &request).await {
            self.pending.remove(id);
            return Err(e);
        }

        self.pending.wait(id, rx, self.read_timeout).await
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        if !self.is_open() {
            return Err(McpError::TransportClosed);
        }
        post_json(&self.client, &self.endpoint, &self.headers, &notification).await
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.reader_handle.abort();
        self.pending.close();
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}

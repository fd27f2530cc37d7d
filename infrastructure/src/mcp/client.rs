//! MCP client: the [`ToolTransport`] adapter.
//!
//! Owns one connection (stdio or SSE) to the selected server, runs the
//! `initialize` handshake, and caches the tool list until a forced refresh.

use crate::config::{DEFAULT_READ_TIMEOUT, McpServerSettings, McpTransportSettings};
use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    CallToolParams, InitializeResult, JsonRpcNotification, JsonRpcRequest, ListResourcesResult,
    ListToolsResult, initialize_params,
};
use crate::mcp::sse::SseTransport;
use crate::mcp::stdio::StdioTransport;
use crate::mcp::transport::McpTransport;
use async_trait::async_trait;
use mcp_chat_application::ports::tool_transport::{ToolTransport, ToolTransportError};
use mcp_chat_domain::{ToolDescriptor, ToolInvocationResult};
use serde_json::{Map, Value, json};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const NO_RESOURCES: &str = "No resources available";

#[derive(Clone)]
struct Connection {
    transport: Arc<dyn McpTransport>,
    server: InitializeResult,
}

/// Client for one MCP server
pub struct McpClient {
    settings: McpServerSettings,
    connection: RwLock<Option<Connection>>,
    tools_cache: Mutex<Option<Vec<ToolDescriptor>>>,
}

impl McpClient {
    pub fn new(settings: McpServerSettings) -> Self {
        Self {
            settings,
            connection: RwLock::new(None),
            tools_cache: Mutex::new(None),
        }
    }

    async fn open_transport(&self) -> Result<Arc<dyn McpTransport>> {
        match &self.settings.transport {
            McpTransportSettings::Stdio(stdio) => Ok(Arc::new(
                StdioTransport::spawn(stdio, DEFAULT_READ_TIMEOUT).await?,
            )),
            McpTransportSettings::Sse(sse) => Ok(Arc::new(SseTransport::connect(sse).await?)),
        }
    }

    async fn initialize(transport: &dyn McpTransport) -> Result<InitializeResult> {
        let response = transport
            .request(JsonRpcRequest::new("initialize", Some(initialize_params())))
            .await?;
        let server: InitializeResult = serde_json::from_value(response.into_result()?)?;
        transport
            .notify(JsonRpcNotification::new("notifications/initialized"))
            .await?;
        Ok(server)
    }

    /// Run the handshake over an open transport and adopt it on success.
    async fn connect_with(&self, transport: Arc<dyn McpTransport>) -> bool {
        match Self::initialize(transport.as_ref()).await {
            Ok(server) => {
                match &server.server_info {
                    Some(info) => info!(
                        "Connected to MCP server '{}' ({} {})",
                        self.settings.name,
                        info.name,
                        info.version.as_deref().unwrap_or("")
                    ),
                    None => info!("Connected to MCP server '{}'", self.settings.name),
                }
                *self.tools_cache.lock().await = None;
                *self.connection.write().unwrap_or_else(|e| e.into_inner()) =
                    Some(Connection { transport, server });
                true
            }
            Err(e) => {
                warn!(
                    "MCP handshake with '{}' failed: {}",
                    self.settings.name, e
                );
                transport.close().await;
                false
            }
        }
    }

    fn connection(&self) -> Option<Connection> {
        self.connection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .filter(|connection| connection.transport.is_open())
    }

    async fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let connection = self.connection().ok_or(McpError::NotConnected)?;
        connection
            .transport
            .request(JsonRpcRequest::new(method, params))
            .await?
            .into_result()
    }

    async fn fetch_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.take().map(|cursor| json!({ "cursor": cursor }));
            let page: ListToolsResult = serde_json::from_value(self.rpc("tools/list", params).await?)?;
            tools.extend(page.tools.into_iter().map(ToolDescriptor::from));
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }
}

fn protocol_error(e: McpError) -> ToolTransportError {
    match e {
        McpError::NotConnected => ToolTransportError::NotConnected,
        other => ToolTransportError::Protocol(other.to_string()),
    }
}

fn call_error(e: McpError) -> ToolTransportError {
    match e {
        McpError::NotConnected => ToolTransportError::NotConnected,
        other => ToolTransportError::Call(other.to_string()),
    }
}

#[async_trait]
impl ToolTransport for McpClient {
    async fn connect(&self) -> bool {
        if self.connection().is_some() {
            return true;
        }

        info!(
            "Connecting to MCP server '{}' ({})",
            self.settings.name,
            self.settings.transport.kind()
        );
        match self.open_transport().await {
            Ok(transport) => self.connect_with(transport).await,
            Err(e) => {
                warn!(
                    "Failed to reach MCP server '{}': {}",
                    self.settings.name, e
                );
                false
            }
        }
    }

    async fn list_tools(
        &self,
        force_refresh: bool,
    ) -> std::result::Result<Vec<ToolDescriptor>, ToolTransportError> {
        let mut cache = self.tools_cache.lock().await;
        if !force_refresh && let Some(tools) = cache.as_ref() {
            return Ok(tools.clone());
        }

        let tools = self.fetch_tools().await.map_err(protocol_error)?;
        debug!("MCP tools/list returned {} tool(s)", tools.len());
        *cache = Some(tools.clone());
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> std::result::Result<ToolInvocationResult, ToolTransportError> {
        let params = serde_json::to_value(CallToolParams { name, arguments })
            .map_err(|e| ToolTransportError::Call(e.to_string()))?;
        let result = self
            .rpc("tools/call", Some(params))
            .await
            .map_err(call_error)?;
        serde_json::from_value(result).map_err(|e| ToolTransportError::Call(e.to_string()))
    }

    async fn get_context(&self) -> std::result::Result<Option<String>, ToolTransportError> {
        let Some(connection) = self.connection() else {
            warn!("MCP server is not connected; no context");
            return Ok(None);
        };
        if !connection.server.supports_resources() {
            return Ok(None);
        }

        let result = self
            .rpc("resources/list", None)
            .await
            .map_err(protocol_error)?;
        let listing: ListResourcesResult = serde_json::from_value(result)
            .map_err(|e| ToolTransportError::Protocol(e.to_string()))?;

        if listing.resources.is_empty() {
            return Ok(Some(NO_RESOURCES.to_string()));
        }
        let lines: Vec<String> = listing
            .resources
            .iter()
            .map(|resource| {
                format!(
                    "Resource: {} ({})",
                    resource.name.as_deref().unwrap_or(&resource.uri),
                    resource.uri
                )
            })
            .collect();
        debug!("MCP context: {} resource(s)", lines.len());
        Ok(Some(lines.join("\n")))
    }

    async fn disconnect(&self) -> std::result::Result<(), ToolTransportError> {
        let connection = self
            .connection
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(connection) = connection {
            info!("Disconnecting from MCP server '{}'", self.settings.name);
            connection.transport.close().await;
        }
        *self.tools_cache.lock().await = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StdioSettings;
    use crate::mcp::protocol::JsonRpcResponse;
    use mcp_chat_domain::ErrorKind;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory MCP server answering by method name.
    struct FakeServer {
        resources: Option<Vec<Value>>,
        fail_initialize: bool,
        methods: std::sync::Mutex<Vec<String>>,
        tools_list_calls: AtomicUsize,
        open: AtomicBool,
    }

    impl FakeServer {
        fn new() -> Arc<Self> {
            Self::build(Some(Vec::new()), false)
        }

        fn build(resources: Option<Vec<Value>>, fail_initialize: bool) -> Arc<Self> {
            Arc::new(Self {
                resources,
                fail_initialize,
                methods: std::sync::Mutex::new(Vec::new()),
                tools_list_calls: AtomicUsize::new(0),
                open: AtomicBool::new(true),
            })
        }

        fn methods(&self) -> Vec<String> {
            self.methods.lock().unwrap().clone()
        }

        fn respond(&self, request: &JsonRpcRequest) -> Value {
            match request.method.as_str() {
                "initialize" if self.fail_initialize => json!({
                    "error": {"code": -32603, "message": "boom"}
                }),
                "initialize" => {
                    let mut capabilities = json!({"tools": {}});
                    if self.resources.is_some() {
                        capabilities["resources"] = json!({});
                    }
                    json!({"result": {
                        "protocolVersion": "2024-11-05",
                        "capabilities": capabilities,
                        "serverInfo": {"name": "fake", "version": "0.1"}
                    }})
                }
                "tools/list" => {
                    self.tools_list_calls.fetch_add(1, Ordering::SeqCst);
                    json!({"result": {"tools": [
                        {"name": "execute_sql", "description": "Execute SQL", "inputSchema": {}}
                    ]}})
                }
                "tools/call" => {
                    let params = request.params.clone().unwrap_or(Value::Null);
                    if params["name"] == "execute_sql" {
                        json!({"result": {
                            "isError": false,
                            "content": [{"type": "text", "text": format!("ran {}", params["arguments"]["sql"])}]
                        }})
                    } else {
                        json!({"error": {"code": -32602, "message": "Unknown tool"}})
                    }
                }
                "resources/list" => json!({"result": {"resources": self.resources.clone()}}),
                _ => json!({"error": {"code": -32601, "message": "Method not found"}}),
            }
        }
    }

    #[async_trait]
    impl McpTransport for FakeServer {
        async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
            self.methods.lock().unwrap().push(request.method.clone());
            let mut body = self.respond(&request);
            body["id"] = json!(request.id);
            Ok(serde_json::from_value(body)?)
        }

        async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
            self.methods.lock().unwrap().push(notification.method);
            Ok(())
        }

        async fn close(&self) {
            self.open.store(false, Ordering::SeqCst);
        }

        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
    }

    fn client() -> McpClient {
        McpClient::new(McpServerSettings {
            name: "fake".to_string(),
            transport: McpTransportSettings::Stdio(StdioSettings {
                command: "unused".to_string(),
                args: Vec::new(),
                env: BTreeMap::new(),
            }),
        })
    }

    async fn connected(server: &Arc<FakeServer>) -> McpClient {
        let client = client();
        assert!(client.connect_with(server.clone()).await);
        client
    }

    #[tokio::test]
    async fn test_handshake_then_initialized_notification() {
        let server = FakeServer::new();
        let client = connected(&server).await;

        assert!(client.is_connected());
        assert_eq!(
            server.methods(),
            vec!["initialize", "notifications/initialized"]
        );
    }

    #[tokio::test]
    async fn test_failed_handshake_closes_transport() {
        let server = FakeServer::build(None, true);
        let client = client();

        assert!(!client.connect_with(server.clone()).await);
        assert!(!client.is_connected());
        assert!(!server.is_open());
    }

    #[tokio::test]
    async fn test_list_tools_is_cached_until_forced() {
        let server = FakeServer::new();
        let client = connected(&server).await;

        let first = client.list_tools(false).await.unwrap();
        let second = client.list_tools(false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0], ToolDescriptor::new("execute_sql", "Execute SQL"));
        assert_eq!(server.tools_list_calls.load(Ordering::SeqCst), 1);

        client.list_tools(true).await.unwrap();
        assert_eq!(server.tools_list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_call_tool() {
        let server = FakeServer::new();
        let client = connected(&server).await;

        let mut arguments = Map::new();
        arguments.insert("sql".to_string(), json!("SELECT 1"));
        let result = client
            .call_tool("execute_sql", Some(arguments))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.render(), "ran \"SELECT 1\"");

        let err = client.call_tool("nope", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tool);
    }

    #[tokio::test]
    async fn test_get_context() {
        let server = FakeServer::build(
            Some(vec![
                json!({"uri": "db://main", "name": "main"}),
                json!({"uri": "file:///notes.txt"}),
            ]),
            false,
        );
        let client = connected(&server).await;
        assert_eq!(
            client.get_context().await.unwrap().unwrap(),
            "Resource: main (db://main)\nResource: file:///notes.txt (file:///notes.txt)"
        );

        let client = connected(&FakeServer::new()).await;
        assert_eq!(
            client.get_context().await.unwrap().as_deref(),
            Some(NO_RESOURCES)
        );

        let without_resources = FakeServer::build(None, false);
        let client = connected(&without_resources).await;
        assert_eq!(client.get_context().await.unwrap(), None);
        assert!(!without_resources.methods().contains(&"resources/list".to_string()));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let server = FakeServer::new();
        let client = connected(&server).await;

        client.disconnect().await.unwrap();
        assert!(!client.is_connected());
        assert!(!server.is_open());
        assert_eq!(client.get_context().await.unwrap(), None);
        assert!(matches!(
            client.list_tools(true).await,
            Err(ToolTransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_fails_for_missing_command() {
        let client = McpClient::new(McpServerSettings {
            name: "missing".to_string(),
            transport: McpTransportSettings::Stdio(StdioSettings {
                command: "definitely-not-a-real-mcp-server".to_string(),
                args: Vec::new(),
                env: BTreeMap::new(),
            }),
        });
        assert!(!client.connect().await);
        assert!(!client.is_connected());
    }
}

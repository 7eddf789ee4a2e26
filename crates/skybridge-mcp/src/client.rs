//! MCP client: handshake, tool catalog, and tool invocation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerInfo,
    ToolDescriptor,
};
use crate::transport::{SseTransport, SseTransportConfig};

/// Configuration for an MCP client.
#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Name of this connection (for logging).
    pub name: String,
    /// URL of the server's event stream.
    pub url: Url,
    /// Fallback command path; see [`SseTransportConfig`].
    pub default_post_path: Option<String>,
    /// Timeout for request/response round trips.
    pub timeout: Duration,
    /// Grace delay after opening the stream.
    pub connect_grace: Duration,
}

impl McpClientConfig {
    /// Create a config for a named server.
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        let defaults = SseTransportConfig::new(url.clone());
        Self {
            name: name.into(),
            url,
            default_post_path: defaults.default_post_path,
            timeout: defaults.timeout,
            connect_grace: defaults.connect_grace,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the fallback command path.
    pub fn with_default_post_path(mut self, path: Option<String>) -> Self {
        self.default_post_path = path;
        self
    }
}

/// A client session against one MCP tool server.
///
/// Requests go out as POSTs; responses come back on the event stream and
/// are correlated by id. The session is strictly sequential: one request
/// is in flight at a time, enforced by the transport lock.
pub struct McpClient {
    config: McpClientConfig,
    transport: Mutex<SseTransport>,
    request_id: AtomicU64,
    server_info: parking_lot::RwLock<Option<ServerInfo>>,
    initialized: AtomicBool,
}

impl McpClient {
    /// Open the stream connection to the server.
    pub async fn connect(config: McpClientConfig) -> Result<Self> {
        let transport_config = SseTransportConfig::new(config.url.clone())
            .with_default_post_path(config.default_post_path.clone())
            .with_timeout(config.timeout)
            .with_connect_grace(config.connect_grace);
        let mut transport = SseTransport::new(transport_config)?;
        transport.connect().await?;
        info!(name = %config.name, url = %config.url, "connected to tool server");
        Ok(Self {
            config,
            transport: Mutex::new(transport),
            request_id: AtomicU64::new(1),
            server_info: parking_lot::RwLock::new(None),
            initialized: AtomicBool::new(false),
        })
    }

    /// Perform the MCP handshake.
    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let params = serde_json::to_value(InitializeParams::default())?;
        let result = self.request("initialize", Some(params)).await?;
        let result: InitializeResult = serde_json::from_value(result)?;

        self.notify("notifications/initialized", None).await?;

        info!(
            name = %self.config.name,
            server = %result.server_info.name,
            version = %result.server_info.version,
            "session initialized"
        );
        *self.server_info.write() = Some(result.server_info);
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Fetch the tool catalog.
    ///
    /// Always issues a fresh `tools/list`; the catalog is never cached.
    /// Tools advertising no parameter schema are skipped with a warning.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.ensure_initialized()?;
        let result = self.request("tools/list", None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)?;

        let mut tools = Vec::with_capacity(listed.tools.len());
        for info in listed.tools {
            let name = info.name.clone();
            match ToolDescriptor::from_info(info) {
                Some(descriptor) => tools.push(descriptor),
                None => warn!(tool = %name, "skipping tool without a parameter schema"),
            }
        }
        debug!(count = tools.len(), "tool catalog fetched");
        Ok(tools)
    }

    /// Invoke a tool and return its text result.
    ///
    /// Empty successful results collapse to a generic `"Success"` marker.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<String> {
        self.ensure_initialized()?;
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;

        let result = match self.request("tools/call", Some(params)).await {
            Ok(result) => result,
            Err(McpError::ServerError { code, message, .. })
                if code == crate::protocol::JsonRpcError::METHOD_NOT_FOUND
                    || message.to_lowercase().contains("unknown tool") =>
            {
                return Err(McpError::UnknownTool(name.to_string()));
            }
            Err(other) => return Err(other),
        };

        let result: CallToolResult = serde_json::from_value(result)?;
        let text = result.text();
        if result.is_error() {
            return Err(McpError::ToolFailed(
                text.unwrap_or_else(|| format!("tool {name} reported an error")),
            ));
        }
        Ok(text.unwrap_or_else(|| "Success".to_string()))
    }

    /// Issue a request and await its streamed response.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        debug!(name = %self.config.name, method, id, "sending request");

        let mut transport = self.transport.lock().await;
        transport.send(&request).await?;

        let response = tokio::time::timeout(
            self.config.timeout,
            Self::await_reply(&mut transport, id),
        )
        .await
        .map_err(|_| McpError::Timeout)??;

        response
            .into_result()
            .map_err(|e| McpError::server_error(e.code, e.message, e.data))
    }

    /// Drain the stream until the response with the matching id arrives.
    async fn await_reply(
        transport: &mut SseTransport,
        id: u64,
    ) -> Result<JsonRpcResponse> {
        loop {
            match transport.receive().await? {
                Some(JsonRpcMessage::Response(response)) if response.id == id => {
                    return Ok(response);
                }
                Some(JsonRpcMessage::Response(response)) => {
                    debug!(got = response.id, want = id, "skipping stale response");
                }
                Some(JsonRpcMessage::Notification(notification)) => {
                    debug!(method = %notification.method, "server notification");
                }
                None => return Err(McpError::ConnectionClosed),
            }
        }
    }

    /// Send a notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification::new(method, params);
        let transport = self.transport.lock().await;
        transport.send(&notification).await
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(McpError::NotInitialized)
        }
    }

    /// Tear the session down.
    pub async fn shutdown(&self) {
        let mut transport = self.transport.lock().await;
        transport.disconnect().await;
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Whether the underlying stream is still open.
    ///
    /// Reports `true` when the transport is busy with a request, since an
    /// in-flight request implies a live session.
    pub fn is_alive(&self) -> bool {
        match self.transport.try_lock() {
            Ok(transport) => transport.is_connected(),
            Err(_) => true,
        }
    }

    /// Name of this connection.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Info reported by the server during initialization.
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.read().clone()
    }

    /// Whether the handshake has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.config.name)
            .field("url", &self.config.url.as_str())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Shorthand for building `tools/call` arguments inline.
pub fn tool_args(pairs: &[(&str, Value)]) -> Value {
    let mut map = serde_json::Map::new();
    for (key, value) in pairs {
        map.insert((*key).to_string(), value.clone());
    }
    json!(map)
}

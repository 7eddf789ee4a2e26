//! MCP client stack for the Skybridge mission-control backend.
//!
//! Talks to a tool server over its SSE dialect: a long-lived GET stream
//! carries endpoint announcements and JSON-RPC replies, while commands go
//! out as HTTP POSTs to the announced endpoint.
//!
//! Layers, bottom up:
//!
//! - [`stream`]: incremental frame parser over raw stream bytes
//! - [`transport`]: one session (read loop, inbound queue, command POSTs)
//! - [`client`]: handshake, tool catalog, tool invocation
//! - [`manager`]: the shared, self-healing single connection
//!
//! # Usage
//!
//! ```no_run
//! use skybridge_mcp::{McpClientConfig, McpManager};
//! use url::Url;
//!
//! # async fn run() -> skybridge_mcp::Result<()> {
//! let config = McpClientConfig::new(
//!     "mission-tools",
//!     Url::parse("http://127.0.0.1:3001/sse").unwrap(),
//! );
//! let manager = McpManager::new(config);
//!
//! let client = manager.ensure_connected().await?;
//! let tools = client.list_tools().await?;
//! println!("{} tools available", tools.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod stream;
pub mod transport;

pub use client::{McpClient, McpClientConfig};
pub use error::{McpError, Result};
pub use manager::{ConnectionState, McpManager};
pub use protocol::{
    CallToolResult, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ToolDescriptor, ToolInfo,
};
pub use stream::{FrameParser, StreamEvent};
pub use transport::{SseTransport, SseTransportConfig};

//! Seam between the agent loop and the tool server.

use async_trait::async_trait;
use serde_json::Value;

use skybridge_mcp::{McpError, McpManager, ToolDescriptor};

/// Access to the tool server, as the agent loop sees it.
///
/// Production code uses [`McpManager`]; tests substitute mocks.
#[async_trait]
pub trait ToolBroker: Send + Sync {
    /// Make sure a live session exists.
    async fn connect(&self) -> Result<(), McpError>;

    /// Fetch the current tool catalog.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Invoke a tool and return its text result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, McpError>;
}

#[async_trait]
impl ToolBroker for McpManager {
    async fn connect(&self) -> Result<(), McpError> {
        self.ensure_connected().await?;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        self.ensure_connected().await?.list_tools().await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, McpError> {
        self.ensure_connected()
            .await?
            .call_tool(name, Some(arguments))
            .await
    }
}

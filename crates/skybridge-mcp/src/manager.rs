//! Connection manager holding the single tool-server session.
//!
//! Concurrent callers share one session: a lock-free snapshot serves the
//! common case, and an async mutex held across the connect attempt makes
//! sure N racing `ensure_connected` calls produce exactly one connection.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::{McpClient, McpClientConfig};
use crate::error::{McpError, Result};

/// Lifecycle state of the managed connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.
    #[default]
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// A live, initialized session exists.
    Connected,
}

/// Manager for the single tool-server connection.
pub struct McpManager {
    config: McpClientConfig,
    current: parking_lot::RwLock<Option<Arc<McpClient>>>,
    state: parking_lot::RwLock<ConnectionState>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl McpManager {
    /// Create a manager for the given server config.
    pub fn new(config: McpClientConfig) -> Self {
        Self {
            config,
            current: parking_lot::RwLock::new(None),
            state: parking_lot::RwLock::new(ConnectionState::default()),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Return a live client, connecting if needed.
    ///
    /// Dead sessions are torn down and replaced. Any failure along the way
    /// surfaces as `ConnectionFailed` and leaves the manager disconnected.
    pub async fn ensure_connected(&self) -> Result<Arc<McpClient>> {
        // Fast path: live session already up.
        if let Some(client) = self.current.read().clone() {
            if client.is_alive() {
                return Ok(client);
            }
        }

        let _guard = self.connect_lock.lock().await;

        // Second check: another caller may have connected while we waited.
        let existing = self.current.read().clone();
        if let Some(client) = existing {
            if client.is_alive() {
                return Ok(client);
            }
            debug!(name = %self.config.name, "discarding dead session");
            client.shutdown().await;
            *self.current.write() = None;
        }

        *self.state.write() = ConnectionState::Connecting;
        match self.connect().await {
            Ok(client) => {
                let client = Arc::new(client);
                *self.current.write() = Some(Arc::clone(&client));
                *self.state.write() = ConnectionState::Connected;
                Ok(client)
            }
            Err(e) => {
                *self.state.write() = ConnectionState::Disconnected;
                error!(name = %self.config.name, error = %e, "tool server connection failed");
                Err(McpError::ConnectionFailed(e.to_string()))
            }
        }
    }

    /// Open and initialize a fresh session.
    async fn connect(&self) -> Result<McpClient> {
        let client = McpClient::connect(self.config.clone()).await?;
        if let Err(e) = client.initialize().await {
            // The read loop must not be left running behind a failed
            // handshake.
            client.shutdown().await;
            return Err(e);
        }
        Ok(client)
    }

    /// Tear down the current session, if any.
    pub async fn shutdown(&self) {
        let _guard = self.connect_lock.lock().await;
        let client = self.current.write().take();
        if let Some(client) = client {
            info!(name = %self.config.name, "shutting down tool server session");
            client.shutdown().await;
        }
        *self.state.write() = ConnectionState::Disconnected;
    }

    /// Current lifecycle state, reconciled with stream liveness.
    ///
    /// A session whose stream has died since the last check is reported
    /// (and recorded) as `Disconnected` rather than waiting for the next
    /// `ensure_connected` to notice.
    pub fn state(&self) -> ConnectionState {
        let state = *self.state.read();
        if state == ConnectionState::Connected {
            let alive = self
                .current
                .read()
                .as_ref()
                .is_some_and(|client| client.is_alive());
            if !alive {
                *self.state.write() = ConnectionState::Disconnected;
                return ConnectionState::Disconnected;
            }
        }
        state
    }

    /// Whether a live session exists.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

impl std::fmt::Debug for McpManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpManager")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn unroutable_manager() -> McpManager {
        // Port 9 (discard) is never serving SSE.
        let url = Url::parse("http://127.0.0.1:9/sse").unwrap();
        let config = McpClientConfig::new("test", url).with_timeout(Duration::from_millis(200));
        McpManager::new(config)
    }

    #[test]
    fn test_initial_state() {
        let manager = unroutable_manager();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_and_resets_state() {
        let manager = unroutable_manager();
        let err = manager.ensure_connected().await.unwrap_err();
        assert!(matches!(err, McpError::ConnectionFailed(_)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_without_session_is_safe() {
        let manager = unroutable_manager();
        manager.shutdown().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}

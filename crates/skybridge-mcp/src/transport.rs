//! SSE transport session for the tool server protocol.
//!
//! One session owns a long-lived GET stream plus the command endpoint the
//! server announces over it. A background read loop parses frames off the
//! stream: endpoint announcements update the POST target (last one wins),
//! decoded JSON-RPC messages land on an unbounded inbound queue, and stream
//! end or failure closes the queue with the cause attached as a final item.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{McpError, Result};
use crate::protocol::JsonRpcMessage;
use crate::stream::{FrameParser, StreamEvent};

/// Default command path when the server has not announced one yet.
pub const DEFAULT_POST_PATH: &str = "/message";

/// Delay after scheduling the read loop, giving the server a moment to
/// announce the command endpoint before the first send.
pub const CONNECT_GRACE: Duration = Duration::from_millis(50);

/// Default timeout for command POSTs.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an SSE transport session.
#[derive(Debug, Clone)]
pub struct SseTransportConfig {
    /// URL of the event stream.
    pub url: Url,
    /// Path joined against the stream URL when no endpoint announcement
    /// has arrived. `None` makes pre-announcement sends fail.
    pub default_post_path: Option<String>,
    /// Timeout applied to command POSTs.
    pub timeout: Duration,
    /// Grace delay after connecting.
    pub connect_grace: Duration,
}

impl SseTransportConfig {
    /// Create a config for the given stream URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            default_post_path: Some(DEFAULT_POST_PATH.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_grace: CONNECT_GRACE,
        }
    }

    /// Set the fallback command path.
    pub fn with_default_post_path(mut self, path: Option<String>) -> Self {
        self.default_post_path = path;
        self
    }

    /// Set the command POST timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the post-connect grace delay.
    pub fn with_connect_grace(mut self, grace: Duration) -> Self {
        self.connect_grace = grace;
        self
    }
}

/// An SSE transport session.
pub struct SseTransport {
    config: SseTransportConfig,
    http: reqwest::Client,
    /// Command endpoint announced by the server, if any yet.
    post_url: Arc<parking_lot::RwLock<Option<Url>>>,
    inbound: Option<mpsc::UnboundedReceiver<Result<JsonRpcMessage>>>,
    cancel: CancellationToken,
    read_task: Option<JoinHandle<()>>,
}

impl SseTransport {
    /// Create a transport from its config.
    ///
    /// The HTTP client carries a connect timeout only; the stream GET must
    /// stay open indefinitely, so per-request timeouts are applied to the
    /// command POSTs instead.
    pub fn new(config: SseTransportConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| McpError::transport(e.to_string()))?;
        Ok(Self {
            config,
            http,
            post_url: Arc::new(parking_lot::RwLock::new(None)),
            inbound: None,
            cancel: CancellationToken::new(),
            read_task: None,
        })
    }

    /// Open the stream and start the background read loop.
    ///
    /// Idempotent while the loop is alive. Returns after scheduling the
    /// loop plus the configured grace delay.
    pub async fn connect(&mut self) -> Result<()> {
        if self
            .read_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.inbound = Some(rx);
        *self.post_url.write() = None;
        self.cancel = CancellationToken::new();

        let task = tokio::spawn(read_loop(
            self.http.clone(),
            self.config.url.clone(),
            Arc::clone(&self.post_url),
            tx,
            self.cancel.clone(),
        ));
        self.read_task = Some(task);

        tokio::time::sleep(self.config.connect_grace).await;
        Ok(())
    }

    /// POST a message to the command endpoint.
    ///
    /// Uses the announced endpoint, falling back to the configured default
    /// path joined against the stream URL. Errors with `NotConnected` when
    /// neither exists. Non-success statuses are transport errors.
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let announced = self.post_url.read().clone();
        let target = match announced {
            Some(url) => url,
            None => {
                let path = self
                    .config
                    .default_post_path
                    .as_deref()
                    .ok_or(McpError::NotConnected)?;
                self.config
                    .url
                    .join(path)
                    .map_err(|e| McpError::transport(e.to_string()))?
            }
        };

        let response = self
            .http
            .post(target.clone())
            .timeout(self.config.timeout)
            .json(message)
            .send()
            .await
            .map_err(|e| McpError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(McpError::transport(format!(
                "command endpoint {} returned {}",
                target,
                response.status()
            )));
        }
        Ok(())
    }

    /// Receive the next message from the stream.
    ///
    /// Returns `Ok(None)` once the stream has ended and the queue is
    /// drained. A stream failure surfaces as the final `Err`.
    pub async fn receive(&mut self) -> Result<Option<JsonRpcMessage>> {
        let inbound = self.inbound.as_mut().ok_or(McpError::NotConnected)?;
        match inbound.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    /// Stop the read loop and drop the session state.
    ///
    /// Safe to call without a prior `connect()`.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.read_task.take() {
            // Cancellation makes the loop return; a join error here can
            // only be a panic inside the loop, which we surface in logs.
            if let Err(error) = task.await {
                warn!(%error, "read loop terminated abnormally");
            }
        }
        self.inbound = None;
        *self.post_url.write() = None;
    }

    /// Whether the read loop is still running.
    pub fn is_connected(&self) -> bool {
        self.read_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Background loop: GET the stream, parse frames, dispatch events.
async fn read_loop(
    http: reqwest::Client,
    url: Url,
    post_url: Arc<parking_lot::RwLock<Option<Url>>>,
    tx: mpsc::UnboundedSender<Result<JsonRpcMessage>>,
    cancel: CancellationToken,
) {
    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        result = http.get(url.clone()).send() => result,
    };

    let response = match response {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            let _ = tx.send(Err(McpError::transport(format!(
                "stream endpoint {} returned {}",
                url,
                resp.status()
            ))));
            return;
        }
        Err(error) => {
            let _ = tx.send(Err(McpError::transport(error.to_string())));
            return;
        }
    };

    info!(url = %url, "event stream open");
    let mut parser = FrameParser::new(url);
    let mut body = response.bytes_stream();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return,
            chunk = body.next() => chunk,
        };

        let events = match chunk {
            Some(Ok(bytes)) => parser.push(&bytes),
            Some(Err(error)) => vec![StreamEvent::Failed {
                reason: error.to_string(),
            }],
            None => vec![StreamEvent::Closed],
        };

        for event in events {
            match event {
                StreamEvent::EndpointAnnounced { url } => {
                    debug!(endpoint = %url, "command endpoint announced");
                    *post_url.write() = Some(url);
                }
                StreamEvent::Message(message) => {
                    if tx.send(Ok(*message)).is_err() {
                        // Receiver gone, session torn down.
                        return;
                    }
                }
                StreamEvent::Closed => {
                    info!("event stream closed by server");
                    return;
                }
                StreamEvent::Failed { reason } => {
                    warn!(reason, "event stream failed");
                    let _ = tx.send(Err(McpError::transport(reason)));
                    return;
                }
            }
        }
    }
}

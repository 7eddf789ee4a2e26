//! Incremental parser for the tool server's SSE stream.
//!
//! The server frames everything as two-line SSE events: an `event:` line
//! naming the frame kind followed by a `data:` line carrying the payload.
//! Two kinds exist: `endpoint` announces the URL commands should be POSTed
//! to, and `message` carries a JSON-RPC message. Bytes arrive in arbitrary
//! chunks, so the parser buffers until it has complete lines.

use tracing::warn;
use url::Url;

use crate::protocol::JsonRpcMessage;

/// An event decoded from the SSE stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The server announced the command endpoint.
    EndpointAnnounced {
        /// Absolute URL commands should be POSTed to.
        url: Url,
    },
    /// A JSON-RPC message arrived on the stream.
    Message(Box<JsonRpcMessage>),
    /// The stream ended normally.
    Closed,
    /// The stream ended with a read failure.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// Frame kinds awaiting their data line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingFrame {
    Endpoint,
    Message,
}

/// Incremental frame parser.
///
/// Feed it raw chunks with [`push`](Self::push); it returns the events
/// completed by that chunk. Partial lines and half-finished frames are
/// carried over to the next call.
#[derive(Debug)]
pub struct FrameParser {
    /// Stream endpoint, used to resolve relative endpoint announcements.
    origin: Url,
    buffer: Vec<u8>,
    pending: Option<PendingFrame>,
}

impl FrameParser {
    /// Create a parser for a stream served from `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            buffer: Vec::new(),
            pending: None,
        }
    }

    /// Feed a chunk of bytes, returning any events it completed.
    ///
    /// The buffer holds raw bytes and splits on `b'\n'` only: a multi-byte
    /// UTF-8 character straddling two chunks stays intact until its line
    /// is complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            let decoded = String::from_utf8_lossy(&line_bytes[..pos]);
            let line = decoded.trim_end_matches('\r');
            if let Some(event) = self.take_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn take_line(&mut self, line: &str) -> Option<StreamEvent> {
        if let Some(kind) = self.pending.take() {
            if let Some(raw) = line.strip_prefix("data: ") {
                return self.complete_frame(kind, raw.trim());
            }
            // No data line followed the event line. The frame is dropped
            // and the current line is examined on its own.
        }

        match line.trim() {
            "event: endpoint" => self.pending = Some(PendingFrame::Endpoint),
            "event: message" => self.pending = Some(PendingFrame::Message),
            _ => {}
        }
        None
    }

    fn complete_frame(&self, kind: PendingFrame, raw: &str) -> Option<StreamEvent> {
        match kind {
            PendingFrame::Endpoint => {
                match Url::parse(raw).or_else(|_| self.origin.join(raw)) {
                    Ok(url) => Some(StreamEvent::EndpointAnnounced { url }),
                    Err(error) => {
                        warn!(raw, %error, "discarding unparseable endpoint announcement");
                        None
                    }
                }
            }
            PendingFrame::Message => match serde_json::from_str::<JsonRpcMessage>(raw) {
                Ok(message) => Some(StreamEvent::Message(Box::new(message))),
                Err(error) => {
                    warn!(%error, "discarding malformed message frame");
                    None
                }
            },
        }
    }
}

//! Incremental parser for the realtime database's event-stream protocol.
//!
//! The server pushes `text/event-stream` frames (`event:` + `data:` lines
//! terminated by a blank line). Chunks arrive at arbitrary boundaries, so
//! the parser buffers partial lines between calls.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{RtdbError, RtdbResult};

/// One complete event-stream frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Buffering frame parser.
#[derive(Debug, Default)]
pub(crate) struct SseFrameParser {
    buf: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame it completes.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\r', '\n']);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event = Some(rest.trim_start().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            } else if line.starts_with(':') {
                // comment line, ignore
            }
        }
        frames
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let event = self.event.take().unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

/// A change notification from the realtime backend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServerEvent {
    /// Replace the value at `path` with `data`
    Put { path: String, data: Value },
    /// Merge the children of `data` into the value at `path`
    Patch { path: String, data: Value },
    KeepAlive,
    /// The server revoked the listener (permissions changed)
    Cancel,
    /// The auth credential expired mid-stream
    AuthRevoked,
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

/// Interpret a frame. Unknown event types are skipped (`None`).
pub(crate) fn parse_server_event(frame: &SseFrame) -> RtdbResult<Option<ServerEvent>> {
    match frame.event.as_str() {
        "put" | "patch" => {
            let payload: ChangePayload = serde_json::from_str(&frame.data).map_err(|e| {
                RtdbError::InvalidResponse(format!("malformed {} event: {}", frame.event, e))
            })?;
            Ok(Some(if frame.event == "put" {
                ServerEvent::Put {
                    path: payload.path,
                    data: payload.data,
                }
            } else {
                ServerEvent::Patch {
                    path: payload.path,
                    data: payload.data,
                }
            }))
        }
        "keep-alive" => Ok(Some(ServerEvent::KeepAlive)),
        "cancel" => Ok(Some(ServerEvent::Cancel)),
        "auth_revoked" => Ok(Some(ServerEvent::AuthRevoked)),
        other => {
            debug!(event = %other, "Skipping unknown server event");
            Ok(None)
        }
    }
}

//! Live collection adaptation.
//!
//! Turns the backend's push-listener protocol into a pull-based stream: the
//! subscription is opened when the stream is first polled, every backend
//! change yields the complete re-decoded snapshot, and dropping the stream
//! closes the connection, so no listener outlives its observer.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RtdbError, RtdbResult};
use crate::sse::{parse_server_event, ServerEvent, SseFrameParser};

/// A record paired with its backend-assigned key.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    pub key: String,
    pub value: T,
}

// =============================================================================
// Snapshot state
// =============================================================================

/// The listener's view of the collection, updated in place from server
/// events.
#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    root: Value,
}

impl CollectionState {
    pub fn new() -> Self {
        Self { root: Value::Null }
    }

    /// Replace the value at `path` (a `put` event). A null value removes
    /// the node.
    pub fn set(&mut self, path: &str, data: Value) {
        set_at(&mut self.root, path, data);
    }

    /// Merge the children of `data` into the value at `path` (a `patch`
    /// event).
    pub fn merge(&mut self, path: &str, data: Value) {
        match data {
            Value::Object(map) => {
                let prefix = path.trim_end_matches('/');
                for (key, value) in map {
                    set_at(&mut self.root, &format!("{}/{}", prefix, key), value);
                }
            }
            other => set_at(&mut self.root, path, other),
        }
    }

    /// Decode the snapshot into keyed records in ascending key order.
    /// Entries that fail to deserialize are omitted, not errors.
    pub fn decode<T: DeserializeOwned>(&self) -> Vec<Keyed<T>> {
        let Some(entries) = self.root.as_object() else {
            return Vec::new();
        };
        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(value) => records.push(Keyed {
                    key: key.clone(),
                    value,
                }),
                Err(e) => debug!(key = %key, "Skipping malformed snapshot entry: {}", e),
            }
        }
        records
    }
}

fn set_at(root: &mut Value, path: &str, data: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let Some((last, parents)) = segments.split_last() else {
        *root = data;
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(obj) = current.as_object_mut() else {
            return;
        };
        current = obj.entry(segment.to_string()).or_insert(Value::Null);
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(obj) = current.as_object_mut() {
        if data.is_null() {
            obj.remove(*last);
        } else {
            obj.insert(last.to_string(), data);
        }
    }
}

// =============================================================================
// Event stream
// =============================================================================

struct WatchConn<S, T> {
    body: S,
    parser: SseFrameParser,
    snapshot: CollectionState,
    pending: VecDeque<RtdbResult<Vec<Keyed<T>>>>,
    closing: bool,
}

/// Adapt a raw event-stream body into snapshot emissions.
///
/// Every `put`/`patch` yields the full re-decoded collection. The first
/// error item is terminal: the stream ends after yielding it. `keep-alive`
/// frames are dropped.
pub(crate) fn event_stream<S, C, T>(
    body: S,
) -> impl Stream<Item = RtdbResult<Vec<Keyed<T>>>> + Send
where
    S: Stream<Item = RtdbResult<C>> + Send + Unpin + 'static,
    C: AsRef<[u8]> + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let conn = WatchConn {
        body,
        parser: SseFrameParser::new(),
        snapshot: CollectionState::new(),
        pending: VecDeque::new(),
        closing: false,
    };

    stream::unfold(Some(conn), |state| async move {
        let mut conn = state?;
        loop {
            if let Some(item) = conn.pending.pop_front() {
                let terminal = item.is_err();
                return Some((item, if terminal { None } else { Some(conn) }));
            }
            if conn.closing {
                return None;
            }

            match conn.body.next().await {
                Some(Ok(chunk)) => {
                    for frame in conn.parser.push_chunk(chunk.as_ref()) {
                        match parse_server_event(&frame) {
                            Ok(Some(ServerEvent::Put { path, data })) => {
                                conn.snapshot.set(&path, data);
                                conn.pending.push_back(Ok(conn.snapshot.decode()));
                            }
                            Ok(Some(ServerEvent::Patch { path, data })) => {
                                conn.snapshot.merge(&path, data);
                                conn.pending.push_back(Ok(conn.snapshot.decode()));
                            }
                            Ok(Some(ServerEvent::KeepAlive)) | Ok(None) => {}
                            Ok(Some(ServerEvent::Cancel)) => {
                                conn.pending.push_back(Err(RtdbError::PermissionDenied(
                                    "listener cancelled by the server".to_string(),
                                )));
                                conn.closing = true;
                            }
                            Ok(Some(ServerEvent::AuthRevoked)) => {
                                conn.pending.push_back(Err(RtdbError::AuthError(
                                    "credential revoked while listening".to_string(),
                                )));
                                conn.closing = true;
                            }
                            Err(e) => {
                                conn.pending.push_back(Err(e));
                                conn.closing = true;
                            }
                        }
                        if conn.closing {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    conn.pending.push_back(Err(e));
                    conn.closing = true;
                }
                None => {
                    conn.pending.push_back(Err(RtdbError::ListenerClosed(
                        "connection closed by the server".to_string(),
                    )));
                    conn.closing = true;
                }
            }
        }
    })
}

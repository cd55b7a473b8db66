//! Realtime database REST client.
//!
//! Speaks the database's node-per-URL protocol (`{base}/{path}.json`) with
//! the session token attached as the `auth` query parameter. Write keys are
//! always generated by the backend (`push`), never by this client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::Either;
use futures_util::stream::{self, Stream, StreamExt, TryStreamExt};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};

use crag_auth::TokenSource;

use crate::error::{RtdbError, RtdbResult};
use crate::live::{event_stream, Keyed};
use crate::metrics::{record_request, record_watch_opened};

// =============================================================================
// Configuration
// =============================================================================

/// Realtime database client configuration.
#[derive(Debug, Clone)]
pub struct RtdbConfig {
    /// Database base URL
    pub database_url: String,
    /// Request timeout for plain operations (listeners are exempt)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl RtdbConfig {
    /// Create config from environment variables.
    pub fn from_env() -> RtdbResult<Self> {
        let database_url = std::env::var("FIREBASE_DATABASE_URL").map_err(|_| {
            RtdbError::request_failed("FIREBASE_DATABASE_URL must be set to reach the database")
        })?;

        if database_url.is_empty() {
            return Err(RtdbError::request_failed(
                "FIREBASE_DATABASE_URL cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("RTDB_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url: database_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Realtime database REST client.
pub struct RtdbClient {
    http: Client,
    config: RtdbConfig,
    tokens: Arc<dyn TokenSource>,
}

impl Clone for RtdbClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl RtdbClient {
    /// Create a new client.
    ///
    /// The HTTP client carries no overall timeout; plain operations apply
    /// [`RtdbConfig::timeout`] per request so listener connections can stay
    /// open indefinitely.
    pub fn new(config: RtdbConfig, tokens: Arc<dyn TokenSource>) -> RtdbResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("crag-realtime/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RtdbError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables.
    pub fn from_env(tokens: Arc<dyn TokenSource>) -> RtdbResult<Self> {
        Self::new(RtdbConfig::from_env()?, tokens)
    }

    /// URL of a database node.
    fn node_url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.config.database_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    async fn auth_token(&self) -> RtdbResult<Option<String>> {
        self.tokens
            .id_token()
            .await
            .map_err(|e| RtdbError::auth_error(e.to_string()))
    }

    fn is_token_expired(body: &str) -> bool {
        body.contains("expired") || body.contains("auth_revoked")
    }

    // =========================================================================
    // Node operations
    // =========================================================================

    /// Read the value at `path`. JSON `null` maps to `None`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RtdbResult<Option<T>> {
        let url = self.node_url(path);

        self.execute_request("get", path, async {
            let response = self.send(|| self.http.get(&url)).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from(status, &url, response).await);
            }

            let value: serde_json::Value = response.json().await?;
            if value.is_null() {
                Ok(None)
            } else {
                serde_json::from_value(value).map(Some).map_err(RtdbError::Json)
            }
        })
        .await
    }

    /// Write the value at `path`, replacing whatever is there.
    pub async fn put<T: Serialize + Sync>(&self, path: &str, value: &T) -> RtdbResult<()> {
        let url = self.node_url(path);

        self.execute_request("put", path, async {
            let response = self.send(|| self.http.put(&url).json(value)).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from(status, &url, response).await);
            }
            Ok(())
        })
        .await
    }

    /// Append a value under `path` with a backend-generated key, returning
    /// that key.
    pub async fn push<T: Serialize + Sync>(&self, path: &str, value: &T) -> RtdbResult<String> {
        let url = self.node_url(path);

        self.execute_request("push", path, async {
            let response = self.send(|| self.http.post(&url).json(value)).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from(status, &url, response).await);
            }

            let pushed: PushResponse = response
                .json()
                .await
                .map_err(|e| RtdbError::InvalidResponse(format!("push response: {}", e)))?;
            if pushed.name.is_empty() {
                return Err(RtdbError::InvalidResponse(
                    "push response carried no key".to_string(),
                ));
            }
            Ok(pushed.name)
        })
        .await
    }

    /// Merge `fields` into the value at `path` (field-level update).
    pub async fn update<T: Serialize + Sync>(&self, path: &str, fields: &T) -> RtdbResult<()> {
        let url = self.node_url(path);

        self.execute_request("update", path, async {
            let response = self.send(|| self.http.patch(&url).json(fields)).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from(status, &url, response).await);
            }
            Ok(())
        })
        .await
    }

    /// Delete the value at `path`. Deleting an absent node succeeds.
    pub async fn delete(&self, path: &str) -> RtdbResult<()> {
        let url = self.node_url(path);
        let node = path.to_string();

        self.execute_request("delete", path, async {
            let response = self.send(|| self.http.delete(&url)).await?;
            let status = response.status();
            match status {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!("Node {} already deleted (idempotent)", node);
                    Ok(())
                }
                _ => Err(Self::error_from(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Live collection
    // =========================================================================

    /// Observe the collection at `path` as a stream of full snapshots.
    ///
    /// The backend subscription is opened on first poll and torn down when
    /// the stream is dropped. Every change notification (the initial load
    /// included) yields the complete keyed sequence; the first error is
    /// terminal.
    pub fn watch<T>(&self, path: &str) -> impl Stream<Item = RtdbResult<Vec<Keyed<T>>>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let path = path.to_string();

        let connect = async move {
            let token = client.auth_token().await?;
            let url = client.node_url(&path);

            let mut request = client
                .http
                .get(&url)
                .header(header::ACCEPT, "text/event-stream");
            if let Some(token) = token.as_deref() {
                request = request.query(&[("auth", token)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RtdbError::from_http_status(
                    status.as_u16(),
                    format!("{} failed: {}", url, body),
                ));
            }

            record_watch_opened(&path);
            debug!(path = %path, "Opened realtime listener");
            Ok(response.bytes_stream().map_err(RtdbError::Network).boxed())
        };

        stream::once(connect).flat_map(|connected| match connected {
            Ok(body) => Either::Left(event_stream::<_, _, T>(body)),
            Err(e) => Either::Right(stream::iter(vec![Err(e)])),
        })
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Send a request with the session token, retrying exactly once after a
    /// token refresh when the backend rejects the token as expired.
    async fn send<F>(&self, build: F) -> RtdbResult<reqwest::Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self.auth_token().await?;
        let mut response = self.finish(build(), token.as_deref()).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if !Self::is_token_expired(&body) {
                return Err(RtdbError::from_http_status(401, body));
            }

            self.tokens.invalidate().await;
            let token = self.auth_token().await?;
            response = self.finish(build(), token.as_deref()).send().await?;
        }

        Ok(response)
    }

    fn finish(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let request = request.timeout(self.config.timeout);
        match token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn error_from(status: StatusCode, url: &str, response: reqwest::Response) -> RtdbError {
        let body = response.text().await.unwrap_or_default();
        RtdbError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }

    /// Execute a node operation with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, path: &str, fut: F) -> RtdbResult<T>
    where
        F: std::future::Future<Output = RtdbResult<T>>,
    {
        let span = info_span!("rtdb_request", operation = %operation, path = %path);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }
}

// =============================================================================
// Tests
// =============================================================================

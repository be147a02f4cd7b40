//! Firebase Realtime Database over its REST API.
//!
//! Each path maps to `{host}/{path}.json`; the database secret or ID token
//! is passed as the `auth` query parameter.
//!
//! | Operation | Request |
//! |---|---|
//! | probe | `GET /.json?shallow=true` |
//! | get | `GET /{path}.json` (`null` means missing) |
//! | set | `PUT /{path}.json` with the JSON value |
//! | push | `POST /{path}.json`, answers `{"name": "<key>"}` |
//! | delete | `DELETE /{path}.json` |

use std::time::Duration;

use doorlock_core::constants::DEFAULT_REMOTE_TIMEOUT_MS;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::{RemoteStore, segments};
use crate::error::{StoreError, StoreResult};

/// Connection settings for a Realtime Database instance.
///
/// # Example
///
/// ```
/// use doorlock_network::store::FirebaseConfig;
///
/// let config = FirebaseConfig::new("my-door.firebaseio.com").with_auth("secret");
/// assert_eq!(config.base_url(), "https://my-door.firebaseio.com");
/// ```
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database host, with or without scheme.
    pub host: String,

    /// Database secret or ID token.
    pub auth: Option<String>,

    /// Timeout for each request.
    pub timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth: None,
            timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        }
    }

    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host with scheme and without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Realtime Database client.
#[derive(Debug)]
pub struct FirebaseStore {
    client: Client,
    config: FirebaseConfig,
    ready: bool,
}

impl FirebaseStore {
    /// Build a client; no request is made until [`connect`](RemoteStore::connect).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the host is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: FirebaseConfig) -> StoreResult<Self> {
        if config.host.trim().is_empty() {
            return Err(StoreError::Config("database host is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            ready: false,
        })
    }

    /// REST URL of a store path.
    pub fn url(&self, path: &str) -> String {
        let path = segments(path).collect::<Vec<_>>().join("/");
        format!("{}/{}.json", self.config.base_url(), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(auth) = &self.config.auth {
            builder = builder.query(&[("auth", auth)]);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> StoreResult<Response> {
        if !self.ready {
            return Err(StoreError::NotReady);
        }
        Self::check(builder.send().await?, path)
    }

    fn check(response: Response, path: &str) -> StoreResult<Response> {
        let status = response.status();
        trace!(path, status = status.as_u16(), "Remote store response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(StoreError::http(status.as_u16(), path))
        }
    }

    async fn put(&self, path: &str, value: &Value) -> StoreResult<()> {
        self.send(self.request(Method::PUT, path).json(value), path)
            .await?;
        Ok(())
    }
}

impl RemoteStore for FirebaseStore {
    async fn connect(&mut self) -> StoreResult<()> {
        let probe = self
            .request(Method::GET, "/")
            .query(&[("shallow", "true")]);
        let response = Self::check(probe.send().await?, "/")?;
        // Drain the body so a truncated answer fails the probe.
        response.bytes().await?;
        self.ready = true;
        debug!(host = %self.config.base_url(), "Remote store ready");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn get_string(&self, path: &str) -> StoreResult<Option<String>> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        let body = response.bytes().await?;
        match serde_json::from_slice::<Value>(&body)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            _ => Err(StoreError::unexpected_type(path, "string")),
        }
    }

    async fn set_string(&self, path: &str, value: &str) -> StoreResult<()> {
        self.put(path, &Value::String(value.to_string())).await
    }

    async fn set_int(&self, path: &str, value: i64) -> StoreResult<()> {
        self.put(path, &Value::from(value)).await
    }

    async fn push_int(&self, path: &str, value: i64) -> StoreResult<String> {
        let response = self
            .send(self.request(Method::POST, path).json(&value), path)
            .await?;
        let body = response.bytes().await?;
        let pushed: PushResponse = serde_json::from_slice(&body)?;
        Ok(pushed.name)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }
}

//! Error types for the remote store and network provisioning.

use thiserror::Error;

/// Result type alias for remote store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned by a [`RemoteStore`](crate::store::RemoteStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has not completed its readiness probe.
    #[error("Remote store not ready")]
    NotReady,

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {path}")]
    Http { status: u16, path: String },

    /// The request could not be sent or the response not received.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The value at `path` has a different JSON type than requested.
    #[error("Unexpected value at {path}: expected {expected}")]
    UnexpectedType { path: String, expected: &'static str },

    /// The store is unreachable.
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    /// Invalid store configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn http(status: u16, path: impl Into<String>) -> Self {
        Self::Http {
            status,
            path: path.into(),
        }
    }

    pub fn unexpected_type(path: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedType {
            path: path.into(),
            expected,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Errors returned by a [`Provisioner`](crate::provisioning::Provisioner).
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// No credentials were supplied within the setup window.
    #[error("No credentials received on portal {portal} within {window_ms}ms")]
    PortalTimeout { portal: String, window_ms: u64 },

    /// The stored credentials are unusable.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The credentials file is not valid JSON.
    #[error("Malformed credentials file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

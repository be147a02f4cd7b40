//! Remote key-value store.
//!
//! The appliance mirrors a handful of values into a hierarchical JSON store
//! (Firebase Realtime Database). Paths are slash separated (`/fingerprint/lastUID`);
//! leading and trailing slashes are ignored.
//!
//! Every operation requires the store to be ready: [`RemoteStore::connect`]
//! runs a readiness probe once and operations fail with
//! [`StoreError::NotReady`](crate::StoreError::NotReady) until it succeeds.

#![allow(async_fn_in_trait)]

mod firebase;
mod memory;

pub use firebase::{FirebaseConfig, FirebaseStore};
pub use memory::{MemoryStore, StoreOp};

use crate::error::StoreResult;

/// Hierarchical JSON key-value store.
///
/// # Examples
///
/// ```
/// use doorlock_network::store::{MemoryStore, RemoteStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), doorlock_network::StoreError> {
///     let mut store = MemoryStore::new();
///     store.connect().await?;
///
///     store.set_string("/doorControl", "unlock").await?;
///     assert_eq!(store.get_string("/doorControl").await?.as_deref(), Some("unlock"));
///     Ok(())
/// }
/// ```
pub trait RemoteStore: Send {
    /// Run the readiness probe.
    async fn connect(&mut self) -> StoreResult<()>;

    /// Whether the readiness probe has succeeded.
    fn is_ready(&self) -> bool;

    /// Read a string value; `None` when nothing is stored at `path`.
    async fn get_string(&self, path: &str) -> StoreResult<Option<String>>;

    async fn set_string(&self, path: &str, value: &str) -> StoreResult<()>;

    async fn set_int(&self, path: &str, value: i64) -> StoreResult<()>;

    /// Append a value under a generated key; returns the key.
    async fn push_int(&self, path: &str, value: i64) -> StoreResult<String>;

    /// Remove `path` and everything below it.
    async fn delete(&self, path: &str) -> StoreResult<()>;
}

/// Enum wrapper for remote store dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRemoteStore {
    Firebase(FirebaseStore),
    Memory(MemoryStore),
}

impl RemoteStore for AnyRemoteStore {
    async fn connect(&mut self) -> StoreResult<()> {
        match self {
            Self::Firebase(store) => store.connect().await,
            Self::Memory(store) => store.connect().await,
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Self::Firebase(store) => store.is_ready(),
            Self::Memory(store) => store.is_ready(),
        }
    }

    async fn get_string(&self, path: &str) -> StoreResult<Option<String>> {
        match self {
            Self::Firebase(store) => store.get_string(path).await,
            Self::Memory(store) => store.get_string(path).await,
        }
    }

    async fn set_string(&self, path: &str, value: &str) -> StoreResult<()> {
        match self {
            Self::Firebase(store) => store.set_string(path, value).await,
            Self::Memory(store) => store.set_string(path, value).await,
        }
    }

    async fn set_int(&self, path: &str, value: i64) -> StoreResult<()> {
        match self {
            Self::Firebase(store) => store.set_int(path, value).await,
            Self::Memory(store) => store.set_int(path, value).await,
        }
    }

    async fn push_int(&self, path: &str, value: i64) -> StoreResult<String> {
        match self {
            Self::Firebase(store) => store.push_int(path, value).await,
            Self::Memory(store) => store.push_int(path, value).await,
        }
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        match self {
            Self::Firebase(store) => store.delete(path).await,
            Self::Memory(store) => store.delete(path).await,
        }
    }
}

/// Non-empty segments of a store path.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

//! In-memory remote store.
//!
//! Keeps the same JSON tree semantics as the Realtime Database: writing a
//! path creates its parents, deleting a path removes the whole subtree and
//! parents left empty disappear. Clones share the same tree, so a test can
//! keep one clone for inspection while the appliance owns another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::trace;

use super::{RemoteStore, segments};
use crate::error::{StoreError, StoreResult};

/// Number of operations kept by [`MemoryStore::operations`]; older ones are
/// dropped first.
pub const MAX_RECORDED_OPS: usize = 1024;

/// A write or read received by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Get { path: String },
    Set { path: String, value: Value },
    Push { path: String, value: Value },
    Delete { path: String },
}

#[derive(Debug)]
struct MemoryState {
    root: Value,
    reachable: bool,
    ready: bool,
    failing: bool,
    failing_writes: bool,
    push_counter: u64,
    ops: VecDeque<StoreOp>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, reachable store. It becomes ready on `connect`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                root: Value::Object(Map::new()),
                reachable: true,
                ready: false,
                failing: false,
                failing_writes: false,
                push_counter: 0,
                ops: VecDeque::with_capacity(MAX_RECORDED_OPS),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the readiness probe fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Force the ready flag, bypassing the probe.
    pub fn set_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    /// Make every operation fail as if the network dropped.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Make writes and deletes fail while reads keep working.
    pub fn set_failing_writes(&self, failing: bool) {
        self.lock().failing_writes = failing;
    }

    /// Value stored at `path`, if any.
    pub fn value(&self, path: &str) -> Option<Value> {
        lookup(&self.lock().root, path).cloned()
    }

    /// Child values of `path` in key order.
    pub fn children(&self, path: &str) -> Vec<Value> {
        match lookup(&self.lock().root, path) {
            Some(Value::Object(map)) => map.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Write `value` directly, without recording an operation.
    pub fn seed(&self, path: &str, value: Value) {
        insert(&mut self.lock().root, path, value);
    }

    /// The most recent operations received, oldest first.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.lock().ops.iter().cloned().collect()
    }

    /// Check readiness, record `op`, then apply fault injection.
    ///
    /// Attempts made while failing are recorded; attempts made before the
    /// store is ready are not.
    fn begin(&self, op: StoreOp) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        if !state.ready {
            return Err(StoreError::NotReady);
        }
        trace!(?op, "Memory store operation");
        let write = !matches!(op, StoreOp::Get { .. });
        if state.ops.len() == MAX_RECORDED_OPS {
            state.ops.pop_front();
        }
        state.ops.push_back(op);
        if state.failing || (write && state.failing_writes) {
            return Err(StoreError::unavailable("simulated network failure"));
        }
        Ok(state)
    }
}

impl RemoteStore for MemoryStore {
    async fn connect(&mut self) -> StoreResult<()> {
        let mut state = self.lock();
        if !state.reachable {
            return Err(StoreError::unavailable("readiness probe failed"));
        }
        state.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.lock().ready
    }

    async fn get_string(&self, path: &str) -> StoreResult<Option<String>> {
        let state = self.begin(StoreOp::Get {
            path: path.to_string(),
        })?;
        match lookup(&state.root, path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::unexpected_type(path, "string")),
        }
    }

    async fn set_string(&self, path: &str, value: &str) -> StoreResult<()> {
        let value = Value::String(value.to_string());
        let mut state = self.begin(StoreOp::Set {
            path: path.to_string(),
            value: value.clone(),
        })?;
        insert(&mut state.root, path, value);
        Ok(())
    }

    async fn set_int(&self, path: &str, value: i64) -> StoreResult<()> {
        let value = Value::from(value);
        let mut state = self.begin(StoreOp::Set {
            path: path.to_string(),
            value: value.clone(),
        })?;
        insert(&mut state.root, path, value);
        Ok(())
    }

    async fn push_int(&self, path: &str, value: i64) -> StoreResult<String> {
        let value = Value::from(value);
        let mut state = self.begin(StoreOp::Push {
            path: path.to_string(),
            value: value.clone(),
        })?;
        state.push_counter += 1;
        // Timestamp first so keys sort in push order, as generated push ids do.
        let key = format!(
            "-{:013}{:06}",
            Utc::now().timestamp_millis(),
            state.push_counter
        );
        let child = format!("{}/{}", path.trim_end_matches('/'), key);
        insert(&mut state.root, &child, value);
        Ok(key)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let mut state = self.begin(StoreOp::Delete {
            path: path.to_string(),
        })?;
        remove(&mut state.root, path);
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, key| node.get(key))
}

fn insert(root: &mut Value, path: &str, value: Value) {
    let keys: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = keys.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for key in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node.as_object_mut() {
            Some(map) => map
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            None => return,
        };
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        map.insert((*last).to_string(), value);
    }
}

/// Remove the subtree at `keys` and prune parents left empty.
fn remove_keys(node: &mut Value, keys: &[&str]) {
    let Value::Object(map) = node else { return };
    match keys {
        [] => {}
        [last] => {
            map.remove(*last);
        }
        [first, rest @ ..] => {
            if let Some(child) = map.get_mut(*first) {
                remove_keys(child, rest);
                if child.as_object().is_some_and(Map::is_empty) {
                    map.remove(*first);
                }
            }
        }
    }
}

fn remove(root: &mut Value, path: &str) {
    let keys: Vec<&str> = segments(path).collect();
    if keys.is_empty() {
        *root = Value::Object(Map::new());
    } else {
        remove_keys(root, &keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn ready_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_not_ready_until_connected() {
        let store = MemoryStore::new();
        assert!(!store.is_ready());
        assert!(matches!(
            store.set_string("/doorControl", "locked").await,
            Err(StoreError::NotReady)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_probe() {
        let mut store = MemoryStore::new();
        store.set_reachable(false);
        assert!(store.connect().await.is_err());
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_nested_set_and_get() {
        let store = ready_store().await;
        store.set_int("/fingerprint/lastUID", 1).await.unwrap();
        store
            .set_string("/ultrasonic/notification", "Object detected at 9 cm")
            .await
            .unwrap();

        assert_eq!(store.value("/fingerprint/lastUID"), Some(json!(1)));
        assert_eq!(
            store.get_string("/ultrasonic/notification").await.unwrap(),
            Some("Object detected at 9 cm".to_string())
        );
        assert_eq!(store.get_string("/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_string_type_mismatch() {
        let store = ready_store().await;
        store.set_int("/fingerprint/lastUID", 3).await.unwrap();
        assert!(matches!(
            store.get_string("/fingerprint/lastUID").await,
            Err(StoreError::UnexpectedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_push_keys_are_ordered() {
        let store = ready_store().await;
        let first = store
            .push_int("/fingerprint/registeredUIDs", 1)
            .await
            .unwrap();
        let second = store
            .push_int("/fingerprint/registeredUIDs", 1)
            .await
            .unwrap();

        assert!(first < second);
        assert_eq!(
            store.children("/fingerprint/registeredUIDs"),
            vec![json!(1), json!(1)]
        );
    }

    #[tokio::test]
    async fn test_delete_subtree_prunes_empty_parents() {
        let store = ready_store().await;
        store
            .push_int("/fingerprint/registeredUIDs", 1)
            .await
            .unwrap();
        store.set_int("/fingerprint/lastUID", 1).await.unwrap();
        store.set_string("/doorControl", "locked").await.unwrap();

        store.delete("/fingerprint/registeredUIDs").await.unwrap();
        assert!(store.value("/fingerprint/registeredUIDs").is_none());
        assert!(store.value("/fingerprint/lastUID").is_some());

        store.delete("/fingerprint/lastUID").await.unwrap();
        assert!(store.value("/fingerprint").is_none());
        assert_eq!(store.value("/doorControl"), Some(json!("locked")));
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_ok() {
        let store = ready_store().await;
        store.delete("/fingerprint/lastUID").await.unwrap();
        assert_eq!(
            store.operations(),
            vec![StoreOp::Delete {
                path: "/fingerprint/lastUID".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_overwrite_scalar_with_subtree() {
        let store = ready_store().await;
        store.set_string("/a", "leaf").await.unwrap();
        store.set_int("/a/b", 2).await.unwrap();
        assert_eq!(store.value("/a"), Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = ready_store().await;
        store.set_failing(true);
        assert!(matches!(
            store.delete("/fingerprint").await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.operations().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_writes_keep_reads() {
        let store = ready_store().await;
        store.seed("/doorControl", json!("unlock"));
        store.set_failing_writes(true);

        assert_eq!(
            store.get_string("/doorControl").await.unwrap().as_deref(),
            Some("unlock")
        );
        assert!(store.set_string("/doorControl", "locked").await.is_err());
        assert_eq!(store.value("/doorControl"), Some(json!("unlock")));
    }

    #[tokio::test]
    async fn test_operation_log_is_bounded() {
        let store = ready_store().await;
        for _ in 0..MAX_RECORDED_OPS + 10 {
            store.get_string("/doorControl").await.unwrap();
        }
        store.set_string("/doorControl", "locked").await.unwrap();

        let ops = store.operations();
        assert_eq!(ops.len(), MAX_RECORDED_OPS);
        assert_eq!(
            ops.last(),
            Some(&StoreOp::Set {
                path: "/doorControl".to_string(),
                value: json!("locked"),
            })
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = ready_store().await;
        let observer = store.clone();
        store.set_string("/doorControl", "unlock").await.unwrap();
        assert_eq!(observer.value("/doorControl"), Some(json!("unlock")));
    }
}

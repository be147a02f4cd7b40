//! Remote mirror of the appliance state.
//!
//! Every operation is best effort: it checks that the store is ready, makes
//! one attempt and logs the outcome. Nothing is retried or queued; the next
//! event simply overwrites the value.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use doorlock_core::constants::{
    DOOR_COMMAND_LOCKED, DOOR_CONTROL_PATH, LAST_UID_PATH, NOTIFICATION_PATH,
    PROLONGED_NOTIFICATION_PATH, PROXIMITY_THRESHOLD_CM, REGISTERED_UIDS_PATH,
};
use doorlock_core::{DistanceCm, DoorCommand, FingerprintId};
use doorlock_network::{AnyRemoteStore, RemoteStore, StoreResult};

/// Best-effort writer and reader of the remote entries.
#[derive(Debug)]
pub struct RemoteMirror {
    store: AnyRemoteStore,
    threshold_cm: u32,
}

impl RemoteMirror {
    pub fn new(store: AnyRemoteStore) -> Self {
        Self {
            store,
            threshold_cm: PROXIMITY_THRESHOLD_CM,
        }
    }

    /// Threshold quoted in the prolonged presence message.
    pub fn with_proximity_threshold(mut self, threshold_cm: u32) -> Self {
        self.threshold_cm = threshold_cm;
        self
    }

    /// Run the store's readiness probe.
    pub async fn connect(&mut self) -> StoreResult<()> {
        self.store.connect().await
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Overwrite the proximity notification.
    pub async fn notify_proximity(&self, distance: DistanceCm) {
        if !self.ready_for("proximity notification") {
            return;
        }
        let message = format!("Object detected at {} cm", distance.as_cm());
        match self.store.set_string(NOTIFICATION_PATH, &message).await {
            Ok(()) => info!(%message, "Proximity notification sent"),
            Err(e) => warn!(
                error = %e,
                path = NOTIFICATION_PATH,
                "Failed to send proximity notification"
            ),
        }
    }

    /// Overwrite the prolonged presence notification.
    pub async fn notify_prolonged_presence(&self, duration: Duration) {
        if !self.ready_for("prolonged presence notification") {
            return;
        }
        let message = format!(
            "Object detected <{}cm for {}s",
            self.threshold_cm,
            duration.as_secs()
        );
        match self
            .store
            .set_string(PROLONGED_NOTIFICATION_PATH, &message)
            .await
        {
            Ok(()) => info!(%message, "Prolonged presence notification sent"),
            Err(e) => warn!(
                error = %e,
                path = PROLONGED_NOTIFICATION_PATH,
                "Failed to send prolonged presence notification"
            ),
        }
    }

    /// Record the id that was just granted access.
    pub async fn record_match(&self, id: FingerprintId) {
        if !self.ready_for("last matched id") {
            return;
        }
        match self.store.set_int(LAST_UID_PATH, i64::from(id.as_u16())).await {
            Ok(()) => info!(fingerprint_id = %id, "Matched fingerprint id sent"),
            Err(e) => warn!(
                error = %e,
                path = LAST_UID_PATH,
                "Failed to send matched fingerprint id"
            ),
        }
    }

    /// Append a freshly enrolled id to the registered list.
    pub async fn record_enrollment(&self, id: FingerprintId) {
        if !self.ready_for("registered id") {
            return;
        }
        match self
            .store
            .push_int(REGISTERED_UIDS_PATH, i64::from(id.as_u16()))
            .await
        {
            Ok(key) => info!(fingerprint_id = %id, %key, "Registered fingerprint id added"),
            Err(e) => warn!(
                error = %e,
                path = REGISTERED_UIDS_PATH,
                "Failed to add registered fingerprint id"
            ),
        }
    }

    /// Read the remote door command.
    ///
    /// Returns `None` when the store is not ready, the read fails or no
    /// command is stored.
    pub async fn poll_door_command(&self) -> Option<DoorCommand> {
        if !self.store.is_ready() {
            debug!("Remote store not ready, skipping door command poll");
            return None;
        }
        match self.store.get_string(DOOR_CONTROL_PATH).await {
            Ok(value) => value.map(|raw| DoorCommand::parse(&raw)),
            Err(e) => {
                warn!(error = %e, path = DOOR_CONTROL_PATH, "Failed to read door command");
                None
            }
        }
    }

    /// Reset the door command after acting on an unlock.
    pub async fn acknowledge_unlock(&self) {
        if !self.ready_for("door command reset") {
            return;
        }
        if let Err(e) = self
            .store
            .set_string(DOOR_CONTROL_PATH, DOOR_COMMAND_LOCKED)
            .await
        {
            error!(error = %e, path = DOOR_CONTROL_PATH, "Failed to reset door command");
        }
    }

    /// Delete the registered id list and the last matched id.
    ///
    /// Both deletions are attempted even if the first fails. Returns `false`
    /// only when the store was not ready.
    pub async fn clear_fingerprints(&self) -> bool {
        if !self.ready_for("fingerprint records clear") {
            return false;
        }
        for path in [REGISTERED_UIDS_PATH, LAST_UID_PATH] {
            match self.store.delete(path).await {
                Ok(()) => info!(path, "Remote fingerprint records cleared"),
                Err(e) => warn!(error = %e, path, "Failed to clear remote fingerprint records"),
            }
        }
        true
    }

    fn ready_for(&self, what: &str) -> bool {
        let ready = self.store.is_ready();
        if !ready {
            warn!(what, "Remote store not ready");
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_network::MemoryStore;
    use doorlock_network::store::StoreOp;
    use serde_json::json;

    async fn mirror() -> (RemoteMirror, MemoryStore) {
        let store = MemoryStore::new();
        let mut mirror = RemoteMirror::new(AnyRemoteStore::Memory(store.clone()));
        mirror.connect().await.unwrap();
        (mirror, store)
    }

    #[tokio::test]
    async fn test_notify_proximity_overwrites() {
        let (mirror, store) = mirror().await;
        mirror.notify_proximity(DistanceCm::new(9)).await;
        mirror.notify_proximity(DistanceCm::new(4)).await;

        assert_eq!(
            store.value(NOTIFICATION_PATH),
            Some(json!("Object detected at 4 cm"))
        );
    }

    #[tokio::test]
    async fn test_prolonged_message_quotes_threshold() {
        let (mirror, store) = mirror().await;
        let mirror = mirror.with_proximity_threshold(20);
        mirror.notify_prolonged_presence(Duration::from_secs(5)).await;

        assert_eq!(
            store.value(PROLONGED_NOTIFICATION_PATH),
            Some(json!("Object detected <20cm for 5s"))
        );
    }

    #[tokio::test]
    async fn test_record_match_and_enrollment() {
        let (mirror, store) = mirror().await;
        mirror.record_match(FingerprintId::new(1)).await;
        mirror.record_enrollment(FingerprintId::new(1)).await;
        mirror.record_enrollment(FingerprintId::new(1)).await;

        assert_eq!(store.value(LAST_UID_PATH), Some(json!(1)));
        assert_eq!(store.children(REGISTERED_UIDS_PATH), vec![json!(1), json!(1)]);
    }

    #[tokio::test]
    async fn test_poll_door_command() {
        let (mirror, store) = mirror().await;
        assert_eq!(mirror.poll_door_command().await, None);

        store.seed(DOOR_CONTROL_PATH, json!("unlock"));
        assert_eq!(mirror.poll_door_command().await, Some(DoorCommand::Unlock));

        mirror.acknowledge_unlock().await;
        assert_eq!(mirror.poll_door_command().await, Some(DoorCommand::Locked));
    }

    #[tokio::test]
    async fn test_poll_tolerates_wrong_type() {
        let (mirror, store) = mirror().await;
        store.seed(DOOR_CONTROL_PATH, json!(1));
        assert_eq!(mirror.poll_door_command().await, None);
    }

    #[tokio::test]
    async fn test_not_ready_skips_everything() {
        let store = MemoryStore::new();
        let mirror = RemoteMirror::new(AnyRemoteStore::Memory(store.clone()));

        mirror.notify_proximity(DistanceCm::new(3)).await;
        mirror.record_match(FingerprintId::new(1)).await;
        assert_eq!(mirror.poll_door_command().await, None);
        assert!(!mirror.clear_fingerprints().await);
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_clear_attempts_both_paths_when_failing() {
        let (mirror, store) = mirror().await;
        store.set_failing(true);

        assert!(mirror.clear_fingerprints().await);
        assert_eq!(
            store.operations(),
            vec![
                StoreOp::Delete {
                    path: REGISTERED_UIDS_PATH.to_string()
                },
                StoreOp::Delete {
                    path: LAST_UID_PATH.to_string()
                },
            ]
        );
    }
}

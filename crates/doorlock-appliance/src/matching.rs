//! Fingerprint match flow.
//!
//! Attempts run for up to `match_window`, spaced by `match_retry`. An
//! attempt succeeds when a finger image is taken, converted into slot 1 and
//! found in the sensor library. The first success records the id remotely
//! and pulses the lock; exhausting the window shows "Access Denied".

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use doorlock_core::FingerprintId;
use doorlock_hardware::traits::FingerprintDevice;
use doorlock_hardware::{ImageCapture, TemplateSlot};

use crate::appliance::Appliance;

/// Result of a match attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Granted(FingerprintId),
    Denied,
    Cancelled,
}

impl Appliance {
    /// Run the match flow, opening the door on success.
    pub async fn match_fingerprint(&mut self, cancel: &CancellationToken) -> MatchOutcome {
        self.screen.show("Scan Finger", "").await;

        let start = Instant::now();
        while start.elapsed() < self.config.match_window {
            if cancel.is_cancelled() {
                return MatchOutcome::Cancelled;
            }

            if let Some(id) = self.search_once().await {
                self.screen
                    .show("Access Granted", &format!("UID: {}", id))
                    .await;
                info!(fingerprint_id = %id, "Fingerprint matched");
                self.mirror.record_match(id).await;
                self.lock.open_door(&mut self.screen).await;
                return MatchOutcome::Granted(id);
            }

            tokio::select! {
                _ = cancel.cancelled() => return MatchOutcome::Cancelled,
                _ = tokio::time::sleep(self.config.match_retry) => {}
            }
        }

        info!("No fingerprint match");
        self.screen
            .notice("Access Denied", "", self.config.notice)
            .await;
        MatchOutcome::Denied
    }

    /// One capture, convert and search attempt.
    async fn search_once(&mut self) -> Option<FingerprintId> {
        match self.fingerprint.capture_image().await {
            Ok(ImageCapture::Taken) => {}
            Ok(other) => {
                debug!(?other, "No fingerprint image");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "Fingerprint capture failed");
                return None;
            }
        }

        if let Err(e) = self.fingerprint.image_to_template(TemplateSlot::One).await {
            debug!(error = %e, "Fingerprint conversion failed");
            return None;
        }

        match self.fingerprint.fast_search().await {
            Ok(Some(hit)) => {
                debug!(confidence = hit.confidence, "Fingerprint search hit");
                Some(hit.id)
            }
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Fingerprint search failed");
                None
            }
        }
    }
}

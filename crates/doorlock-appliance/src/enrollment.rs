//! Fingerprint enrollment flow.
//!
//! Two captures of the same finger are converted into the sensor's two
//! template slots, combined into a model and stored under the configured
//! enrollment id:
//!
//! 1. "Place Finger", capture, convert into slot 1.
//! 2. "Remove Finger", wait until the sensor sees no finger.
//! 3. "Place Again", capture, convert into slot 2.
//! 4. Build the model, store it, push the id to the remote list.
//!
//! Every wait for the finger is bounded by `capture_timeout` and watches
//! the cancellation token. Any failure abandons the flow without storing or
//! pushing anything.

use std::fmt;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use doorlock_core::FingerprintId;
use doorlock_hardware::traits::FingerprintDevice;
use doorlock_hardware::{ImageCapture, TemplateSlot};

use crate::appliance::Appliance;
use crate::screen::Row;

/// Result of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Registered(FingerprintId),
    Aborted(EnrollmentAbort),
}

/// Why an enrollment was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentAbort {
    /// No finger (or no removal) within the capture timeout.
    TimedOut,
    Cancelled,
    /// The image could not be converted into the given slot.
    TemplateFailed(TemplateSlot),
    /// The two templates did not combine into a model.
    ModelFailed,
    /// The sensor refused to store the model.
    StoreFailed,
}

impl fmt::Display for EnrollmentAbort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnrollmentAbort::TimedOut => write!(f, "timed out"),
            EnrollmentAbort::Cancelled => write!(f, "cancelled"),
            EnrollmentAbort::TemplateFailed(slot) => {
                write!(f, "template {} conversion failed", slot.as_u8())
            }
            EnrollmentAbort::ModelFailed => write!(f, "model creation failed"),
            EnrollmentAbort::StoreFailed => write!(f, "model store failed"),
        }
    }
}

impl Appliance {
    /// Run the enrollment flow.
    pub async fn enroll_fingerprint(&mut self, cancel: &CancellationToken) -> EnrollmentOutcome {
        match self.try_enroll(cancel).await {
            Ok(id) => EnrollmentOutcome::Registered(id),
            Err(reason) => {
                warn!(%reason, "Enrollment abandoned");
                EnrollmentOutcome::Aborted(reason)
            }
        }
    }

    async fn try_enroll(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<FingerprintId, EnrollmentAbort> {
        let id = self.config.enrollment_id;

        self.screen.show("Place Finger", "").await;
        self.wait_for_image(cancel).await?;
        self.convert_image(TemplateSlot::One).await?;

        self.screen
            .notice("Remove Finger", "", self.config.notice)
            .await;
        self.wait_for_removal(cancel).await?;

        self.screen.show("Place Again", "").await;
        self.wait_for_image(cancel).await?;
        self.convert_image(TemplateSlot::Two).await?;

        if let Err(e) = self.fingerprint.create_model().await {
            warn!(error = %e, "Failed to create fingerprint model");
            self.screen.notice("Model fail", "", self.config.notice).await;
            return Err(EnrollmentAbort::ModelFailed);
        }

        let stored = self.fingerprint.store_model(id).await;
        let result = match stored {
            Ok(()) => {
                self.screen
                    .show("Registered!", &format!("ID: {}", id))
                    .await;
                info!(fingerprint_id = %id, "Fingerprint registered");
                self.mirror.record_enrollment(id).await;
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, fingerprint_id = %id, "Failed to store fingerprint model");
                self.screen.notice("Save failed", "", self.config.notice).await;
                Err(EnrollmentAbort::StoreFailed)
            }
        };
        tokio::time::sleep(self.config.notice).await;
        result
    }

    async fn convert_image(&mut self, slot: TemplateSlot) -> Result<(), EnrollmentAbort> {
        if let Err(e) = self.fingerprint.image_to_template(slot).await {
            warn!(error = %e, slot = slot.as_u8(), "Failed to convert fingerprint image");
            self.screen
                .notice("Template fail", "", self.config.notice)
                .await;
            return Err(EnrollmentAbort::TemplateFailed(slot));
        }
        Ok(())
    }

    /// Poll image capture until a finger image is taken.
    async fn wait_for_image(&mut self, cancel: &CancellationToken) -> Result<(), EnrollmentAbort> {
        let deadline = Instant::now() + self.config.capture_timeout;
        loop {
            if cancel.is_cancelled() {
                return Err(EnrollmentAbort::Cancelled);
            }

            let status = match self.fingerprint.capture_image().await {
                Ok(ImageCapture::Taken) => {
                    self.screen.set_row(Row::Bottom, "Image taken").await;
                    return Ok(());
                }
                Ok(ImageCapture::NoFinger) => Some("Waiting..."),
                Ok(ImageCapture::ImageFail) => Some("Image fail"),
                Err(e) if e.is_communication() => Some("Comm error"),
                Err(e) => {
                    debug!(error = %e, "Unexpected capture response");
                    None
                }
            };
            if let Some(status) = status {
                self.screen.set_row(Row::Bottom, status).await;
            }

            self.pause_capture(deadline, cancel).await?;
        }
    }

    /// Poll image capture until the sensor reports no finger.
    async fn wait_for_removal(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), EnrollmentAbort> {
        let deadline = Instant::now() + self.config.capture_timeout;
        loop {
            if cancel.is_cancelled() {
                return Err(EnrollmentAbort::Cancelled);
            }
            match self.fingerprint.capture_image().await {
                Ok(ImageCapture::NoFinger) => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Capture failed while waiting for removal"),
            }
            self.pause_capture(deadline, cancel).await?;
        }
    }

    /// Sleep one capture poll, failing once the deadline has passed.
    async fn pause_capture(
        &mut self,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), EnrollmentAbort> {
        if Instant::now() >= deadline {
            self.screen.notice("Timed out", "", self.config.notice).await;
            return Err(EnrollmentAbort::TimedOut);
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(EnrollmentAbort::Cancelled),
            _ = tokio::time::sleep(self.config.capture_poll) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplianceConfig;
    use crate::testing::{TestRig, rig};
    use doorlock_core::constants::REGISTERED_UIDS_PATH;
    use doorlock_hardware::{SensorCode, SensorCommand};
    use serde_json::json;
    use std::time::Duration;

    async fn booted() -> TestRig {
        let mut rig = rig(ApplianceConfig::default());
        rig.appliance.boot().await;
        rig
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_registers_and_pushes_once() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        board.fingerprint.queue_empty(3);
        board.fingerprint.touch(42);
        board.fingerprint.queue_empty(1);
        board.fingerprint.touch(42);

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Registered(FingerprintId::new(1)));
        assert_eq!(board.fingerprint.library().get(&1), Some(&42));
        assert_eq!(store.children(REGISTERED_UIDS_PATH), vec![json!(1)]);
        for text in ["Place Finger", "Waiting...", "Image taken", "Remove Finger", "Place Again"] {
            assert!(board.display.has_shown(text), "missing {text:?}");
        }
        assert_eq!(board.display.current(), vec!["Registered!", "ID: 1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_finger_removal() {
        let TestRig {
            mut appliance,
            board,
            ..
        } = booted().await;
        board.fingerprint.touch(5);
        // Finger stays on for two more polls after the first capture.
        board.fingerprint.touch(5);
        board.fingerprint.touch(5);
        board.fingerprint.queue_empty(1);
        board.fingerprint.touch(5);

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Registered(FingerprintId::new(1)));
        assert_eq!(board.fingerprint.command_count(SensorCommand::CaptureImage), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_timeout_aborts() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        let start = Instant::now();

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Aborted(EnrollmentAbort::TimedOut));
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(board.display.has_shown("Timed out"));
        assert!(board.fingerprint.library().is_empty());
        assert!(store.children(REGISTERED_UIDS_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_timeout_aborts() {
        let TestRig {
            mut appliance,
            board,
            ..
        } = booted().await;
        board.fingerprint.rest_finger(Some(8));

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Aborted(EnrollmentAbort::TimedOut));
        assert!(board.display.has_shown("Remove Finger"));
        assert!(!board.display.has_shown("Place Again"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_immediately() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let outcome = appliance.enroll_fingerprint(&cancel).await;

        assert_eq!(outcome, EnrollmentOutcome::Aborted(EnrollmentAbort::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!board.display.has_shown("Timed out"));
        assert!(store.children(REGISTERED_UIDS_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_template_failure_aborts() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        board.fingerprint.touch(1);
        board.fingerprint.fail_next(
            SensorCommand::ImageToTemplate(TemplateSlot::One),
            SensorCode::ImageMessy,
        );

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(
            outcome,
            EnrollmentOutcome::Aborted(EnrollmentAbort::TemplateFailed(TemplateSlot::One))
        );
        assert!(board.display.has_shown("Template fail"));
        assert!(store.children(REGISTERED_UIDS_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_fingers_fail_model() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        board.fingerprint.touch(1);
        board.fingerprint.queue_empty(1);
        board.fingerprint.touch(2);

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Aborted(EnrollmentAbort::ModelFailed));
        assert!(board.display.has_shown("Model fail"));
        assert!(board.fingerprint.library().is_empty());
        assert!(store.children(REGISTERED_UIDS_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_aborts() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = booted().await;
        board.fingerprint.touch(3);
        board.fingerprint.queue_empty(1);
        board.fingerprint.touch(3);
        board.fingerprint.fail_next(
            SensorCommand::StoreModel(FingerprintId::new(1)),
            SensorCode::FlashError,
        );

        let outcome = appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert_eq!(outcome, EnrollmentOutcome::Aborted(EnrollmentAbort::StoreFailed));
        assert!(board.display.has_shown("Save failed"));
        assert!(store.children(REGISTERED_UIDS_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_status_lines() {
        let TestRig {
            mut appliance,
            board,
            ..
        } = booted().await;
        board
            .fingerprint
            .fail_next(SensorCommand::CaptureImage, SensorCode::PacketReceiveError);
        board
            .fingerprint
            .fail_next(SensorCommand::CaptureImage, SensorCode::ImageFail);
        board.fingerprint.touch(4);
        board.fingerprint.queue_empty(1);
        board.fingerprint.touch(4);

        appliance.enroll_fingerprint(&CancellationToken::new()).await;

        assert!(board.display.has_shown("Comm error"));
        assert!(board.display.has_shown("Image fail"));
    }
}

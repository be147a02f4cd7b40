//! Keypad command dispatcher.
//!
//! | Key | Command |
//! |---|---|
//! | `A` | Enroll a fingerprint |
//! | `B` | Unlock with a fingerprint |
//! | `C` | Emergency unlock |
//! | `D` | Clear every fingerprint record |
//! | `*` | Reset network provisioning |
//!
//! `A` and `B` are refused with a notice when the sensor failed its boot
//! handshake. `C` never depends on the sensor. Any other key is ignored.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use doorlock_hardware::KeypadInput;
use doorlock_hardware::traits::FingerprintDevice;

use crate::appliance::{Appliance, LoopExit};
use crate::screen::Row;

/// A keypad key mapped to what it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Enroll,
    Match,
    EmergencyOpen,
    ClearFingerprints,
    ResetProvisioning,
    Invalid(KeypadInput),
}

impl From<KeypadInput> for KeyCommand {
    fn from(input: KeypadInput) -> Self {
        match input {
            KeypadInput::Letter('A') => KeyCommand::Enroll,
            KeypadInput::Letter('B') => KeyCommand::Match,
            KeypadInput::Letter('C') => KeyCommand::EmergencyOpen,
            KeypadInput::Letter('D') => KeyCommand::ClearFingerprints,
            KeypadInput::Star => KeyCommand::ResetProvisioning,
            other => KeyCommand::Invalid(other),
        }
    }
}

impl KeyCommand {
    /// Returns `true` for commands that need the fingerprint sensor.
    pub fn needs_fingerprint(&self) -> bool {
        matches!(self, KeyCommand::Enroll | KeyCommand::Match)
    }
}

impl fmt::Display for KeyCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyCommand::Enroll => write!(f, "Enroll"),
            KeyCommand::Match => write!(f, "Match"),
            KeyCommand::EmergencyOpen => write!(f, "EmergencyOpen"),
            KeyCommand::ClearFingerprints => write!(f, "ClearFingerprints"),
            KeyCommand::ResetProvisioning => write!(f, "ResetProvisioning"),
            KeyCommand::Invalid(key) => write!(f, "Invalid({})", key),
        }
    }
}

impl Appliance {
    /// Execute one keypad command.
    ///
    /// Returns `Some` when the command ends the loop.
    pub async fn dispatch(
        &mut self,
        command: KeyCommand,
        cancel: &CancellationToken,
    ) -> Option<LoopExit> {
        if command.needs_fingerprint() && !self.state.fingerprint_available {
            warn!(%command, "Fingerprint sensor unavailable");
            self.fingerprint_error_notice().await;
            return None;
        }

        match command {
            KeyCommand::Enroll => {
                let outcome = self.enroll_fingerprint(cancel).await;
                info!(?outcome, "Enrollment finished");
            }
            KeyCommand::Match => {
                let outcome = self.match_fingerprint(cancel).await;
                info!(?outcome, "Fingerprint match finished");
            }
            KeyCommand::EmergencyOpen => self.lock.emergency_open(&mut self.screen).await,
            KeyCommand::ClearFingerprints => self.clear_all_fingerprints().await,
            KeyCommand::ResetProvisioning => return Some(self.reset_provisioning().await),
            KeyCommand::Invalid(key) => info!(%key, "Invalid key"),
        }
        None
    }

    async fn fingerprint_error_notice(&mut self) {
        self.screen
            .notice("FP Error", "Press C to open", self.config.notice)
            .await;
    }

    /// Erase every sensor template, then the remote fingerprint records.
    ///
    /// Both steps always run; neither depends on the other succeeding.
    pub async fn clear_all_fingerprints(&mut self) {
        self.screen.show("Clearing Data...", "").await;

        match self.fingerprint.empty_library().await {
            Ok(()) => {
                info!("All fingerprints cleared from sensor");
                self.screen.set_row(Row::Bottom, "FP Cleared").await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear fingerprints from sensor");
                self.screen.set_row(Row::Bottom, "FP Clear Failed").await;
            }
        }
        tokio::time::sleep(self.config.notice).await;

        if self.mirror.clear_fingerprints().await {
            self.screen.notice("Firebase Cleared", "", self.config.notice).await;
        } else {
            self.screen.notice("Firebase Error", "", self.config.notice).await;
        }
        self.screen.show_idle().await;
    }
}

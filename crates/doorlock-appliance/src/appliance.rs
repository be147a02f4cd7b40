//! The appliance control loop.
//!
//! # Boot
//!
//! [`Appliance::boot`] runs once: splash screen, network provisioning,
//! remote store readiness, fingerprint sensor handshake, relay secured, idle
//! prompt. Provisioning failure asks for a restart; a remote store that
//! cannot be reached halts the appliance.
//!
//! # Loop
//!
//! Each pass of [`Appliance::run_once`] is fully sequential:
//!
//! 1. Poll the keypad and dispatch at most one command.
//! 2. Re-render the idle prompt.
//! 3. Check the distance sensor.
//! 4. Sleep for the loop delay.
//! 5. Poll the remote door command.
//!
//! # Examples
//!
//! ```
//! use doorlock_appliance::{Appliance, ApplianceConfig, BootOutcome};
//! use doorlock_hardware::Peripherals;
//! use doorlock_network::{AnyProvisioner, AnyRemoteStore, MemoryStore, MockProvisioner};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() {
//!     let (peripherals, handles) = Peripherals::mock();
//!     let mut appliance = Appliance::new(
//!         peripherals,
//!         AnyRemoteStore::Memory(MemoryStore::new()),
//!         AnyProvisioner::Mock(MockProvisioner::connected()),
//!         ApplianceConfig::default(),
//!     );
//!
//!     assert_eq!(appliance.boot().await, BootOutcome::Ready);
//!
//!     handles.keypad.press('C').await.unwrap();
//!     appliance.run_once(&CancellationToken::new()).await;
//!     assert_eq!(handles.relay.pulse_count(), 1);
//! }
//! ```

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use doorlock_core::DoorCommand;
use doorlock_hardware::Peripherals;
use doorlock_hardware::devices::{AnyFingerprintDevice, AnyKeypadDevice};
use doorlock_hardware::traits::{FingerprintDevice, KeypadDevice};
use doorlock_network::{AnyProvisioner, AnyRemoteStore, Provisioner};

use crate::config::ApplianceConfig;
use crate::dispatcher::KeyCommand;
use crate::distance::DistanceMonitor;
use crate::lock::LockActuator;
use crate::mirror::RemoteMirror;
use crate::screen::{Row, Screen};
use crate::state::ApplianceState;

/// Result of [`Appliance::boot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// Enter the control loop.
    Ready,
    /// Provisioning failed; restart the device.
    Restart,
    /// The remote store is unreachable; idle until shut down.
    Halt,
}

/// Why [`Appliance::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A provisioning reset asked for a device restart.
    Restart,
    /// The cancellation token fired.
    Shutdown,
}

/// The door lock appliance.
#[derive(Debug)]
pub struct Appliance {
    pub(crate) config: ApplianceConfig,
    pub(crate) state: ApplianceState,
    pub(crate) keypad: AnyKeypadDevice,
    pub(crate) fingerprint: AnyFingerprintDevice,
    pub(crate) screen: Screen,
    pub(crate) lock: LockActuator,
    pub(crate) distance: DistanceMonitor,
    pub(crate) mirror: RemoteMirror,
    pub(crate) provisioner: AnyProvisioner,
}

impl Appliance {
    pub fn new(
        peripherals: Peripherals,
        store: AnyRemoteStore,
        provisioner: AnyProvisioner,
        config: ApplianceConfig,
    ) -> Self {
        let Peripherals {
            keypad,
            fingerprint,
            display,
            relay,
            sonar,
        } = peripherals;

        Self {
            state: ApplianceState::default(),
            keypad,
            fingerprint,
            screen: Screen::new(display),
            lock: LockActuator::new(relay, &config),
            distance: DistanceMonitor::new(sonar, &config),
            mirror: RemoteMirror::new(store)
                .with_proximity_threshold(config.proximity_threshold_cm),
            provisioner,
            config,
        }
    }

    pub fn config(&self) -> &ApplianceConfig {
        &self.config
    }

    pub fn state(&self) -> &ApplianceState {
        &self.state
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Run the boot sequence.
    pub async fn boot(&mut self) -> BootOutcome {
        self.screen.set_backlight(true).await;
        self.screen
            .notice("Initializing...", "", self.config.boot_splash)
            .await;

        self.screen.show("WiFi Setup", "Access Point").await;
        match self.provisioner.auto_connect(&self.config.portal_name).await {
            Ok(credentials) => {
                info!(ssid = %credentials.ssid, "Network connected");
                self.screen.show("WiFi Connected", "").await;
            }
            Err(e) => {
                error!(error = %e, "Network provisioning failed");
                self.screen
                    .notice("WiFi Failed!", "", self.config.notice)
                    .await;
                return BootOutcome::Restart;
            }
        }

        if let Err(e) = self.mirror.connect().await {
            error!(error = %e, "Remote store setup failed");
            return BootOutcome::Halt;
        }
        info!("Remote store ready");

        self.state.fingerprint_available = match self.fingerprint.verify_password().await {
            Ok(true) => {
                info!("Fingerprint sensor found");
                true
            }
            Ok(false) => {
                warn!("Fingerprint sensor rejected the password");
                false
            }
            Err(e) => {
                warn!(error = %e, "Fingerprint sensor not found");
                false
            }
        };
        if !self.state.fingerprint_available {
            self.screen.set_row(Row::Top, "Fingerprint Error").await;
        }

        self.lock.secure().await;
        self.screen.show_idle().await;
        BootOutcome::Ready
    }

    /// Run one pass of the control loop.
    ///
    /// Returns `Some` when the loop should stop.
    pub async fn run_once(&mut self, cancel: &CancellationToken) -> Option<LoopExit> {
        match self.keypad.poll_key().await {
            Ok(Some(key)) => {
                info!(%key, "Key pressed");
                if let Some(exit) = self.dispatch(KeyCommand::from(key), cancel).await {
                    return Some(exit);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Keypad read failed"),
        }

        self.screen.show_idle().await;
        self.distance
            .check(&mut self.state.proximity, &mut self.screen, &self.mirror)
            .await;

        tokio::select! {
            _ = cancel.cancelled() => return Some(LoopExit::Shutdown),
            _ = tokio::time::sleep(self.config.loop_delay) => {}
        }

        self.poll_remote_command().await;
        None
    }

    /// Run passes until a restart is requested or `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) -> LoopExit {
        info!("Control loop started");
        loop {
            if cancel.is_cancelled() {
                info!("Control loop stopped");
                return LoopExit::Shutdown;
            }
            if let Some(exit) = self.run_once(&cancel).await {
                info!(?exit, "Control loop finished");
                return exit;
            }
        }
    }

    /// Act on the remote door command, if any.
    ///
    /// Returns `true` when the door was opened.
    pub async fn poll_remote_command(&mut self) -> bool {
        match self.mirror.poll_door_command().await {
            Some(DoorCommand::Unlock) => {
                info!("Unlock command received");
                self.lock.open_door(&mut self.screen).await;
                self.mirror.acknowledge_unlock().await;
                true
            }
            Some(other) => {
                debug!(command = %other, "Door command ignored");
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestRig, rig};
    use doorlock_core::constants::DOOR_CONTROL_PATH;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_boot_ready() {
        let TestRig {
            mut appliance,
            board,
            ..
        } = rig(ApplianceConfig::default());

        assert_eq!(appliance.boot().await, BootOutcome::Ready);
        assert!(appliance.state().fingerprint_available);
        assert!(appliance.mirror.is_ready());
        assert!(board.display.has_shown("Initializing..."));
        assert!(board.display.has_shown("WiFi Connected"));
        assert!(board.display.backlight());
        assert_eq!(board.display.current(), vec!["Press C", "To Unlock"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_command_other_value_ignored() {
        let TestRig {
            mut appliance,
            board,
            store,
            ..
        } = rig(ApplianceConfig::default());
        appliance.boot().await;
        store.seed(DOOR_CONTROL_PATH, json!("open"));

        assert!(!appliance.poll_remote_command().await);
        assert_eq!(board.relay.pulse_count(), 0);
        assert_eq!(store.value(DOOR_CONTROL_PATH), Some(json!("open")));
    }
}

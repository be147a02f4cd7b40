//! Lock actuator.
//!
//! The lock only ever opens as a timed pulse: the relay is energized for the
//! unlock interval and then dropped again. A pulse is never cut short, even
//! by shutdown.

use std::time::Duration;

use tracing::{error, info, warn};

use doorlock_core::LockState;
use doorlock_hardware::devices::AnyRelayDevice;
use doorlock_hardware::traits::RelayDevice;

use crate::config::ApplianceConfig;
use crate::screen::Screen;

/// Drives the lock relay.
#[derive(Debug)]
pub struct LockActuator {
    relay: AnyRelayDevice,
    unlock: Duration,
    closed_hold: Duration,
}

impl LockActuator {
    pub fn new(relay: AnyRelayDevice, config: &ApplianceConfig) -> Self {
        Self {
            relay,
            unlock: config.unlock,
            closed_hold: config.closed_hold,
        }
    }

    /// Current lock state as reported by the relay.
    pub async fn lock_state(&self) -> doorlock_hardware::Result<LockState> {
        self.relay.is_energized().await.map(LockState::from)
    }

    /// Drive the relay low, as at boot.
    pub async fn secure(&mut self) {
        self.release().await;
        match self.lock_state().await {
            Ok(state) => info!(%state, "Lock secured"),
            Err(e) => warn!(error = %e, "Failed to read lock state"),
        }
    }

    /// Pulse the lock open, then restore the idle prompt.
    ///
    /// Shows "Opening Door...", keeps the relay energized for the unlock
    /// interval, shows "Door Closed" for the closed hold.
    pub async fn open_door(&mut self, screen: &mut Screen) {
        screen.show("Opening Door...", "").await;
        info!(unlock_ms = self.unlock.as_millis() as u64, "Relay on, door opening");
        if let Err(e) = self.relay.set_energized(true).await {
            error!(error = %e, "Failed to energize lock relay");
        }

        tokio::time::sleep(self.unlock).await;
        self.release().await;

        screen.show("Door Closed", "").await;
        info!("Relay off, door closed");
        tokio::time::sleep(self.closed_hold).await;
        screen.show_idle().await;
    }

    /// Unlock without any credential check.
    pub async fn emergency_open(&mut self, screen: &mut Screen) {
        screen.show("Emergency Open", "").await;
        warn!("Emergency open");
        self.open_door(screen).await;
    }

    /// De-energize the relay, retrying once.
    async fn release(&mut self) {
        let Err(first) = self.relay.set_energized(false).await else {
            return;
        };
        error!(error = %first, "Failed to de-energize lock relay, retrying");
        if let Err(e) = self.relay.set_energized(false).await {
            error!(error = %e, "Lock relay may still be energized");
        }
    }
}

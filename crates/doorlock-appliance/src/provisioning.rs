//! Network provisioning reset (`*` key).

use tracing::{error, info};

use doorlock_network::Provisioner;

use crate::appliance::{Appliance, LoopExit};

impl Appliance {
    /// Erase the stored network credentials and ask for a restart.
    ///
    /// The restart is requested even when erasing fails, so the device
    /// always comes back through the boot sequence.
    pub async fn reset_provisioning(&mut self) -> LoopExit {
        self.screen
            .notice("Resetting WiFi", "Please Wait...", self.config.notice)
            .await;

        match self.provisioner.reset_settings().await {
            Ok(()) => info!("Network credentials erased"),
            Err(e) => error!(error = %e, "Failed to erase network credentials"),
        }

        self.screen
            .notice("WiFi Reset!", "Restarting...", self.config.notice)
            .await;
        LoopExit::Restart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplianceConfig;
    use crate::dispatcher::KeyCommand;
    use crate::testing::{TestRig, rig};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_reset_requests_restart() {
        let TestRig {
            mut appliance,
            board,
            provisioner,
            ..
        } = rig(ApplianceConfig::default());
        appliance.boot().await;

        let exit = appliance
            .dispatch(KeyCommand::ResetProvisioning, &CancellationToken::new())
            .await;

        assert_eq!(exit, Some(LoopExit::Restart));
        assert_eq!(provisioner.reset_count(), 1);
        assert!(provisioner.credentials().is_none());
        assert!(board.display.has_shown("Resetting WiFi"));
        assert_eq!(board.display.current(), vec!["WiFi Reset!", "Restarting..."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reset_still_restarts() {
        let TestRig {
            mut appliance,
            provisioner,
            ..
        } = rig(ApplianceConfig::default());
        appliance.boot().await;
        provisioner.set_fail_reset(true);

        assert_eq!(appliance.reset_provisioning().await, LoopExit::Restart);
        assert!(provisioner.credentials().is_some());
    }
}

//! Scripted provisioner for tests and development.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Credentials, Provisioner, ProvisioningResult};
use crate::error::ProvisioningError;

#[derive(Debug)]
struct MockState {
    credentials: Option<Credentials>,
    portals_opened: Vec<String>,
    resets: usize,
    fail_reset: bool,
}

/// Provisioner whose stored credentials are set directly.
///
/// Clones share state. With no credentials stored, `auto_connect` fails
/// immediately as if the portal window had closed.
#[derive(Debug, Clone)]
pub struct MockProvisioner {
    state: Arc<Mutex<MockState>>,
}

impl MockProvisioner {
    /// A provisioner that already holds credentials.
    pub fn connected() -> Self {
        Self::with_credentials(Some(Credentials {
            ssid: "mock-network".to_string(),
            passphrase: String::new(),
        }))
    }

    /// A provisioner with nothing stored.
    pub fn unprovisioned() -> Self {
        Self::with_credentials(None)
    }

    pub fn with_credentials(credentials: Option<Credentials>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                credentials,
                portals_opened: Vec::new(),
                resets: 0,
                fail_reset: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.lock().credentials.clone()
    }

    /// Names of the portals opened so far.
    pub fn portals_opened(&self) -> Vec<String> {
        self.lock().portals_opened.clone()
    }

    pub fn reset_count(&self) -> usize {
        self.lock().resets
    }

    pub fn set_fail_reset(&self, fail: bool) {
        self.lock().fail_reset = fail;
    }
}

impl Provisioner for MockProvisioner {
    async fn auto_connect(&mut self, portal_name: &str) -> ProvisioningResult<Credentials> {
        let mut state = self.lock();
        if let Some(credentials) = &state.credentials {
            return Ok(credentials.clone());
        }
        state.portals_opened.push(portal_name.to_string());
        Err(ProvisioningError::PortalTimeout {
            portal: portal_name.to_string(),
            window_ms: 0,
        })
    }

    async fn reset_settings(&mut self) -> ProvisioningResult<()> {
        let mut state = self.lock();
        state.resets += 1;
        if state.fail_reset {
            return Err(ProvisioningError::Other(
                "simulated credential store failure".to_string(),
            ));
        }
        state.credentials = None;
        Ok(())
    }
}

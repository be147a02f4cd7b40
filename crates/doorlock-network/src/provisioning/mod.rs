//! Network provisioning.
//!
//! At boot the appliance asks its [`Provisioner`] for network credentials.
//! When none are stored a setup portal is opened and the provisioner waits
//! for a person to supply them; an admin key later erases them again.
//!
//! The portal itself is an external tool; on Linux it writes the credentials
//! file watched by [`FileProvisioner`].

#![allow(async_fn_in_trait)]

mod file;
mod mock;

use serde::{Deserialize, Serialize};

pub use file::{DEFAULT_PORTAL_WINDOW, FileProvisioner};
pub use mock::MockProvisioner;

use crate::error::ProvisioningError;

/// Result type alias for provisioning operations.
pub type ProvisioningResult<T> = std::result::Result<T, ProvisioningError>;

/// Network credentials as written by the setup portal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub ssid: String,
    #[serde(default)]
    pub passphrase: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Obtains and erases network credentials.
pub trait Provisioner: Send {
    /// Return the stored credentials, opening the setup portal named
    /// `portal_name` and waiting for them when none are stored.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::PortalTimeout`] when nobody supplies
    /// credentials within the provisioner's window.
    async fn auto_connect(&mut self, portal_name: &str) -> ProvisioningResult<Credentials>;

    /// Erase the stored credentials so the next boot opens the portal.
    async fn reset_settings(&mut self) -> ProvisioningResult<()>;
}

/// Enum wrapper for provisioner dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyProvisioner {
    File(FileProvisioner),
    Mock(MockProvisioner),
}

impl Provisioner for AnyProvisioner {
    async fn auto_connect(&mut self, portal_name: &str) -> ProvisioningResult<Credentials> {
        match self {
            Self::File(p) => p.auto_connect(portal_name).await,
            Self::Mock(p) => p.auto_connect(portal_name).await,
        }
    }

    async fn reset_settings(&mut self) -> ProvisioningResult<()> {
        match self {
            Self::File(p) => p.reset_settings().await,
            Self::Mock(p) => p.reset_settings().await,
        }
    }
}

//! Settings file of the `doorlock` binary.
//!
//! A single JSON document; every field is optional and falls back to its
//! default. Secrets are never read from here, they come from the
//! environment.
//!
//! ```json
//! {
//!   "board": { "relay_pin": 26 },
//!   "appliance": { "unlock_ms": 5000, "prolonged_presence_ms": 10000 },
//!   "status_addr": "0.0.0.0:8080",
//!   "credentials_path": "/var/lib/doorlock/wifi.json"
//! }
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use doorlock_appliance::ApplianceConfig;
use doorlock_core::constants::{DEFAULT_REMOTE_TIMEOUT_MS, DEFAULT_STATUS_ADDR};
use doorlock_hardware::BoardConfig;
use doorlock_network::provisioning::DEFAULT_PORTAL_WINDOW;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub board: BoardConfig,
    pub appliance: ApplianceConfig,

    /// Bind address of the status endpoint.
    pub status_addr: String,

    /// Credentials file written by the setup portal.
    pub credentials_path: PathBuf,

    /// How long boot waits for the portal to supply credentials.
    pub portal_window_ms: u64,

    /// Timeout of a single remote store request.
    pub remote_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            appliance: ApplianceConfig::default(),
            status_addr: DEFAULT_STATUS_ADDR.to_string(),
            credentials_path: PathBuf::from("/var/lib/doorlock/wifi.json"),
            portal_window_ms: DEFAULT_PORTAL_WINDOW.as_millis() as u64,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Read and validate a settings file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.appliance
            .validate()
            .context("invalid appliance settings")?;
        self.status_addr()?;
        if self.portal_window_ms == 0 {
            anyhow::bail!("portal_window_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn status_addr(&self) -> anyhow::Result<SocketAddr> {
        self.status_addr
            .parse()
            .with_context(|| format!("invalid status_addr {:?}", self.status_addr))
    }

    pub fn portal_window(&self) -> Duration {
        Duration::from_millis(self.portal_window_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

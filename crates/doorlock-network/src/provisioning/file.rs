//! Credentials stored in a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use super::{Credentials, Provisioner, ProvisioningResult};
use crate::error::ProvisioningError;

/// How long the portal waits for credentials by default.
pub const DEFAULT_PORTAL_WINDOW: Duration = Duration::from_secs(180);

const DEFAULT_PORTAL_POLL: Duration = Duration::from_millis(500);

/// Provisioner backed by a credentials file.
///
/// `auto_connect` succeeds immediately when the file exists and otherwise
/// polls for it until the portal window closes.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use doorlock_network::provisioning::{FileProvisioner, Provisioner};
///
/// # async fn example() -> Result<(), doorlock_network::ProvisioningError> {
/// let mut provisioner = FileProvisioner::new("/var/lib/doorlock/wifi.json")
///     .with_window(Duration::from_secs(60));
/// let credentials = provisioner.auto_connect("DoorLock-Setup").await?;
/// println!("joined {}", credentials.ssid);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileProvisioner {
    path: PathBuf,
    window: Duration,
    poll: Duration,
}

impl FileProvisioner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            window: DEFAULT_PORTAL_WINDOW,
            poll: DEFAULT_PORTAL_POLL,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the credentials file; `None` when it does not exist.
    async fn load(&self) -> ProvisioningResult<Option<Credentials>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let credentials: Credentials = serde_json::from_slice(&raw)?;
        if credentials.ssid.trim().is_empty() {
            return Err(ProvisioningError::InvalidCredentials(
                "ssid is empty".to_string(),
            ));
        }
        Ok(Some(credentials))
    }
}

impl Provisioner for FileProvisioner {
    async fn auto_connect(&mut self, portal_name: &str) -> ProvisioningResult<Credentials> {
        if let Some(credentials) = self.load().await? {
            info!(ssid = %credentials.ssid, "Using stored network credentials");
            return Ok(credentials);
        }

        info!(
            portal = portal_name,
            path = %self.path.display(),
            window_secs = self.window.as_secs(),
            "No stored credentials, setup portal open"
        );
        let deadline = Instant::now() + self.window;
        loop {
            sleep(self.poll).await;
            match self.load().await {
                Ok(Some(credentials)) => {
                    info!(ssid = %credentials.ssid, "Credentials received");
                    return Ok(credentials);
                }
                Ok(None) => {}
                // The portal may still be writing the file.
                Err(e) => warn!(error = %e, "Ignoring unreadable credentials file"),
            }
            if Instant::now() >= deadline {
                return Err(ProvisioningError::PortalTimeout {
                    portal: portal_name.to_string(),
                    window_ms: self.window.as_millis() as u64,
                });
            }
        }
    }

    async fn reset_settings(&mut self) -> ProvisioningResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Network credentials erased");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stored_credentials_used_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi.json");
        std::fs::write(&path, r#"{"ssid": "home", "passphrase": "secret"}"#).unwrap();

        let mut provisioner = FileProvisioner::new(&path);
        let credentials = provisioner.auto_connect("DoorLock-Setup").await.unwrap();
        assert_eq!(credentials.ssid, "home");
        assert_eq!(credentials.passphrase, "secret");
    }

    #[tokio::test(start_paused = true)]
    async fn test_portal_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut provisioner =
            FileProvisioner::new(dir.path().join("wifi.json")).with_window(Duration::from_secs(5));

        let err = provisioner.auto_connect("DoorLock-Setup").await.unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::PortalTimeout { window_ms: 5000, .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_ssid_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi.json");
        std::fs::write(&path, r#"{"ssid": " "}"#).unwrap();

        let mut provisioner = FileProvisioner::new(&path);
        assert!(matches!(
            provisioner.auto_connect("DoorLock-Setup").await,
            Err(ProvisioningError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi.json");
        std::fs::write(&path, r#"{"ssid": "home"}"#).unwrap();

        let mut provisioner = FileProvisioner::new(&path);
        provisioner.reset_settings().await.unwrap();
        assert!(!path.exists());
        provisioner.reset_settings().await.unwrap();
    }
}

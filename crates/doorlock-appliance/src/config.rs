//! Appliance configuration.
//!
//! [`ApplianceConfig`] carries every timing and threshold the control loop
//! uses. Defaults come from [`doorlock_core::constants`]; the binary loads
//! overrides from its settings file, where durations are written in
//! milliseconds (`unlock_ms`, `capture_timeout_ms`, ...).
//!
//! # Examples
//!
//! ```
//! use doorlock_appliance::ApplianceConfig;
//! use std::time::Duration;
//!
//! let config = ApplianceConfig::builder()
//!     .with_unlock(Duration::from_secs(6))
//!     .with_prolonged_presence(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.unlock, Duration::from_secs(6));
//! assert_eq!(config.match_window, Duration::from_secs(10));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use doorlock_core::constants::{
    DEFAULT_BOOT_SPLASH_MS, DEFAULT_CAPTURE_POLL_MS, DEFAULT_CAPTURE_TIMEOUT_MS,
    DEFAULT_CLOSED_HOLD_MS, DEFAULT_ECHO_TIMEOUT_MS, DEFAULT_LOOP_DELAY_MS,
    DEFAULT_MATCH_RETRY_MS, DEFAULT_MATCH_WINDOW_MS, DEFAULT_NOTICE_MS, DEFAULT_PORTAL_NAME,
    DEFAULT_UNLOCK_MS, PROXIMITY_THRESHOLD_CM,
};
use doorlock_core::{Error, FingerprintId, Result};

/// Timings and thresholds of the control loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceConfig {
    /// Relay energized time for one unlock.
    #[serde(rename = "unlock_ms", with = "millis")]
    pub unlock: Duration,

    /// How long "Door Closed" stays up after the relay drops.
    #[serde(rename = "closed_hold_ms", with = "millis")]
    pub closed_hold: Duration,

    /// Hold time of transient notices ("Template fail", "Access Denied", ...).
    #[serde(rename = "notice_ms", with = "millis")]
    pub notice: Duration,

    /// Pause between the distance check and the remote command poll.
    #[serde(rename = "loop_delay_ms", with = "millis")]
    pub loop_delay: Duration,

    /// Spacing of capture attempts while enrolling.
    #[serde(rename = "capture_poll_ms", with = "millis")]
    pub capture_poll: Duration,

    /// Upper bound of every wait for a finger (or for its removal).
    #[serde(rename = "capture_timeout_ms", with = "millis")]
    pub capture_timeout: Duration,

    /// How long a match attempt keeps scanning.
    #[serde(rename = "match_window_ms", with = "millis")]
    pub match_window: Duration,

    /// Pause between failed match attempts.
    #[serde(rename = "match_retry_ms", with = "millis")]
    pub match_retry: Duration,

    #[serde(rename = "boot_splash_ms", with = "millis")]
    pub boot_splash: Duration,

    /// Longest wait for a sonar echo.
    #[serde(rename = "echo_timeout_ms", with = "millis")]
    pub echo_timeout: Duration,

    /// Objects closer than this count as detected.
    pub proximity_threshold_cm: u32,

    /// Library slot written by the enrollment flow.
    pub enrollment_id: FingerprintId,

    /// Name of the setup portal opened when no credentials are stored.
    pub portal_name: String,

    /// Send a second notice once an object stays detected this long.
    ///
    /// Disabled when `None`.
    #[serde(rename = "prolonged_presence_ms", with = "optional_millis")]
    pub prolonged_presence: Option<Duration>,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            unlock: Duration::from_millis(DEFAULT_UNLOCK_MS),
            closed_hold: Duration::from_millis(DEFAULT_CLOSED_HOLD_MS),
            notice: Duration::from_millis(DEFAULT_NOTICE_MS),
            loop_delay: Duration::from_millis(DEFAULT_LOOP_DELAY_MS),
            capture_poll: Duration::from_millis(DEFAULT_CAPTURE_POLL_MS),
            capture_timeout: Duration::from_millis(DEFAULT_CAPTURE_TIMEOUT_MS),
            match_window: Duration::from_millis(DEFAULT_MATCH_WINDOW_MS),
            match_retry: Duration::from_millis(DEFAULT_MATCH_RETRY_MS),
            boot_splash: Duration::from_millis(DEFAULT_BOOT_SPLASH_MS),
            echo_timeout: Duration::from_millis(DEFAULT_ECHO_TIMEOUT_MS),
            proximity_threshold_cm: PROXIMITY_THRESHOLD_CM,
            enrollment_id: FingerprintId::ENROLLMENT,
            portal_name: DEFAULT_PORTAL_NAME.to_string(),
            prolonged_presence: None,
        }
    }
}

impl ApplianceConfig {
    /// Returns a builder starting from the defaults.
    pub fn builder() -> ApplianceConfigBuilder {
        ApplianceConfigBuilder::default()
    }

    /// Check the values a settings file may have broken.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDuration`] for a zero poll, retry, window or
    /// echo timeout, and [`Error::Config`] for a zero proximity threshold or
    /// an empty portal name.
    pub fn validate(&self) -> Result<()> {
        let required = [
            self.capture_poll,
            self.capture_timeout,
            self.match_window,
            self.match_retry,
            self.echo_timeout,
        ];
        if required.iter().any(Duration::is_zero) {
            return Err(Error::InvalidDuration);
        }
        if self.prolonged_presence.is_some_and(|d| d.is_zero()) {
            return Err(Error::InvalidDuration);
        }
        if self.proximity_threshold_cm == 0 {
            return Err(Error::Config(
                "proximity_threshold_cm must be greater than zero".to_string(),
            ));
        }
        if self.portal_name.trim().is_empty() {
            return Err(Error::Config("portal_name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`ApplianceConfig`].
#[derive(Debug, Default)]
pub struct ApplianceConfigBuilder {
    config: ApplianceConfig,
}

impl ApplianceConfigBuilder {
    pub fn with_unlock(mut self, unlock: Duration) -> Self {
        self.config.unlock = unlock;
        self
    }

    pub fn with_closed_hold(mut self, hold: Duration) -> Self {
        self.config.closed_hold = hold;
        self
    }

    pub fn with_notice(mut self, notice: Duration) -> Self {
        self.config.notice = notice;
        self
    }

    pub fn with_loop_delay(mut self, delay: Duration) -> Self {
        self.config.loop_delay = delay;
        self
    }

    pub fn with_capture_poll(mut self, poll: Duration) -> Self {
        self.config.capture_poll = poll;
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.config.capture_timeout = timeout;
        self
    }

    pub fn with_match_window(mut self, window: Duration) -> Self {
        self.config.match_window = window;
        self
    }

    pub fn with_match_retry(mut self, retry: Duration) -> Self {
        self.config.match_retry = retry;
        self
    }

    pub fn with_boot_splash(mut self, splash: Duration) -> Self {
        self.config.boot_splash = splash;
        self
    }

    pub fn with_echo_timeout(mut self, timeout: Duration) -> Self {
        self.config.echo_timeout = timeout;
        self
    }

    pub fn with_proximity_threshold_cm(mut self, threshold_cm: u32) -> Self {
        self.config.proximity_threshold_cm = threshold_cm;
        self
    }

    pub fn with_enrollment_id(mut self, id: FingerprintId) -> Self {
        self.config.enrollment_id = id;
        self
    }

    pub fn with_portal_name(mut self, name: impl Into<String>) -> Self {
        self.config.portal_name = name.into();
        self
    }

    /// Enable the prolonged presence notice.
    pub fn with_prolonged_presence(mut self, after: Duration) -> Self {
        self.config.prolonged_presence = Some(after);
        self
    }

    pub fn build(self) -> ApplianceConfig {
        self.config
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApplianceConfig::default();
        assert_eq!(config.unlock, Duration::from_millis(4000));
        assert_eq!(config.closed_hold, Duration::from_millis(1000));
        assert_eq!(config.loop_delay, Duration::from_millis(500));
        assert_eq!(config.capture_timeout, Duration::from_secs(30));
        assert_eq!(config.echo_timeout, Duration::from_millis(30));
        assert_eq!(config.proximity_threshold_cm, 15);
        assert_eq!(config.enrollment_id, FingerprintId::new(1));
        assert!(config.prolonged_presence.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let config: ApplianceConfig =
            serde_json::from_str(r#"{"unlock_ms": 2500, "prolonged_presence_ms": 5000}"#)
                .unwrap();
        assert_eq!(config.unlock, Duration::from_millis(2500));
        assert_eq!(config.prolonged_presence, Some(Duration::from_secs(5)));
        assert_eq!(config.notice, Duration::from_millis(2000));
    }

    #[test]
    fn test_serialized_in_milliseconds() {
        let json = serde_json::to_value(ApplianceConfig::default()).unwrap();
        assert_eq!(json["unlock_ms"], 4000);
        assert_eq!(json["match_window_ms"], 10_000);
        assert!(json["prolonged_presence_ms"].is_null());
    }

    #[test]
    fn test_builder_fluent_api() {
        let config = ApplianceConfig::builder()
            .with_capture_timeout(Duration::from_secs(5))
            .with_proximity_threshold_cm(20)
            .with_portal_name("Front-Door")
            .build();
        assert_eq!(config.capture_timeout, Duration::from_secs(5));
        assert_eq!(config.proximity_threshold_cm, 20);
        assert_eq!(config.portal_name, "Front-Door");
    }

    #[test]
    fn test_validate_rejects_zero_poll() {
        let config = ApplianceConfig::builder()
            .with_capture_poll(Duration::ZERO)
            .build();
        assert!(matches!(config.validate(), Err(Error::InvalidDuration)));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = ApplianceConfig::builder()
            .with_proximity_threshold_cm(0)
            .build();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

//! Core constants for the door lock appliance.
//!
//! This module collects the fixed values shared by the hardware drivers, the
//! remote mirror and the control loop: remote store paths, display geometry,
//! proximity thresholds and the default timings of every flow.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DOOR_CONTROL_PATH, "/doorControl");
//! let unlock = Duration::from_millis(DEFAULT_UNLOCK_MS);
//! assert_eq!(unlock.as_secs(), 4);
//! ```
//!
//! Timings are expressed in milliseconds so they can be used both as
//! configuration defaults and in `Duration::from_millis`.

// ============================================================================
// Remote Store Paths
// ============================================================================

/// Door command written by the remote party (`"unlock"`) and reset by the
/// appliance (`"locked"`).
pub const DOOR_CONTROL_PATH: &str = "/doorControl";

/// Last fingerprint id that was granted access.
pub const LAST_UID_PATH: &str = "/fingerprint/lastUID";

/// Append-only list of enrolled fingerprint ids.
pub const REGISTERED_UIDS_PATH: &str = "/fingerprint/registeredUIDs";

/// Proximity notification, overwritten on every detection.
pub const NOTIFICATION_PATH: &str = "/ultrasonic/notification";

/// Prolonged presence notification.
///
/// Only written when the prolonged presence notice is enabled in the
/// appliance configuration.
pub const PROLONGED_NOTIFICATION_PATH: &str = "/ultrasonic/prolongedNotification";

/// Door command value that requests an unlock.
pub const DOOR_COMMAND_UNLOCK: &str = "unlock";

/// Door command value written back after an unlock was performed.
pub const DOOR_COMMAND_LOCKED: &str = "locked";

// ============================================================================
// Display Configuration
// ============================================================================

/// Number of lines on the character display.
pub const DISPLAY_LINES: usize = 2;

/// Number of characters per display line.
pub const DISPLAY_COLUMNS: usize = 16;

/// Default I2C address of the PCF8574 display backpack.
pub const LCD_I2C_ADDRESS: u16 = 0x27;

/// Idle prompt, first line.
pub const IDLE_PROMPT_LINE1: &str = "Press C";

/// Idle prompt, second line.
pub const IDLE_PROMPT_LINE2: &str = "To Unlock";

// ============================================================================
// Proximity
// ============================================================================

/// Distance (exclusive) under which an object counts as detected.
pub const PROXIMITY_THRESHOLD_CM: u32 = 15;

/// Speed of sound used for echo ranging, in centimeters per microsecond.
///
/// The echo time covers the round trip, so distances are computed as
/// `echo_us * SPEED_OF_SOUND_CM_PER_US / 2`.
pub const SPEED_OF_SOUND_CM_PER_US: f64 = 0.0344;

/// Default maximum time to wait for an echo, in milliseconds.
///
/// An HC-SR04 holds the echo line high for at most ~38ms when nothing is in
/// range.
pub const DEFAULT_ECHO_TIMEOUT_MS: u64 = 30;

// ============================================================================
// Fingerprint Sensor
// ============================================================================

/// The single sensor slot the appliance enrolls into.
pub const ENROLLMENT_ID: u16 = 1;

/// Baud rate of the fingerprint sensor UART.
pub const FINGERPRINT_BAUD_RATE: u32 = 57_600;

/// Number of template pages searched on the sensor.
pub const FINGERPRINT_LIBRARY_CAPACITY: u16 = 163;

// ============================================================================
// Timing Defaults (milliseconds)
// ============================================================================

/// Relay energized time for one unlock.
pub const DEFAULT_UNLOCK_MS: u64 = 4000;

/// How long "Door Closed" stays on screen after the relay drops.
pub const DEFAULT_CLOSED_HOLD_MS: u64 = 1000;

/// How long transient notices stay on screen.
pub const DEFAULT_NOTICE_MS: u64 = 2000;

/// Delay between the distance check and the remote command poll.
pub const DEFAULT_LOOP_DELAY_MS: u64 = 500;

/// Spacing between image capture attempts during enrollment.
pub const DEFAULT_CAPTURE_POLL_MS: u64 = 100;

/// Upper bound for each capture wait during enrollment.
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 30_000;

/// Window for a fingerprint match attempt.
pub const DEFAULT_MATCH_WINDOW_MS: u64 = 10_000;

/// Spacing between failed match attempts.
pub const DEFAULT_MATCH_RETRY_MS: u64 = 2000;

/// Splash screen time at boot.
pub const DEFAULT_BOOT_SPLASH_MS: u64 = 2000;

// ============================================================================
// Network
// ============================================================================

/// Name of the setup access point shown while provisioning.
pub const DEFAULT_PORTAL_NAME: &str = "DoorLock-Setup";

/// Body returned by the status endpoint.
pub const STATUS_BODY: &str = "Door lock is running.";

/// Default bind address of the status endpoint.
pub const DEFAULT_STATUS_ADDR: &str = "0.0.0.0:8080";

/// Default timeout for a single remote store request, in milliseconds.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5000;

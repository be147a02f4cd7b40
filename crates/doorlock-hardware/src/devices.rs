//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) are not object-safe, so
//! `Box<dyn KeypadDevice>` is not available. These enums provide concrete
//! dispatch instead: one variant per implementation, with real drivers behind
//! their cargo features.
//!
//! # Examples
//!
//! ```
//! use doorlock_hardware::devices::AnyRelayDevice;
//! use doorlock_hardware::mock::MockRelay;
//! use doorlock_hardware::traits::RelayDevice;
//!
//! #[tokio::main]
//! async fn main() -> doorlock_hardware::Result<()> {
//!     let (relay, handle) = MockRelay::new();
//!     let mut any_relay = AnyRelayDevice::Mock(relay);
//!
//!     any_relay.set_energized(true).await?;
//!     assert!(handle.is_energized());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use doorlock_core::FingerprintId;

use crate::error::{HardwareError, Result};
#[cfg(feature = "hardware-gpio")]
use crate::gpio::{GpioRelay, HcSr04, Lcd1602, MatrixKeypad};
use crate::mock::{MockDisplay, MockFingerprint, MockKeypad, MockRelay, MockSonar};
#[cfg(feature = "hardware-serial")]
use crate::r30x::R30xSensor;
use crate::traits::{DisplayDevice, FingerprintDevice, KeypadDevice, RelayDevice, SonarDevice};
use crate::types::{ImageCapture, KeypadInput, SearchMatch, TemplateSlot};

/// Enum wrapper for keypad device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeypadDevice {
    /// Mock keypad for development and testing.
    Mock(MockKeypad),

    /// 4x4 matrix keypad on GPIO.
    #[cfg(feature = "hardware-gpio")]
    Matrix(MatrixKeypad),
}

impl KeypadDevice for AnyKeypadDevice {
    async fn poll_key(&mut self) -> Result<Option<KeypadInput>> {
        match self {
            Self::Mock(device) => device.poll_key().await,
            #[cfg(feature = "hardware-gpio")]
            Self::Matrix(device) => device.poll_key().await,
        }
    }
}

/// Enum wrapper for fingerprint sensor dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFingerprintDevice {
    /// Simulated sensor for development and testing.
    Mock(MockFingerprint),

    /// R30x sensor on a serial port.
    #[cfg(feature = "hardware-serial")]
    R30x(R30xSensor),

    /// Sensor that could not be opened. Every call fails as disconnected,
    /// so the appliance boots with the sensor marked unavailable.
    Unavailable { reason: String },
}

impl AnyFingerprintDevice {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

fn sensor_unavailable(reason: &str) -> HardwareError {
    HardwareError::disconnected(format!("fingerprint sensor ({reason})"))
}

impl FingerprintDevice for AnyFingerprintDevice {
    async fn verify_password(&mut self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.verify_password().await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.verify_password().await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn capture_image(&mut self) -> Result<ImageCapture> {
        match self {
            Self::Mock(device) => device.capture_image().await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.capture_image().await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn image_to_template(&mut self, slot: TemplateSlot) -> Result<()> {
        match self {
            Self::Mock(device) => device.image_to_template(slot).await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.image_to_template(slot).await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn create_model(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.create_model().await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.create_model().await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn store_model(&mut self, id: FingerprintId) -> Result<()> {
        match self {
            Self::Mock(device) => device.store_model(id).await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.store_model(id).await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn fast_search(&mut self) -> Result<Option<SearchMatch>> {
        match self {
            Self::Mock(device) => device.fast_search().await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.fast_search().await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }

    async fn empty_library(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.empty_library().await,
            #[cfg(feature = "hardware-serial")]
            Self::R30x(device) => device.empty_library().await,
            Self::Unavailable { reason } => Err(sensor_unavailable(reason)),
        }
    }
}

/// Enum wrapper for character display dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDisplayDevice {
    Mock(MockDisplay),

    /// HD44780 on a PCF8574 I2C backpack.
    #[cfg(feature = "hardware-gpio")]
    Lcd(Lcd1602),
}

impl DisplayDevice for AnyDisplayDevice {
    async fn render(&mut self, lines: &[String]) -> Result<()> {
        match self {
            Self::Mock(device) => device.render(lines).await,
            #[cfg(feature = "hardware-gpio")]
            Self::Lcd(device) => device.render(lines).await,
        }
    }

    async fn set_backlight(&mut self, on: bool) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_backlight(on).await,
            #[cfg(feature = "hardware-gpio")]
            Self::Lcd(device) => device.set_backlight(on).await,
        }
    }
}

/// Enum wrapper for lock relay dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRelayDevice {
    Mock(MockRelay),

    #[cfg(feature = "hardware-gpio")]
    Gpio(GpioRelay),
}

impl RelayDevice for AnyRelayDevice {
    async fn set_energized(&mut self, energized: bool) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_energized(energized).await,
            #[cfg(feature = "hardware-gpio")]
            Self::Gpio(device) => device.set_energized(energized).await,
        }
    }

    async fn is_energized(&self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.is_energized().await,
            #[cfg(feature = "hardware-gpio")]
            Self::Gpio(device) => device.is_energized().await,
        }
    }
}

/// Enum wrapper for echo-ranging sensor dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySonarDevice {
    Mock(MockSonar),

    #[cfg(feature = "hardware-gpio")]
    HcSr04(HcSr04),
}

impl SonarDevice for AnySonarDevice {
    async fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        match self {
            Self::Mock(device) => device.ping(timeout).await,
            #[cfg(feature = "hardware-gpio")]
            Self::HcSr04(device) => device.ping(timeout).await,
        }
    }
}

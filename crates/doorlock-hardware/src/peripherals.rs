//! The full set of devices the appliance drives.
//!
//! [`Peripherals`] bundles one of each device behind its enum wrapper.
//! [`Peripherals::mock`] builds a simulated board for tests and development;
//! [`Peripherals::open`] claims the real hardware described by a
//! [`BoardConfig`].

use serde::{Deserialize, Serialize};

use doorlock_core::constants::LCD_I2C_ADDRESS;

use crate::devices::{
    AnyDisplayDevice, AnyFingerprintDevice, AnyKeypadDevice, AnyRelayDevice, AnySonarDevice,
};
use crate::mock::{
    MockDisplay, MockDisplayHandle, MockFingerprint, MockFingerprintHandle, MockKeypad,
    MockKeypadHandle, MockRelay, MockRelayHandle, MockSonar, MockSonarHandle,
};

/// Wiring of the real board.
///
/// Pin numbers use BCM numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Serial device of the fingerprint sensor.
    pub fingerprint_port: String,

    /// Keypad row lines, top to bottom.
    pub keypad_rows: [u8; 4],

    /// Keypad column lines, left to right.
    pub keypad_columns: [u8; 4],

    pub relay_pin: u8,

    pub sonar_trigger_pin: u8,

    pub sonar_echo_pin: u8,

    /// I2C address of the display backpack.
    pub lcd_address: u16,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            fingerprint_port: "/dev/serial0".to_string(),
            keypad_rows: [5, 6, 13, 19],
            keypad_columns: [12, 16, 20, 21],
            relay_pin: 17,
            sonar_trigger_pin: 23,
            sonar_echo_pin: 24,
            lcd_address: LCD_I2C_ADDRESS,
        }
    }
}

/// One of each device.
#[derive(Debug)]
pub struct Peripherals {
    pub keypad: AnyKeypadDevice,
    pub fingerprint: AnyFingerprintDevice,
    pub display: AnyDisplayDevice,
    pub relay: AnyRelayDevice,
    pub sonar: AnySonarDevice,
}

/// Control handles for a simulated board.
#[derive(Debug, Clone)]
pub struct MockPeripherals {
    pub keypad: MockKeypadHandle,
    pub fingerprint: MockFingerprintHandle,
    pub display: MockDisplayHandle,
    pub relay: MockRelayHandle,
    pub sonar: MockSonarHandle,
}

impl Peripherals {
    /// Build a board made entirely of mocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::Peripherals;
    ///
    /// let (peripherals, handles) = Peripherals::mock();
    /// assert!(!handles.relay.is_energized());
    /// # drop(peripherals);
    /// ```
    pub fn mock() -> (Self, MockPeripherals) {
        let (keypad, keypad_handle) = MockKeypad::new();
        let (fingerprint, fingerprint_handle) = MockFingerprint::new();
        let (display, display_handle) = MockDisplay::new();
        let (relay, relay_handle) = MockRelay::new();
        let (sonar, sonar_handle) = MockSonar::new();

        (
            Self {
                keypad: AnyKeypadDevice::Mock(keypad),
                fingerprint: AnyFingerprintDevice::Mock(fingerprint),
                display: AnyDisplayDevice::Mock(display),
                relay: AnyRelayDevice::Mock(relay),
                sonar: AnySonarDevice::Mock(sonar),
            },
            MockPeripherals {
                keypad: keypad_handle,
                fingerprint: fingerprint_handle,
                display: display_handle,
                relay: relay_handle,
                sonar: sonar_handle,
            },
        )
    }

    /// Claim the real devices described by `config`.
    ///
    /// A fingerprint sensor that cannot be opened is replaced by
    /// [`AnyFingerprintDevice::Unavailable`]; the rest of the board keeps
    /// working without it.
    ///
    /// # Errors
    ///
    /// Returns an initialization error for the first GPIO or I2C device that
    /// cannot be opened.
    #[cfg(all(feature = "hardware-gpio", feature = "hardware-serial"))]
    pub fn open(config: &BoardConfig) -> crate::Result<Self> {
        use crate::gpio::{GpioRelay, HcSr04, Lcd1602, MatrixKeypad};
        use crate::r30x::R30xSensor;

        let relay = GpioRelay::new(config.relay_pin)?;
        let display = Lcd1602::new(config.lcd_address)?;
        let keypad = MatrixKeypad::new(config.keypad_rows, config.keypad_columns)?;
        let sonar = HcSr04::new(config.sonar_trigger_pin, config.sonar_echo_pin)?;
        let fingerprint = match R30xSensor::open(&config.fingerprint_port) {
            Ok(sensor) => AnyFingerprintDevice::R30x(sensor),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    port = %config.fingerprint_port,
                    "Fingerprint sensor unavailable"
                );
                AnyFingerprintDevice::unavailable(format!("{}: {e}", config.fingerprint_port))
            }
        };
        tracing::info!(?config, "Board peripherals opened");

        Ok(Self {
            keypad: AnyKeypadDevice::Matrix(keypad),
            fingerprint,
            display: AnyDisplayDevice::Lcd(display),
            relay: AnyRelayDevice::Gpio(relay),
            sonar: AnySonarDevice::HcSr04(sonar),
        })
    }
}

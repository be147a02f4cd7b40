//! Board peripherals on Raspberry Pi class GPIO and I2C.
//!
//! Keypad scanning and LCD framing helpers are always compiled; the drivers
//! themselves require the `hardware-gpio` feature.

pub mod keypad;
pub mod lcd;
#[cfg(feature = "hardware-gpio")]
pub mod relay;
#[cfg(feature = "hardware-gpio")]
pub mod sonar;

#[cfg(feature = "hardware-gpio")]
pub use keypad::MatrixKeypad;
#[cfg(feature = "hardware-gpio")]
pub use lcd::Lcd1602;
#[cfg(feature = "hardware-gpio")]
pub use relay::GpioRelay;
#[cfg(feature = "hardware-gpio")]
pub use sonar::HcSr04;

#[cfg(feature = "hardware-gpio")]
pub(crate) fn gpio_error(e: rppal::gpio::Error) -> crate::HardwareError {
    crate::HardwareError::initialization_failed(format!("GPIO: {}", e))
}

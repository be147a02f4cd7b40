//! Hardware device trait definitions.
//!
//! This module defines the trait interfaces between the door lock control
//! loop and its peripherals: the matrix keypad, the fingerprint sensor, the
//! character display, the lock relay and the ultrasonic range finder. Mock
//! and real implementations are interchangeable behind these traits.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use doorlock_core::FingerprintId;

use crate::error::Result;
use crate::types::{ImageCapture, KeypadInput, SearchMatch, TemplateSlot};

/// Keypad device abstraction.
///
/// The control loop polls the keypad once per pass, so reads never block:
/// a device reports `None` when no key has been pressed since the last poll.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters, or the enum wrappers from the
/// [`devices`](crate::devices) module:
///
/// ```
/// use doorlock_hardware::devices::AnyKeypadDevice;
/// use doorlock_hardware::mock::MockKeypad;
/// use doorlock_hardware::traits::KeypadDevice;
///
/// # async fn example() -> doorlock_hardware::Result<()> {
/// let (keypad, _handle) = MockKeypad::new();
/// let mut any_keypad = AnyKeypadDevice::Mock(keypad);
///
/// let key = any_keypad.poll_key().await?;
/// assert!(key.is_none());
/// # Ok(())
/// # }
/// ```
pub trait KeypadDevice: Send {
    /// Return the key pressed since the previous poll, if any.
    ///
    /// A held key is reported once per press.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be read.
    async fn poll_key(&mut self) -> Result<Option<KeypadInput>>;
}

/// Optical fingerprint sensor abstraction.
///
/// Matching runs inside the sensor; the host only sequences the
/// capture/convert/model/store/search commands. Every method maps onto a
/// single sensor instruction.
///
/// # Examples
///
/// ```no_run
/// use doorlock_hardware::traits::FingerprintDevice;
/// use doorlock_hardware::types::{ImageCapture, TemplateSlot};
/// use doorlock_hardware::Result;
///
/// async fn scan_once<F: FingerprintDevice>(sensor: &mut F) -> Result<bool> {
///     if sensor.capture_image().await? != ImageCapture::Taken {
///         return Ok(false);
///     }
///     sensor.image_to_template(TemplateSlot::One).await?;
///     Ok(sensor.fast_search().await?.is_some())
/// }
/// ```
pub trait FingerprintDevice: Send {
    /// Perform the password handshake.
    ///
    /// Returns `Ok(false)` when the sensor answers but rejects the password.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor does not answer.
    async fn verify_password(&mut self) -> Result<bool>;

    /// Try to capture a finger image into the image buffer.
    ///
    /// # Errors
    ///
    /// Returns a communication error when the packet exchange fails.
    async fn capture_image(&mut self) -> Result<ImageCapture>;

    /// Convert the captured image into a template in the given slot.
    async fn image_to_template(&mut self, slot: TemplateSlot) -> Result<()>;

    /// Combine both template slots into a model.
    async fn create_model(&mut self) -> Result<()>;

    /// Store the model in the library under `id`.
    async fn store_model(&mut self, id: FingerprintId) -> Result<()>;

    /// Search the library for the template in slot 1.
    ///
    /// Returns `None` when no stored template matches.
    async fn fast_search(&mut self) -> Result<Option<SearchMatch>>;

    /// Delete every template in the library.
    async fn empty_library(&mut self) -> Result<()>;
}

/// Character display abstraction (16x2 LCD).
pub trait DisplayDevice: Send {
    /// Replace the whole screen with the given lines.
    ///
    /// Lines are already fitted to the display width by the caller; missing
    /// lines are blank.
    async fn render(&mut self, lines: &[String]) -> Result<()>;

    /// Switch the backlight on or off.
    async fn set_backlight(&mut self, on: bool) -> Result<()>;
}

/// Lock relay abstraction.
///
/// An energized relay releases the lock.
pub trait RelayDevice: Send {
    async fn set_energized(&mut self, energized: bool) -> Result<()>;

    async fn is_energized(&self) -> Result<bool>;
}

/// Echo-ranging sensor abstraction (HC-SR04 style).
pub trait SonarDevice: Send {
    /// Trigger one pulse and return the echo round-trip time.
    ///
    /// Returns `None` when no echo arrives within `timeout`.
    async fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>>;
}

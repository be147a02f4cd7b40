//! Hardware device abstraction layer for the door lock appliance.
//!
//! This crate provides trait-based abstractions for the peripherals the
//! appliance drives: a 4x4 matrix keypad, an optical fingerprint sensor, a
//! 16x2 character display, the lock relay and an ultrasonic range finder.
//! Mock implementations (for development and testing) and real drivers can
//! be swapped freely behind the traits.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT). Blocking bus transactions
//!   run inside `tokio::task::block_in_place`.
//! - **Polled**: The control loop is a single sequential pass, so every
//!   device call returns promptly. The keypad reports `None` when idle and
//!   the sonar reports `None` when no echo arrives in time.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result]
//!   carrying a [`HardwareError`], including the fingerprint sensor's
//!   confirmation codes.
//!
//! # Device Traits
//!
//! | Trait | Mock | Real driver | Feature |
//! |---|---|---|---|
//! | [`KeypadDevice`] | [`MockKeypad`](mock::MockKeypad) | `gpio::MatrixKeypad` | `hardware-gpio` |
//! | [`FingerprintDevice`] | [`MockFingerprint`](mock::MockFingerprint) | `r30x::R30xSensor` | `hardware-serial` |
//! | [`DisplayDevice`] | [`MockDisplay`](mock::MockDisplay) | `gpio::Lcd1602` | `hardware-gpio` |
//! | [`RelayDevice`] | [`MockRelay`](mock::MockRelay) | `gpio::GpioRelay` | `hardware-gpio` |
//! | [`SonarDevice`] | [`MockSonar`](mock::MockSonar) | `gpio::HcSr04` | `hardware-gpio` |
//!
//! # Example
//!
//! ```
//! use doorlock_hardware::traits::{FingerprintDevice, KeypadDevice};
//! use doorlock_hardware::{KeypadInput, Peripherals};
//!
//! #[tokio::main]
//! async fn main() -> doorlock_hardware::Result<()> {
//!     let (mut board, handles) = Peripherals::mock();
//!
//!     handles.keypad.press('B').await?;
//!     assert_eq!(board.keypad.poll_key().await?, Some(KeypadInput::Letter('B')));
//!     assert!(board.fingerprint.verify_password().await?);
//!     Ok(())
//! }
//! ```
//!
//! [`KeypadDevice`]: traits::KeypadDevice
//! [`FingerprintDevice`]: traits::FingerprintDevice
//! [`DisplayDevice`]: traits::DisplayDevice
//! [`RelayDevice`]: traits::RelayDevice
//! [`SonarDevice`]: traits::SonarDevice

pub mod devices;
pub mod error;
pub mod gpio;
pub mod mock;
pub mod peripherals;
pub mod r30x;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use peripherals::{BoardConfig, MockPeripherals, Peripherals};
pub use traits::{DisplayDevice, FingerprintDevice, KeypadDevice, RelayDevice, SonarDevice};
pub use types::{ImageCapture, KeypadInput, SearchMatch, SensorCode, SensorCommand, TemplateSlot};

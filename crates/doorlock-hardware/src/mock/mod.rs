//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware. Each mock comes with a
//! cloneable handle used to script inputs, inject faults and inspect outputs.

pub mod display;
pub mod fingerprint;
pub mod keypad;
pub mod relay;
pub mod sonar;

// Re-export commonly used types
pub use display::{MockDisplay, MockDisplayHandle};
pub use fingerprint::{MockFingerprint, MockFingerprintHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use relay::{MockRelay, MockRelayHandle};
pub use sonar::{MockSonar, MockSonarHandle};

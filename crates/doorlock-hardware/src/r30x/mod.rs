//! R30x/ZFM fingerprint sensor support.
//!
//! The packet codec is always available; the serial driver requires the
//! `hardware-serial` feature.

pub mod packet;
#[cfg(feature = "hardware-serial")]
pub mod sensor;

pub use packet::{Ack, Packet, PacketKind};
#[cfg(feature = "hardware-serial")]
pub use sensor::R30xSensor;

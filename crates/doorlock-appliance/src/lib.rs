//! Door lock appliance control loop.
//!
//! This crate ties the peripherals from `doorlock-hardware` and the remote
//! store from `doorlock-network` into the appliance behavior: the boot
//! sequence, the keypad command dispatcher, the fingerprint flows, the timed
//! lock pulse, proximity detection and the remote door command.
//!
//! Every flow runs inside a single sequential loop. The loop, and the
//! fingerprint waits, can be stopped through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken); a lock pulse
//! always runs to completion.

pub mod appliance;
pub mod config;
pub mod dispatcher;
pub mod distance;
pub mod enrollment;
pub mod lock;
pub mod matching;
pub mod mirror;
pub mod provisioning;
pub mod screen;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use appliance::{Appliance, BootOutcome, LoopExit};
pub use config::{ApplianceConfig, ApplianceConfigBuilder};
pub use dispatcher::KeyCommand;
pub use distance::DistanceMonitor;
pub use enrollment::{EnrollmentAbort, EnrollmentOutcome};
pub use lock::LockActuator;
pub use matching::MatchOutcome;
pub use mirror::RemoteMirror;
pub use screen::{Row, Screen};
pub use state::{ApplianceState, ProximityTracker};

//! Network layer for the door lock appliance.
//!
//! # Components
//!
//! - **Remote store** ([`store`]): the cloud key-value store the appliance
//!   mirrors its state into. [`FirebaseStore`] speaks the Realtime Database
//!   REST API; [`MemoryStore`] keeps the same tree in memory.
//! - **Provisioning** ([`provisioning`]): network credentials, the setup
//!   portal wait at boot and the credential reset.
//! - **Status endpoint** ([`StatusServer`]): a plain-text liveness page.
//!
//! Remote calls are best effort: callers log failures and move on, there is
//! no retry or offline queue here.

pub mod error;
pub mod provisioning;
pub mod status;
pub mod store;

pub use error::{ProvisioningError, StoreError, StoreResult};
pub use provisioning::{
    AnyProvisioner, Credentials, FileProvisioner, MockProvisioner, Provisioner,
};
pub use status::StatusServer;
pub use store::{AnyRemoteStore, FirebaseConfig, FirebaseStore, MemoryStore, RemoteStore};

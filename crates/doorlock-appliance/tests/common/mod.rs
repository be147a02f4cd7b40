//! Common test utilities for the appliance scenarios.
//!
//! Every scenario runs on a fully simulated board with paused tokio time,
//! so the timings asserted here are exact.

#![allow(dead_code)]

use doorlock_appliance::{Appliance, ApplianceConfig, BootOutcome};
use doorlock_hardware::devices::AnyFingerprintDevice;
use doorlock_hardware::{MockPeripherals, Peripherals};
use doorlock_network::store::StoreOp;
use doorlock_network::{AnyProvisioner, AnyRemoteStore, MemoryStore, MockProvisioner};

/// An appliance and the handles that observe it.
pub struct Rig {
    pub appliance: Appliance,
    pub board: MockPeripherals,
    pub store: MemoryStore,
    pub provisioner: MockProvisioner,
}

/// Build a rig around an already provisioned network.
pub fn rig() -> Rig {
    rig_with(ApplianceConfig::default(), MockProvisioner::connected())
}

pub fn rig_with(config: ApplianceConfig, provisioner: MockProvisioner) -> Rig {
    let (peripherals, board) = Peripherals::mock();
    assemble(peripherals, board, config, provisioner)
}

/// Build a rig whose fingerprint sensor could not be opened. The
/// `board.fingerprint` handle is detached from the appliance.
pub fn rig_without_sensor() -> Rig {
    let (mut peripherals, board) = Peripherals::mock();
    peripherals.fingerprint = AnyFingerprintDevice::unavailable("/dev/ttyUSB0: No such file");
    assemble(
        peripherals,
        board,
        ApplianceConfig::default(),
        MockProvisioner::connected(),
    )
}

fn assemble(
    peripherals: Peripherals,
    board: MockPeripherals,
    config: ApplianceConfig,
    provisioner: MockProvisioner,
) -> Rig {
    let store = MemoryStore::new();
    let appliance = Appliance::new(
        peripherals,
        AnyRemoteStore::Memory(store.clone()),
        AnyProvisioner::Mock(provisioner.clone()),
        config,
    );
    Rig {
        appliance,
        board,
        store,
        provisioner,
    }
}

/// Build a rig and run its boot sequence, which must succeed.
pub async fn booted() -> Rig {
    let mut rig = rig();
    assert_eq!(rig.appliance.boot().await, BootOutcome::Ready);
    rig
}

/// Number of recorded writes to `path`.
pub fn writes_to(store: &MemoryStore, path: &str) -> usize {
    store
        .operations()
        .iter()
        .filter(|op| {
            matches!(op, StoreOp::Set { path: p, .. } | StoreOp::Push { path: p, .. } if p == path)
        })
        .count()
}

//! Shared fixtures for unit tests.

use doorlock_hardware::{MockPeripherals, Peripherals};
use doorlock_network::{AnyProvisioner, AnyRemoteStore, MemoryStore, MockProvisioner};

use crate::appliance::Appliance;
use crate::config::ApplianceConfig;

/// An appliance on a fully simulated board, plus handles to inspect it.
pub struct TestRig {
    pub appliance: Appliance,
    pub board: MockPeripherals,
    pub store: MemoryStore,
    pub provisioner: MockProvisioner,
}

pub fn rig(config: ApplianceConfig) -> TestRig {
    let (peripherals, board) = Peripherals::mock();
    let store = MemoryStore::new();
    let provisioner = MockProvisioner::connected();
    let appliance = Appliance::new(
        peripherals,
        AnyRemoteStore::Memory(store.clone()),
        AnyProvisioner::Mock(provisioner.clone()),
        config,
    );
    TestRig {
        appliance,
        board,
        store,
        provisioner,
    }
}

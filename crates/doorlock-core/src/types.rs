use crate::constants::{
    DOOR_COMMAND_LOCKED, DOOR_COMMAND_UNLOCK, ENROLLMENT_ID, SPEED_OF_SOUND_CM_PER_US,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fingerprint template identifier (sensor library page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FingerprintId(u16);

impl FingerprintId {
    /// The single id the appliance enrolls into.
    pub const ENROLLMENT: FingerprintId = FingerprintId(ENROLLMENT_ID);

    #[must_use]
    pub const fn new(id: u16) -> Self {
        FingerprintId(id)
    }

    /// Get the raw id as u16.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for FingerprintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for FingerprintId {
    fn from(id: u16) -> Self {
        FingerprintId(id)
    }
}

/// Distance measured by the echo-ranging sensor, in whole centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DistanceCm(u32);

impl DistanceCm {
    #[must_use]
    pub const fn new(cm: u32) -> Self {
        DistanceCm(cm)
    }

    /// Convert an echo round-trip time into a distance.
    ///
    /// The fractional part is truncated.
    #[must_use]
    pub fn from_echo(echo: Duration) -> Self {
        let micros = echo.as_micros() as f64;
        DistanceCm((micros * SPEED_OF_SOUND_CM_PER_US / 2.0) as u32)
    }

    /// Echo round-trip time that [`from_echo`](Self::from_echo) maps back to
    /// exactly this distance.
    #[must_use]
    pub fn to_echo(self) -> Duration {
        let micros = (self.0 as f64 * 2.0 / SPEED_OF_SOUND_CM_PER_US).ceil() + 1.0;
        Duration::from_micros(micros as u64)
    }

    #[must_use]
    pub fn as_cm(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the distance is under `threshold_cm`.
    #[inline]
    #[must_use]
    pub fn is_within(&self, threshold_cm: u32) -> bool {
        self.0 < threshold_cm
    }
}

impl fmt::Display for DistanceCm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} cm", self.0)
    }
}

/// Command read from the remote door control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorCommand {
    /// Door should stay locked (the resting value).
    Locked,
    /// Remote party requests one unlock.
    Unlock,
    /// Any other value; ignored.
    Other(String),
}

impl DoorCommand {
    /// Parse the raw value stored under the door control path.
    ///
    /// Matching is exact: `"Unlock"` is not an unlock request.
    pub fn parse(raw: &str) -> Self {
        match raw {
            DOOR_COMMAND_UNLOCK => DoorCommand::Unlock,
            DOOR_COMMAND_LOCKED => DoorCommand::Locked,
            other => DoorCommand::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DoorCommand::Locked => f.write_str(DOOR_COMMAND_LOCKED),
            DoorCommand::Unlock => f.write_str(DOOR_COMMAND_UNLOCK),
            DoorCommand::Other(raw) => f.write_str(raw),
        }
    }
}

/// Whether an object is currently within the proximity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityState {
    #[default]
    NotDetected,
    Detected,
}

impl ProximityState {
    /// Compute the state a reading leads to, given whether it fell under the
    /// threshold. Returns `None` when the reading keeps the current state.
    #[must_use]
    pub fn after(self, within: bool) -> Option<ProximityState> {
        match (self, within) {
            (ProximityState::NotDetected, true) => Some(ProximityState::Detected),
            (ProximityState::Detected, false) => Some(ProximityState::NotDetected),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_detected(self) -> bool {
        matches!(self, ProximityState::Detected)
    }
}

impl fmt::Display for ProximityState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProximityState::NotDetected => write!(f, "NotDetected"),
            ProximityState::Detected => write!(f, "Detected"),
        }
    }
}

/// Physical lock state, driven by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl From<bool> for LockState {
    /// `true` means the relay is energized.
    fn from(energized: bool) -> Self {
        if energized {
            LockState::Unlocked
        } else {
            LockState::Locked
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(582, 10)]
    #[case(872, 14)]
    #[case(873, 15)]
    #[case(5813, 99)]
    fn test_distance_from_echo(#[case] micros: u64, #[case] expected_cm: u32) {
        let distance = DistanceCm::from_echo(Duration::from_micros(micros));
        assert_eq!(distance.as_cm(), expected_cm);
    }

    #[rstest]
    #[case(1)]
    #[case(14)]
    #[case(15)]
    #[case(120)]
    fn test_distance_echo_inverse(#[case] cm: u32) {
        let echo = DistanceCm::new(cm).to_echo();
        assert_eq!(DistanceCm::from_echo(echo).as_cm(), cm);
    }

    #[test]
    fn test_distance_threshold_is_exclusive() {
        assert!(DistanceCm::new(14).is_within(15));
        assert!(!DistanceCm::new(15).is_within(15));
        assert!(DistanceCm::new(29).is_within(30));
        assert!(!DistanceCm::new(30).is_within(30));
    }

    #[rstest]
    #[case(ProximityState::NotDetected, 10, Some(ProximityState::Detected))]
    #[case(ProximityState::NotDetected, 15, None)]
    #[case(ProximityState::Detected, 3, None)]
    #[case(ProximityState::Detected, 15, Some(ProximityState::NotDetected))]
    fn test_proximity_transitions(
        #[case] current: ProximityState,
        #[case] cm: u32,
        #[case] expected: Option<ProximityState>,
    ) {
        let within = DistanceCm::new(cm).is_within(15);
        assert_eq!(current.after(within), expected);
    }

    #[rstest]
    #[case("unlock", DoorCommand::Unlock)]
    #[case("locked", DoorCommand::Locked)]
    #[case("Unlock", DoorCommand::Other("Unlock".to_string()))]
    #[case("", DoorCommand::Other(String::new()))]
    fn test_door_command_parse(#[case] raw: &str, #[case] expected: DoorCommand) {
        assert_eq!(DoorCommand::parse(raw), expected);
    }

    #[test]
    fn test_door_command_display_round_trip() {
        assert_eq!(DoorCommand::Unlock.to_string(), "unlock");
        assert_eq!(DoorCommand::Locked.to_string(), "locked");
    }

    #[test]
    fn test_fingerprint_id_conversions() {
        assert_eq!(FingerprintId::from(7).as_u16(), 7);
        assert_eq!(FingerprintId::new(7).to_string(), "7");
        assert_eq!(FingerprintId::ENROLLMENT.as_u16(), 1);
    }

    #[test]
    fn test_lock_state_from_relay() {
        assert_eq!(LockState::from(true), LockState::Unlocked);
        assert_eq!(LockState::from(false), LockState::Locked);
    }

    #[test]
    fn test_proximity_state_serialization() {
        let json = serde_json::to_string(&ProximityState::NotDetected).unwrap();
        assert_eq!(json, "\"not_detected\"");
    }
}

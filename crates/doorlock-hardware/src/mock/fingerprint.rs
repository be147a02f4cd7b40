//! Mock fingerprint sensor implementation for testing and development.
//!
//! The mock simulates the sensor's internal state: an image buffer, two
//! character buffers, a model buffer and a template library. Fingers are
//! identified by an arbitrary `u32` "print"; two captures of the same print
//! produce matching templates.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::FingerprintId;
use doorlock_core::constants::FINGERPRINT_LIBRARY_CAPACITY;

use crate::{
    HardwareError, Result,
    traits::FingerprintDevice,
    types::{ImageCapture, SearchMatch, SensorCode, SensorCommand, TemplateSlot},
};

/// Confidence reported for every simulated match.
const MOCK_MATCH_CONFIDENCE: u16 = 120;

#[derive(Debug)]
struct SimulatedSensor {
    connected: bool,
    password_accepted: bool,
    /// What the sensor sees on each upcoming capture, oldest first.
    scans: VecDeque<Option<u32>>,
    /// What the sensor sees once `scans` is exhausted.
    resting: Option<u32>,
    image: Option<u32>,
    buffers: [Option<u32>; 2],
    model: Option<u32>,
    library: BTreeMap<u16, u32>,
    faults: HashMap<SensorCommand, VecDeque<SensorCode>>,
    commands: Vec<SensorCommand>,
}

impl SimulatedSensor {
    fn new() -> Self {
        Self {
            connected: true,
            password_accepted: true,
            scans: VecDeque::new(),
            resting: None,
            image: None,
            buffers: [None, None],
            model: None,
            library: BTreeMap::new(),
            faults: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Record the command and return an injected fault, if one is pending.
    fn begin(&mut self, command: SensorCommand) -> Result<Option<SensorCode>> {
        self.commands.push(command);
        if !self.connected {
            return Err(HardwareError::communication("no response from sensor"));
        }
        Ok(self
            .faults
            .get_mut(&command)
            .and_then(|queue| queue.pop_front()))
    }
}

fn lock(state: &Mutex<SimulatedSensor>) -> MutexGuard<'_, SimulatedSensor> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock fingerprint sensor for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockFingerprint;
/// use doorlock_hardware::traits::FingerprintDevice;
/// use doorlock_hardware::types::{ImageCapture, TemplateSlot};
/// use doorlock_core::FingerprintId;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut sensor, handle) = MockFingerprint::new();
///     handle.enroll_print(FingerprintId::new(1), 42);
///     handle.touch(42);
///
///     assert_eq!(sensor.capture_image().await?, ImageCapture::Taken);
///     sensor.image_to_template(TemplateSlot::One).await?;
///     let hit = sensor.fast_search().await?.unwrap();
///     assert_eq!(hit.id, FingerprintId::new(1));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFingerprint {
    state: Arc<Mutex<SimulatedSensor>>,
}

impl MockFingerprint {
    /// Create a new mock sensor and its control handle.
    pub fn new() -> (Self, MockFingerprintHandle) {
        let state = Arc::new(Mutex::new(SimulatedSensor::new()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFingerprintHandle { state },
        )
    }
}

impl Default for MockFingerprint {
    fn default() -> Self {
        Self::new().0
    }
}

impl FingerprintDevice for MockFingerprint {
    async fn verify_password(&mut self) -> Result<bool> {
        let mut sensor = lock(&self.state);
        match sensor.begin(SensorCommand::VerifyPassword)? {
            Some(SensorCode::PasswordFail) => Ok(false),
            Some(code) => code.into_result().map(|_| true),
            None => Ok(sensor.password_accepted),
        }
    }

    async fn capture_image(&mut self) -> Result<ImageCapture> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::CaptureImage)? {
            return ImageCapture::from_code(code);
        }

        let resting = sensor.resting;
        let seen = sensor.scans.pop_front().unwrap_or(resting);
        match seen {
            Some(print) => {
                sensor.image = Some(print);
                Ok(ImageCapture::Taken)
            }
            None => Ok(ImageCapture::NoFinger),
        }
    }

    async fn image_to_template(&mut self, slot: TemplateSlot) -> Result<()> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::ImageToTemplate(slot))? {
            return code.into_result();
        }

        let image = sensor
            .image
            .ok_or(HardwareError::sensor(SensorCode::InvalidImage))?;
        sensor.buffers[slot.index()] = Some(image);
        Ok(())
    }

    async fn create_model(&mut self) -> Result<()> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::CreateModel)? {
            return code.into_result();
        }

        match sensor.buffers {
            [Some(first), Some(second)] if first == second => {
                sensor.model = Some(first);
                Ok(())
            }
            _ => Err(HardwareError::sensor(SensorCode::EnrollMismatch)),
        }
    }

    async fn store_model(&mut self, id: FingerprintId) -> Result<()> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::StoreModel(id))? {
            return code.into_result();
        }

        if id.as_u16() >= FINGERPRINT_LIBRARY_CAPACITY {
            return Err(HardwareError::sensor(SensorCode::BadLocation));
        }
        let model = sensor
            .model
            .ok_or(HardwareError::sensor(SensorCode::InvalidRegister))?;
        sensor.library.insert(id.as_u16(), model);
        Ok(())
    }

    async fn fast_search(&mut self) -> Result<Option<SearchMatch>> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::FastSearch)? {
            return match code {
                SensorCode::NotFound => Ok(None),
                other => other.into_result().map(|_| None),
            };
        }

        let Some(probe) = sensor.buffers[TemplateSlot::One.index()] else {
            return Err(HardwareError::sensor(SensorCode::InvalidRegister));
        };
        Ok(sensor
            .library
            .iter()
            .find(|(_, print)| **print == probe)
            .map(|(id, _)| SearchMatch {
                id: FingerprintId::new(*id),
                confidence: MOCK_MATCH_CONFIDENCE,
            }))
    }

    async fn empty_library(&mut self) -> Result<()> {
        let mut sensor = lock(&self.state);
        if let Some(code) = sensor.begin(SensorCommand::EmptyLibrary)? {
            return code.into_result();
        }
        sensor.library.clear();
        Ok(())
    }
}

/// Handle for controlling a mock fingerprint sensor.
///
/// This handle can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockFingerprintHandle {
    state: Arc<Mutex<SimulatedSensor>>,
}

impl MockFingerprintHandle {
    /// Queue a finger for the next capture.
    pub fn touch(&self, print: u32) {
        lock(&self.state).scans.push_back(Some(print));
    }

    /// Queue `count` captures that see no finger.
    pub fn queue_empty(&self, count: usize) {
        let mut sensor = lock(&self.state);
        sensor.scans.extend(std::iter::repeat_n(None, count));
    }

    /// Set what the sensor sees once the queued captures are used up.
    pub fn rest_finger(&self, print: Option<u32>) {
        lock(&self.state).resting = print;
    }

    /// Store a template directly in the library.
    pub fn enroll_print(&self, id: FingerprintId, print: u32) {
        lock(&self.state).library.insert(id.as_u16(), print);
    }

    /// Make the next `command` answer with `code` instead of simulating it.
    ///
    /// Faults for the same command are consumed in the order they were added.
    pub fn fail_next(&self, command: SensorCommand, code: SensorCode) {
        lock(&self.state)
            .faults
            .entry(command)
            .or_default()
            .push_back(code);
    }

    /// Simulate a wiring fault: every command fails with a communication error.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    pub fn set_password_accepted(&self, accepted: bool) {
        lock(&self.state).password_accepted = accepted;
    }

    /// Snapshot of the template library (id to print).
    pub fn library(&self) -> BTreeMap<u16, u32> {
        lock(&self.state).library.clone()
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<SensorCommand> {
        lock(&self.state).commands.clone()
    }

    /// Number of times `command` was received.
    pub fn command_count(&self, command: SensorCommand) -> usize {
        lock(&self.state)
            .commands
            .iter()
            .filter(|c| **c == command)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_follows_queued_scans() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.queue_empty(2);
        handle.touch(5);

        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::NoFinger);
        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::NoFinger);
        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::Taken);
        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::NoFinger);
    }

    #[tokio::test]
    async fn test_enroll_and_search() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.touch(9);
        handle.touch(9);

        sensor.capture_image().await.unwrap();
        sensor.image_to_template(TemplateSlot::One).await.unwrap();
        sensor.capture_image().await.unwrap();
        sensor.image_to_template(TemplateSlot::Two).await.unwrap();
        sensor.create_model().await.unwrap();
        sensor.store_model(FingerprintId::ENROLLMENT).await.unwrap();

        assert_eq!(handle.library().get(&1), Some(&9));
        let hit = sensor.fast_search().await.unwrap().unwrap();
        assert_eq!(hit.id, FingerprintId::ENROLLMENT);
    }

    #[tokio::test]
    async fn test_model_rejects_different_fingers() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.touch(1);
        handle.touch(2);

        sensor.capture_image().await.unwrap();
        sensor.image_to_template(TemplateSlot::One).await.unwrap();
        sensor.capture_image().await.unwrap();
        sensor.image_to_template(TemplateSlot::Two).await.unwrap();

        let err = sensor.create_model().await.unwrap_err();
        assert_eq!(err.sensor_code(), Some(SensorCode::EnrollMismatch));
    }

    #[tokio::test]
    async fn test_unknown_finger_not_found() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.enroll_print(FingerprintId::new(1), 1);
        handle.touch(2);

        sensor.capture_image().await.unwrap();
        sensor.image_to_template(TemplateSlot::One).await.unwrap();
        assert!(sensor.fast_search().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_faults_take_precedence() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.touch(3);
        handle.fail_next(SensorCommand::CaptureImage, SensorCode::PacketReceiveError);
        handle.fail_next(SensorCommand::CaptureImage, SensorCode::ImageFail);

        assert!(sensor.capture_image().await.unwrap_err().is_communication());
        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::ImageFail);
        assert_eq!(sensor.capture_image().await.unwrap(), ImageCapture::Taken);
    }

    #[tokio::test]
    async fn test_disconnected_sensor() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.set_connected(false);

        assert!(sensor.verify_password().await.unwrap_err().is_communication());
        assert_eq!(handle.command_count(SensorCommand::VerifyPassword), 1);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (mut sensor, handle) = MockFingerprint::new();
        assert!(sensor.verify_password().await.unwrap());

        handle.set_password_accepted(false);
        assert!(!sensor.verify_password().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_library() {
        let (mut sensor, handle) = MockFingerprint::new();
        handle.enroll_print(FingerprintId::new(1), 1);
        handle.enroll_print(FingerprintId::new(2), 2);

        sensor.empty_library().await.unwrap();
        assert!(handle.library().is_empty());
    }
}

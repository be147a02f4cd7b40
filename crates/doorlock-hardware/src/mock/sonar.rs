//! Mock echo-ranging sensor fed with scripted readings.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use doorlock_core::DistanceCm;

use crate::{HardwareError, Result, traits::SonarDevice};

#[derive(Debug, Clone, Copy)]
enum Reading {
    Echo(Duration),
    NoEcho,
    Fault,
}

#[derive(Debug)]
struct SonarState {
    readings: VecDeque<Reading>,
    /// Returned once the scripted readings are used up.
    resting: Reading,
    pings: usize,
}

fn lock(state: &Mutex<SonarState>) -> MutexGuard<'_, SonarState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock sonar for testing and development.
///
/// With nothing queued the sensor reports no echo.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doorlock_core::DistanceCm;
/// use doorlock_hardware::mock::MockSonar;
/// use doorlock_hardware::traits::SonarDevice;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut sonar, handle) = MockSonar::new();
///     handle.queue_distance(DistanceCm::new(10));
///
///     let echo = sonar.ping(Duration::from_millis(30)).await?.unwrap();
///     assert_eq!(DistanceCm::from_echo(echo), DistanceCm::new(10));
///     assert!(sonar.ping(Duration::from_millis(30)).await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSonar {
    state: Arc<Mutex<SonarState>>,
}

impl MockSonar {
    pub fn new() -> (Self, MockSonarHandle) {
        let state = Arc::new(Mutex::new(SonarState {
            readings: VecDeque::new(),
            resting: Reading::NoEcho,
            pings: 0,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSonarHandle { state },
        )
    }
}

impl Default for MockSonar {
    fn default() -> Self {
        Self::new().0
    }
}

impl SonarDevice for MockSonar {
    async fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        let mut state = lock(&self.state);
        state.pings += 1;
        let resting = state.resting;
        match state.readings.pop_front().unwrap_or(resting) {
            Reading::Echo(echo) if echo <= timeout => Ok(Some(echo)),
            Reading::Echo(_) | Reading::NoEcho => Ok(None),
            Reading::Fault => Err(HardwareError::timeout(timeout.as_millis() as u64)),
        }
    }
}

/// Handle for scripting a mock sonar.
#[derive(Debug, Clone)]
pub struct MockSonarHandle {
    state: Arc<Mutex<SonarState>>,
}

impl MockSonarHandle {
    /// Queue a reading that converts back to exactly `distance`.
    pub fn queue_distance(&self, distance: DistanceCm) {
        self.queue_echo(distance.to_echo());
    }

    pub fn queue_echo(&self, echo: Duration) {
        lock(&self.state).readings.push_back(Reading::Echo(echo));
    }

    pub fn queue_no_echo(&self) {
        lock(&self.state).readings.push_back(Reading::NoEcho);
    }

    /// Queue a reading that fails with a sensor error.
    pub fn queue_fault(&self) {
        lock(&self.state).readings.push_back(Reading::Fault);
    }

    /// Report `distance` on every ping once the queue is empty.
    pub fn rest_at(&self, distance: Option<DistanceCm>) {
        lock(&self.state).resting = match distance {
            Some(d) => Reading::Echo(d.to_echo()),
            None => Reading::NoEcho,
        };
    }

    pub fn ping_count(&self) -> usize {
        lock(&self.state).pings
    }
}

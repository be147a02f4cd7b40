//! Mock lock relay that records every transition with its timestamp.
//!
//! Timestamps come from `tokio::time::Instant`, so tests running on a paused
//! clock can assert exact pulse lengths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::{HardwareError, Result, traits::RelayDevice};

#[derive(Debug, Default)]
struct RelayLog {
    energized: bool,
    transitions: Vec<(Instant, bool)>,
    /// Pending write failures, consumed one per `set_energized` call.
    failures: VecDeque<bool>,
}

fn lock(log: &Mutex<RelayLog>) -> MutexGuard<'_, RelayLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock relay for testing and development.
#[derive(Debug)]
pub struct MockRelay {
    log: Arc<Mutex<RelayLog>>,
}

impl MockRelay {
    pub fn new() -> (Self, MockRelayHandle) {
        let log = Arc::new(Mutex::new(RelayLog::default()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockRelayHandle { log },
        )
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new().0
    }
}

impl RelayDevice for MockRelay {
    async fn set_energized(&mut self, energized: bool) -> Result<()> {
        let mut log = lock(&self.log);
        if log.failures.pop_front().unwrap_or(false) {
            return Err(HardwareError::communication("relay output write failed"));
        }
        log.energized = energized;
        log.transitions.push((Instant::now(), energized));
        Ok(())
    }

    async fn is_energized(&self) -> Result<bool> {
        Ok(lock(&self.log).energized)
    }
}

/// Handle for inspecting a mock relay.
#[derive(Debug, Clone)]
pub struct MockRelayHandle {
    log: Arc<Mutex<RelayLog>>,
}

impl MockRelayHandle {
    pub fn is_energized(&self) -> bool {
        lock(&self.log).energized
    }

    /// Every successful write, with the time it happened.
    pub fn transitions(&self) -> Vec<(Instant, bool)> {
        lock(&self.log).transitions.clone()
    }

    /// Number of times the relay went from de-energized to energized.
    pub fn pulse_count(&self) -> usize {
        let log = lock(&self.log);
        let mut previous = false;
        let mut count = 0;
        for (_, energized) in &log.transitions {
            if *energized && !previous {
                count += 1;
            }
            previous = *energized;
        }
        count
    }

    /// Lengths of the completed energized periods.
    pub fn pulse_lengths(&self) -> Vec<Duration> {
        let log = lock(&self.log);
        let mut started: Option<Instant> = None;
        let mut lengths = Vec::new();
        for (at, energized) in &log.transitions {
            match (energized, started) {
                (true, None) => started = Some(*at),
                (false, Some(start)) => {
                    lengths.push(at.duration_since(start));
                    started = None;
                }
                _ => {}
            }
        }
        lengths
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        let mut log = lock(&self.log);
        log.failures.extend(std::iter::repeat_n(true, count));
    }
}

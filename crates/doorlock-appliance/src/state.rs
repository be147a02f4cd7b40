//! Run-scoped appliance state.

use std::time::Duration;

use tokio::time::Instant;

use doorlock_core::ProximityState;

/// Flags that live for one run of the appliance.
#[derive(Debug, Clone, Default)]
pub struct ApplianceState {
    /// Set once at boot from the sensor handshake and never re-checked.
    pub fingerprint_available: bool,

    pub proximity: ProximityTracker,
}

/// Edge detector for "object within threshold".
///
/// # Examples
///
/// ```
/// use doorlock_appliance::ProximityTracker;
/// use doorlock_core::ProximityState;
/// use tokio::time::Instant;
///
/// let mut tracker = ProximityTracker::default();
/// let now = Instant::now();
///
/// assert_eq!(tracker.observe(true, now), Some(ProximityState::Detected));
/// assert_eq!(tracker.observe(true, now), None);
/// assert_eq!(tracker.observe(false, now), Some(ProximityState::NotDetected));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProximityTracker {
    state: ProximityState,
    detected_since: Option<Instant>,
    prolonged_notified: bool,
}

impl ProximityTracker {
    pub fn state(&self) -> ProximityState {
        self.state
    }

    /// Feed one reading; returns the new state when it changed.
    pub fn observe(&mut self, within: bool, now: Instant) -> Option<ProximityState> {
        let next = self.state.after(within)?;
        self.state = next;
        match next {
            ProximityState::Detected => {
                self.detected_since = Some(now);
                self.prolonged_notified = false;
            }
            ProximityState::NotDetected => {
                self.detected_since = None;
            }
        }
        Some(next)
    }

    /// Time spent detected, if currently detected.
    pub fn detected_for(&self, now: Instant) -> Option<Duration> {
        self.detected_since
            .map(|since| now.saturating_duration_since(since))
    }

    /// Returns `true` exactly once per detected run, the first time the
    /// run has lasted at least `after`.
    pub fn take_prolonged(&mut self, after: Duration, now: Instant) -> bool {
        if self.prolonged_notified {
            return false;
        }
        match self.detected_for(now) {
            Some(elapsed) if elapsed >= after => {
                self.prolonged_notified = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_each_edge_once() {
        let mut tracker = ProximityTracker::default();
        let now = Instant::now();
        let edges: Vec<_> = [false, true, true, true, false, false, true]
            .into_iter()
            .filter_map(|within| tracker.observe(within, now))
            .collect();

        assert_eq!(
            edges,
            vec![
                ProximityState::Detected,
                ProximityState::NotDetected,
                ProximityState::Detected
            ]
        );
    }

    #[test]
    fn test_prolonged_once_per_run() {
        let mut tracker = ProximityTracker::default();
        let start = Instant::now();
        let after = Duration::from_secs(5);

        tracker.observe(true, start);
        assert!(!tracker.take_prolonged(after, start + Duration::from_secs(4)));
        assert!(tracker.take_prolonged(after, start + Duration::from_secs(5)));
        assert!(!tracker.take_prolonged(after, start + Duration::from_secs(9)));

        tracker.observe(false, start + Duration::from_secs(10));
        assert!(!tracker.take_prolonged(after, start + Duration::from_secs(20)));

        tracker.observe(true, start + Duration::from_secs(20));
        assert!(tracker.take_prolonged(after, start + Duration::from_secs(26)));
    }

    #[test]
    fn test_detected_for() {
        let mut tracker = ProximityTracker::default();
        let start = Instant::now();
        assert!(tracker.detected_for(start).is_none());

        tracker.observe(true, start);
        assert_eq!(
            tracker.detected_for(start + Duration::from_millis(1500)),
            Some(Duration::from_millis(1500))
        );
    }
}

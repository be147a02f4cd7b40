//! Distance monitor.
//!
//! Samples the sonar once per pass and reports when an object enters or
//! leaves the proximity threshold. Only edges produce output: entering shows
//! the distance and sends one remote notification, leaving restores the idle
//! prompt. A pass without a reading leaves the state alone.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use doorlock_core::{DistanceCm, ProximityState};
use doorlock_hardware::devices::AnySonarDevice;
use doorlock_hardware::traits::SonarDevice;

use crate::config::ApplianceConfig;
use crate::mirror::RemoteMirror;
use crate::screen::Screen;
use crate::state::ProximityTracker;

/// Owns the sonar and applies the proximity threshold.
#[derive(Debug)]
pub struct DistanceMonitor {
    sonar: AnySonarDevice,
    threshold_cm: u32,
    echo_timeout: Duration,
    prolonged_presence: Option<Duration>,
}

impl DistanceMonitor {
    pub fn new(sonar: AnySonarDevice, config: &ApplianceConfig) -> Self {
        Self {
            sonar,
            threshold_cm: config.proximity_threshold_cm,
            echo_timeout: config.echo_timeout,
            prolonged_presence: config.prolonged_presence,
        }
    }

    /// Take one reading.
    ///
    /// Returns `None` when no echo arrived in time or the sensor failed.
    pub async fn measure(&mut self) -> Option<DistanceCm> {
        match self.sonar.ping(self.echo_timeout).await {
            Ok(Some(echo)) => Some(DistanceCm::from_echo(echo)),
            Ok(None) => {
                debug!("No sonar echo");
                None
            }
            Err(e) => {
                warn!(error = %e, "Sonar reading failed");
                None
            }
        }
    }

    /// Take a reading and act on a proximity edge.
    ///
    /// Returns the new state when the reading changed it.
    pub async fn check(
        &mut self,
        tracker: &mut ProximityTracker,
        screen: &mut Screen,
        mirror: &RemoteMirror,
    ) -> Option<ProximityState> {
        let distance = self.measure().await?;
        let within = distance.is_within(self.threshold_cm);
        let now = Instant::now();

        let edge = tracker.observe(within, now);
        match edge {
            Some(ProximityState::Detected) => {
                screen
                    .show("Object Detected!", &format!("Distance: {} cm", distance.as_cm()))
                    .await;
                info!(distance_cm = distance.as_cm(), "Object detected");
                mirror.notify_proximity(distance).await;
            }
            Some(ProximityState::NotDetected) => {
                screen.show_idle().await;
                info!(distance_cm = distance.as_cm(), "Object no longer detected");
            }
            None => {}
        }

        if within
            && let Some(after) = self.prolonged_presence
            && tracker.take_prolonged(after, now)
        {
            info!(
                distance_cm = distance.as_cm(),
                after_secs = after.as_secs(),
                "Object still present"
            );
            mirror.notify_prolonged_presence(after).await;
        }

        edge
    }
}

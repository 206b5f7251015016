//! Fixed-interval monitoring loop
//!
//! The monitor alternates between two states: idle between ticks, and
//! ticking while it walks the configured targets strictly in order. One
//! target's attempt always concludes before the next begins; there is no
//! concurrency across targets, which keeps session isolation trivial and the
//! load on the portal bounded. Shutdown is a watch channel observed at every
//! suspension point, so stop latency is bounded by one in-flight step, not by
//! the full check interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{AvailabilityOutcome, Target};
use crate::navigator::Navigator;
use crate::notifications::{Dispatcher, NotificationEvent};

/// Orchestrator state between and during ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Waiting for the next tick
    Idle,
    /// Iterating targets
    Ticking,
}

/// Result of one full pass over all targets
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// Exactly one outcome per processed target, in configured order
    pub outcomes: Vec<(String, AvailabilityOutcome)>,

    /// Number of dispatcher invocations made during the tick
    pub dispatched: usize,
}

impl TickSummary {
    /// Number of targets that reported available slots
    pub fn slots_found(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_slots_found())
            .count()
    }
}

/// The monitoring orchestrator
pub struct Monitor {
    /// Targets in fixed configured order
    targets: Vec<Target>,

    /// Workflow driver shared by all targets
    navigator: Navigator,

    /// Notification fan-out
    dispatcher: Dispatcher,

    /// Seconds between tick starts
    interval: Duration,

    /// Pause between consecutive targets within a tick
    pause_between_targets: Duration,

    /// Liveness message cadence in ticks (0 disables)
    status_every_ticks: u32,

    /// Current state, for observability
    state: Arc<RwLock<MonitorState>>,

    /// Shutdown signal
    shutdown: watch::Sender<bool>,

    /// Shutdown receiver template
    shutdown_rx: watch::Receiver<bool>,
}

impl Monitor {
    /// Create a monitor from configuration and assembled collaborators
    pub fn new(config: &Config, navigator: Navigator, dispatcher: Dispatcher) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            targets: config.targets(),
            navigator,
            dispatcher,
            interval: config.check_interval(),
            pause_between_targets: config.pause_between_targets(),
            status_every_ticks: config.monitor.status_every_ticks,
            state: Arc::new(RwLock::new(MonitorState::Idle)),
            shutdown,
            shutdown_rx,
        }
    }

    /// Request a graceful stop.
    ///
    /// The current step sequence finishes or aborts through the retry
    /// executor's own bounds; no new tick begins afterwards.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether a stop has been requested
    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Current orchestrator state
    pub async fn state(&self) -> MonitorState {
        *self.state.read().await
    }

    /// Run the monitoring loop until stopped.
    ///
    /// The first tick fires immediately; subsequent ticks follow the fixed
    /// interval. A tick that overruns the interval delays the next tick to
    /// the following boundary instead of bursting.
    pub async fn run(&self) {
        info!(
            targets = self.targets.len(),
            interval_secs = self.interval.as_secs(),
            "Monitor starting"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut cycle: u64 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    cycle += 1;
                    let summary = self.run_tick().await;
                    info!(
                        cycle,
                        targets = summary.outcomes.len(),
                        with_slots = summary.slots_found(),
                        dispatched = summary.dispatched,
                        "Tick complete"
                    );

                    if self.status_every_ticks > 0
                        && cycle % u64::from(self.status_every_ticks) == 0
                    {
                        self.dispatcher.announce_liveness(cycle).await;
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("Shutdown requested, monitor stopping");
                    break;
                }
            }
        }
    }

    /// Run one pass over all targets.
    ///
    /// Each target produces exactly one outcome; a failure for one target
    /// never affects the next target's processing.
    pub async fn run_tick(&self) -> TickSummary {
        *self.state.write().await = MonitorState::Ticking;
        info!("Starting check cycle");

        let mut outcomes = Vec::with_capacity(self.targets.len());
        let mut dispatched = 0;

        for (index, target) in self.targets.iter().enumerate() {
            if self.shutdown_requested() {
                warn!("Shutdown requested mid-tick, skipping remaining targets");
                break;
            }

            let outcome = self.navigator.check_target(target).await;

            match &outcome {
                AvailabilityOutcome::SlotsFound(slots) => {
                    info!(
                        province = %target.province,
                        slots = slots.len(),
                        "Appointments found!"
                    );
                    let event = NotificationEvent::new(&target.province, slots.clone());
                    self.dispatcher.dispatch(&event).await;
                    dispatched += 1;
                }
                AvailabilityOutcome::NoSlots => {
                    info!(province = %target.province, "No appointments available");
                }
                AvailabilityOutcome::WorkflowError(reason) => {
                    error!(
                        province = %target.province,
                        reason = %reason,
                        "Workflow error, portal layout may have changed"
                    );
                }
                AvailabilityOutcome::TransientFailure(reason) => {
                    warn!(
                        province = %target.province,
                        reason = %reason,
                        "Transient failure, will retry next tick"
                    );
                }
            }

            outcomes.push((target.province.clone(), outcome));

            // Brief pause before the next target, interruptible by shutdown
            if index + 1 < self.targets.len() && !self.pause_between_targets.is_zero() {
                let mut shutdown_rx = self.shutdown_rx.clone();
                tokio::select! {
                    _ = tokio::time::sleep(self.pause_between_targets) => {}
                    _ = shutdown_rx.changed() => {}
                }
            }
        }

        *self.state.write().await = MonitorState::Idle;
        TickSummary {
            outcomes,
            dispatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use crate::navigator::PortalFetcher;

    fn test_monitor() -> Monitor {
        let mut config = Config::default();
        config.monitor.pause_between_targets_secs = 0;
        config.targets.push(TargetConfig {
            province: String::from("Almería"),
            passport_number: String::from("X1234567"),
            full_name: String::from("JANE EXAMPLE DOE"),
            birth_year: String::from("1990"),
            nationality: String::from("Venezuela"),
        });

        let fetcher = PortalFetcher::new("https://portal.invalid", 1).unwrap();
        Monitor::new(&config, Navigator::new(fetcher), Dispatcher::new())
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let monitor = test_monitor();
        assert_eq!(monitor.state().await, MonitorState::Idle);
        assert!(!monitor.shutdown_requested());
    }

    #[tokio::test]
    async fn test_stop_sets_shutdown() {
        let monitor = test_monitor();
        monitor.stop();
        assert!(monitor.shutdown_requested());
    }

    #[tokio::test]
    async fn test_tick_skipped_after_shutdown() {
        let monitor = test_monitor();
        monitor.stop();

        // A tick entered after shutdown processes no targets
        let summary = monitor.run_tick().await;
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.dispatched, 0);
        assert_eq!(monitor.state().await, MonitorState::Idle);
    }

    #[test]
    fn test_tick_summary_slot_count() {
        let summary = TickSummary {
            outcomes: vec![
                ("Almería".to_string(), AvailabilityOutcome::NoSlots),
                (
                    "Cádiz".to_string(),
                    AvailabilityOutcome::SlotsFound(vec![crate::models::Slot::new(
                        "01/09/2025",
                        "10:00",
                        "Cádiz",
                    )]),
                ),
            ],
            dispatched: 1,
        };
        assert_eq!(summary.slots_found(), 1);
    }
}

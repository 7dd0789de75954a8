//! Consecutive-outcome health state machine.

use liveprobe_core::{Health, Outcome, ProbeSpec};
use tracing::debug;

/// A health change the probe loop must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The failure threshold was reached; the unit must be restarted.
    ///
    /// Reported at every threshold crossing, even when the service was
    /// already unhealthy, because each crossing warrants a restart.
    Unhealthy,
    /// The success threshold was reached on a probe with auto-restart set.
    Healthy,
}

impl Transition {
    pub fn health(self) -> Health {
        match self {
            Transition::Unhealthy => Health::Unhealthy,
            Transition::Healthy => Health::Healthy,
        }
    }
}

/// Tracks one service's consecutive outcomes against its thresholds.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    health: Health,
    consecutive_failures: u32,
    consecutive_successes: u32,
    failure_threshold: u32,
    success_threshold: u32,
    auto_restart: bool,
}

impl HealthTracker {
    pub fn new(spec: &ProbeSpec) -> Self {
        Self::with_thresholds(
            spec.failure_threshold,
            spec.success_threshold,
            spec.auto_restart,
        )
    }

    pub fn with_thresholds(failure_threshold: u32, success_threshold: u32, auto_restart: bool) -> Self {
        Self {
            health: Health::Unknown,
            consecutive_failures: 0,
            consecutive_successes: 0,
            failure_threshold,
            success_threshold,
            auto_restart,
        }
    }

    /// Record one probe outcome.
    ///
    /// Anything other than `Success` counts as a failure, including
    /// `Warning` and `Unknown`.
    pub fn record(&mut self, outcome: Outcome) -> Option<Transition> {
        if outcome.is_success() {
            self.consecutive_failures = 0;
            self.consecutive_successes += 1;

            if self.consecutive_successes < self.success_threshold {
                return None;
            }
            self.consecutive_successes = 0;

            // Recovery is only recorded when the probe is allowed to act.
            if self.auto_restart && self.health != Health::Healthy {
                debug!(previous = %self.health, "success threshold reached");
                self.health = Health::Healthy;
                return Some(Transition::Healthy);
            }
            None
        } else {
            self.consecutive_successes = 0;
            self.consecutive_failures += 1;

            if self.consecutive_failures < self.failure_threshold {
                return None;
            }
            debug!(
                failures = self.consecutive_failures,
                %outcome,
                "failure threshold reached"
            );
            self.health = Health::Unhealthy;
            Some(Transition::Unhealthy)
        }
    }

    /// Forget consecutive counts, keeping the current health.
    pub fn reset_counters(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }
}

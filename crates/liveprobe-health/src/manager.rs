//! Prober manager: one background probe loop per registered service.
//!
//! The manager keeps two maps behind separate locks. The health map is
//! read by queries and written by the loops; the loop map (stop signal and
//! task handle per service) is only touched by `add`, `remove` and
//! `shutdown`. When both are needed the loop map is locked first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use liveprobe_core::{Health, LivenessProbe, Outcome, ProbeSpec};
use liveprobe_metrics::HealthSink;
use liveprobe_probe::{ProbeOutcome, Prober};
use liveprobe_units::UnitController;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{ManagerError, ManagerResult};
use crate::tracker::{HealthTracker, Transition};

/// Tick period used when a spec asks for zero.
const FALLBACK_PERIOD: Duration = Duration::from_secs(1);

/// Longest delay or period a loop will wait. Anything longer is treated as
/// this, which keeps deadline arithmetic on `Instant` in range.
const MAX_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Health of one service plus its most recent probe result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceHealth {
    pub health: Health,
    pub last: Option<ProbeOutcome>,
}

/// Per-service loop state.
struct ProbeSlot {
    /// Stop signal. Removing the slot consumes it, so a loop is stopped once.
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

type HealthMap = Arc<RwLock<HashMap<String, ServiceHealth>>>;

/// Owns the probe loops for a dynamic set of services.
pub struct ProberManager {
    prober: Arc<dyn Prober>,
    units: Arc<dyn UnitController>,
    sink: Arc<dyn HealthSink>,
    health: HealthMap,
    loops: Mutex<HashMap<String, ProbeSlot>>,
}

impl ProberManager {
    pub fn new(
        prober: Arc<dyn Prober>,
        units: Arc<dyn UnitController>,
        sink: Arc<dyn HealthSink>,
    ) -> Self {
        Self {
            prober,
            units,
            sink,
            health: Arc::new(RwLock::new(HashMap::new())),
            loops: Mutex::new(HashMap::new()),
        }
    }

    /// Validate `probe` and start monitoring it.
    pub async fn add(&self, probe: &LivenessProbe) -> ManagerResult<()> {
        let spec = probe.validate()?;
        self.register(spec).await
    }

    /// Start monitoring an already validated spec.
    ///
    /// Fails if the service is already registered or its unit does not
    /// exist. Returns as soon as the loop is spawned.
    pub async fn register(&self, spec: ProbeSpec) -> ManagerResult<()> {
        let service = spec.service_name.clone();

        if self.loops.lock().await.contains_key(&service) {
            return Err(ManagerError::AlreadyRegistered(service));
        }

        match self.units.exists(&service).await {
            Ok(true) => {}
            Ok(false) => return Err(ManagerError::UnitNotFound(service)),
            Err(source) => return Err(ManagerError::ExistsCheck { service, source }),
        }

        let mut loops = self.loops.lock().await;
        // Checked again: another add may have won while the unit was looked up.
        if loops.contains_key(&service) {
            return Err(ManagerError::AlreadyRegistered(service));
        }

        {
            let mut health = self.health.write().await;
            health.insert(service.clone(), ServiceHealth::default());
            self.sink.set(&service, Health::Unknown);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let ctx = LoopContext {
            prober: self.prober.clone(),
            units: self.units.clone(),
            sink: self.sink.clone(),
            health: self.health.clone(),
        };
        let action = spec.action.kind();
        let spec = Arc::new(spec);
        let handle = tokio::spawn(run_probe_loop(spec, ctx, stop_rx));

        loops.insert(service.clone(), ProbeSlot { stop_tx, handle });
        info!(%service, %action, "probe loop started");
        Ok(())
    }

    /// Stop monitoring `service` and forget its health.
    ///
    /// The loop is signalled but not awaited; a probe or restart already in
    /// flight finishes on its own, and its result is discarded.
    pub async fn remove(&self, service: &str) -> ManagerResult<()> {
        let mut loops = self.loops.lock().await;
        let slot = loops
            .remove(service)
            .ok_or_else(|| ManagerError::NotRegistered(service.to_string()))?;

        // The loop may have exited already; nothing to deliver then.
        let _ = slot.stop_tx.send(true);
        drop(slot.handle);

        let mut health = self.health.write().await;
        health.remove(service);
        self.sink.forget(service);

        info!(%service, "probe loop stopped");
        Ok(())
    }

    /// Snapshot of one service's health, `None` if it is not registered.
    pub async fn health(&self, service: &str) -> Option<ServiceHealth> {
        self.health.read().await.get(service).cloned()
    }

    /// Registered service names, sorted.
    pub async fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loops.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stop every loop and wait for all of them to exit.
    pub async fn shutdown(&self) {
        let slots: Vec<(String, ProbeSlot)> = self.loops.lock().await.drain().collect();

        for (_, slot) in &slots {
            let _ = slot.stop_tx.send(true);
        }
        for (service, slot) in slots {
            if let Err(e) = slot.handle.await {
                error!(%service, error = %e, "probe loop panicked");
            }
            debug!(%service, "probe loop exited");
        }
        info!("all probe loops stopped");
    }
}

/// What a probe loop shares with its manager.
struct LoopContext {
    prober: Arc<dyn Prober>,
    units: Arc<dyn UnitController>,
    sink: Arc<dyn HealthSink>,
    health: HealthMap,
}

impl LoopContext {
    /// Store the latest outcome and apply a transition.
    ///
    /// Returns false once the service has been removed, in which case
    /// nothing is written.
    async fn record(
        &self,
        service: &str,
        outcome: ProbeOutcome,
        transition: Option<Transition>,
    ) -> bool {
        let mut health = self.health.write().await;
        let Some(entry) = health.get_mut(service) else {
            return false;
        };

        entry.last = Some(outcome);
        if let Some(transition) = transition {
            entry.health = transition.health();
            self.sink.set(service, entry.health);
        }
        true
    }

    async fn restart(&self, service: &str) {
        warn!(%service, "service unhealthy, restarting unit");
        match self.units.restart(service).await {
            Ok(result) => info!(%service, %result, "unit restart finished"),
            Err(e) => error!(%service, error = %e, "unit restart failed"),
        }
    }
}

/// Probe one service until stopped.
///
/// Each round waits the initial delay, then ticks once per period until
/// the failure threshold is reached. The unit is then restarted and a new
/// round begins with fresh counters.
async fn run_probe_loop(
    spec: Arc<ProbeSpec>,
    ctx: LoopContext,
    mut stop: watch::Receiver<bool>,
) {
    let service = spec.service_name.as_str();
    let period = tick_period(spec.period);
    let initial_delay = spec.initial_delay.min(MAX_WAIT);
    let mut tracker = HealthTracker::new(&spec);

    debug!(%service, ?period, ?initial_delay, "probe loop starting");

    'round: loop {
        tracker.reset_counters();

        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {}
            _ = stop.changed() => break 'round,
        }

        let mut ticker = tokio::time::interval_at(deadline_after(period), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break 'round,
            }

            let outcome = tokio::select! {
                outcome = ctx.prober.probe(&spec) => outcome,
                _ = stop.changed() => break 'round,
            };
            log_outcome(service, &outcome);

            let transition = tracker.record(outcome.status);
            if !ctx.record(service, outcome, transition).await {
                break 'round;
            }

            match transition {
                Some(Transition::Unhealthy) => {
                    ctx.restart(service).await;
                    continue 'round;
                }
                Some(Transition::Healthy) => info!(%service, "service healthy"),
                None => {}
            }
        }
    }

    debug!(%service, "probe loop shutting down");
}

fn tick_period(period: Duration) -> Duration {
    if period.is_zero() {
        FALLBACK_PERIOD
    } else {
        period.min(MAX_WAIT)
    }
}

fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait)
        .or_else(|| now.checked_add(MAX_WAIT))
        .unwrap_or(now)
}

fn log_outcome(service: &str, outcome: &ProbeOutcome) {
    match (&outcome.status, &outcome.error) {
        (Outcome::Success, _) => debug!(%service, "probe succeeded"),
        (status, Some(e)) => warn!(%service, %status, error = %e, "probe could not determine status"),
        (status, None) => debug!(%service, %status, output = %outcome.output, "probe did not succeed"),
    }
}

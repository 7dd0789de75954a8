//! liveprobe-health: turns probe outcomes into service health.
//!
//! # Architecture
//!
//! ```text
//! ProberManager
//!   ├── add() → validate, UnitController::exists, spawn loop
//!   ├── Per-service background task
//!   │   ├── initial delay, then one tick per period
//!   │   ├── Prober::probe() → ProbeOutcome
//!   │   ├── HealthTracker (consecutive failures / successes)
//!   │   ├── HealthSink::set() on transitions
//!   │   └── UnitController::restart() when Unhealthy, then start over
//!   └── remove() / shutdown() → watch stop signal
//! ```
//!
//! # Restart cycle
//!
//! Reaching the failure threshold marks the service Unhealthy and restarts
//! its unit. The loop then begins again from the initial delay with fresh
//! counters, giving the unit time to come up before it is judged again.
//! Recovery to Healthy is only recorded for probes with `autoRestart` set.

pub mod error;
pub mod manager;
pub mod tracker;

pub use error::{ManagerError, ManagerResult};
pub use manager::{ProberManager, ServiceHealth};
pub use tracker::{HealthTracker, Transition};

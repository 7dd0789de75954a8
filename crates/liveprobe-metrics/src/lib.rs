//! liveprobe-metrics: per-service health gauges.
//!
//! The prober manager publishes every health transition through the
//! [`HealthSink`] trait. The daemon uses [`HealthGauges`], which keeps the
//! current value per service and renders it for scraping:
//!
//! ```text
//! ProberManager ── set()/forget() ──▶ HealthGauges
//!                                        └── snapshot() → render_prometheus() → /metrics
//! ```

pub mod gauges;
pub mod prometheus;

pub use gauges::{HealthGauges, HealthSink, NoopSink};
pub use prometheus::{METRIC_NAME, render_prometheus};

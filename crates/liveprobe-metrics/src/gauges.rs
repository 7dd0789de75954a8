//! Health gauge storage.

use std::collections::BTreeMap;
use std::sync::RwLock;

use liveprobe_core::Health;
use tracing::trace;

/// Receives health changes for services.
///
/// Calls are made from probe loops and must not block.
pub trait HealthSink: Send + Sync {
    fn set(&self, service: &str, health: Health);

    /// Drop the service's series entirely.
    fn forget(&self, service: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl HealthSink for NoopSink {
    fn set(&self, _service: &str, _health: Health) {}

    fn forget(&self, _service: &str) {}
}

/// In-memory gauge per service, keyed and rendered in name order.
#[derive(Debug, Default)]
pub struct HealthGauges {
    values: RwLock<BTreeMap<String, i64>>,
}

impl HealthGauges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gauge values as `(service, value)` pairs, sorted by service.
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn get(&self, service: &str) -> Option<i64> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(service).copied()
    }

    /// Prometheus text for every gauge.
    pub fn render(&self) -> String {
        crate::prometheus::render_prometheus(&self.snapshot())
    }
}

impl HealthSink for HealthGauges {
    fn set(&self, service: &str, health: Health) {
        let value = health.gauge_value();
        trace!(%service, %health, value, "health gauge updated");
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(service.to_string(), value);
    }

    fn forget(&self, service: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(service);
    }
}

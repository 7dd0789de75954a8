//! liveprobe-units: service lifecycle control.
//!
//! The prober manager only needs two things from the host's service
//! manager: whether a unit exists (checked once at registration) and a way
//! to restart it (called on every Unhealthy transition). [`UnitController`]
//! is that seam; [`SystemctlController`] implements it by shelling out to
//! `systemctl`.

pub mod error;
pub mod systemctl;

pub use error::{UnitError, UnitResult};
pub use systemctl::SystemctlController;

/// Checks for and restarts service units.
#[async_trait::async_trait]
pub trait UnitController: Send + Sync {
    /// Whether `unit` is known to the service manager.
    async fn exists(&self, unit: &str) -> UnitResult<bool>;

    /// Restart `unit`, replacing any queued job for it. Returns the job
    /// result reported by the service manager (for example `"done"`).
    async fn restart(&self, unit: &str) -> UnitResult<String>;
}

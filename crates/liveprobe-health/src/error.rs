//! Prober manager error types.

use liveprobe_core::SpecError;
use liveprobe_units::UnitError;
use thiserror::Error;

/// Errors from registering or removing services.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("invalid probe: {0}")]
    Invalid(#[from] SpecError),

    #[error("unit not found: {0}")]
    UnitNotFound(String),

    #[error("failed to check whether unit {service} exists: {source}")]
    ExistsCheck {
        service: String,
        #[source]
        source: UnitError,
    },

    #[error("service already registered: {0}")]
    AlreadyRegistered(String),

    #[error("service not registered: {0}")]
    NotRegistered(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

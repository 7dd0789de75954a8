//! Outcome and health enums shared across the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw result of a single probe execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// The probe could not determine a status.
    #[default]
    Unknown,
    Success,
    Failure,
    /// The target answered, but not conclusively (e.g. a redirect chain was cut short).
    Warning,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Unknown => "Unknown",
            Outcome::Success => "Success",
            Outcome::Failure => "Failure",
            Outcome::Warning => "Warning",
        };
        f.write_str(s)
    }
}

/// Threshold-smoothed health of a monitored service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl Health {
    /// Value exported on the health gauge: 0 = healthy, 1 = unhealthy, -1 = unknown.
    pub fn gauge_value(self) -> i64 {
        match self {
            Health::Healthy => 0,
            Health::Unhealthy => 1,
            Health::Unknown => -1,
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Health::Unknown => "unknown",
            Health::Healthy => "healthy",
            Health::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

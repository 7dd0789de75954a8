//! Error types for probe spec validation and probe file loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for probe spec validation.
pub type SpecResult<T> = Result<T, SpecError>;

/// Result type alias for probe file loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A probe record that cannot be turned into a [`crate::ProbeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("no service name defined; every probe must name the service it checks")]
    MissingServiceName,

    #[error("no probe action defined for {service}; define one of exec, httpGet or tcpSocket")]
    NoProbeAction { service: String },

    #[error("multiple probe actions defined for {service}; only one of exec, httpGet or tcpSocket is allowed")]
    MultipleProbeActions { service: String },
}

/// Errors raised while reading and validating a probe file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read probe file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse probe file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid probe #{index} ({service:?}): {source}")]
    InvalidProbe {
        index: usize,
        service: String,
        #[source]
        source: SpecError,
    },

    #[error("service {0} is probed more than once")]
    DuplicateService(String),
}

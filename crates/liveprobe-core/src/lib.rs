//! liveprobe-core: shared types for the liveprobe daemon.
//!
//! Holds the probe outcome and service health enums used by every other
//! crate, the probe records read from the probe file, and the validation
//! step that turns a raw record into a [`ProbeSpec`] with every default
//! materialised.
//!
//! # Probe file
//!
//! ```toml
//! [[probe]]
//! serviceName = "redis.service"
//! failureThreshold = 3
//! tcpSocket = { port = 6379 }
//! ```

pub mod config;
pub mod error;
pub mod spec;
pub mod types;

pub use config::ProbeFile;
pub use error::{ConfigError, ConfigResult, SpecError, SpecResult};
pub use spec::*;
pub use types::*;

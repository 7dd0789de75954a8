//! liveprobed: HTTP surface of the liveprobe daemon.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition of `liveprobe_service_health` |
//! | GET | `/health` | Health and last probe result of every service |
//! | GET | `/health/{service}` | One service, 404 if not registered |

pub mod api;

pub use api::{ApiState, build_router};

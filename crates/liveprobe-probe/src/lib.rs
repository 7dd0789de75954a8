//! liveprobe-probe: the checks run against a monitored service.
//!
//! Three strategies share one result shape, [`ProbeOutcome`]:
//!
//! ```text
//! Dispatcher::dispatch(&ProbeSpec)
//!   ├── ProbeAction::Exec      → exec_probe()   exit code 0 / non-zero
//!   ├── ProbeAction::HttpGet   → HttpProber     status code classes, redirects
//!   └── ProbeAction::TcpSocket → tcp_probe()    connect to localhost:port
//! ```
//!
//! Every strategy is bounded by the spec's timeout. Expected negative
//! results (non-zero exit, refused connection, 5xx) are reported as
//! `Outcome::Failure` without an error; an error is only attached when the
//! status could not be determined at all.

pub mod dispatch;
pub mod exec;
pub mod http;
pub mod outcome;
pub mod tcp;

pub use dispatch::{Dispatcher, DispatcherConfig, Prober};
pub use exec::exec_probe;
pub use http::HttpProber;
pub use outcome::{ProbeError, ProbeOutcome};
pub use tcp::tcp_probe;

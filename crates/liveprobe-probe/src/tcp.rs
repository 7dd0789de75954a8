//! TCP socket probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::outcome::ProbeOutcome;

/// Connect to `host:port`; a refused or timed out connection is a plain failure.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            ProbeOutcome::success(String::new())
        }
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "tcp probe connection failed");
            ProbeOutcome::failure(format!("dial tcp {host}:{port}: {e}"))
        }
        Err(_) => {
            debug!(host, port, ?timeout, "tcp probe timed out");
            ProbeOutcome::failure(format!("dial tcp {host}:{port}: i/o timeout after {timeout:?}"))
        }
    }
}

//! `systemctl`-backed unit controller.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::UnitController;
use crate::error::{UnitError, UnitResult};

/// Upper bound for a single `systemctl` invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const LIST_UNITS_ARGS: &[&str] = &[
    "list-units",
    "--all",
    "--plain",
    "--no-legend",
    "--no-pager",
    "--full",
];

/// Talks to systemd through the `systemctl` command line tool.
#[derive(Debug, Clone)]
pub struct SystemctlController {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for SystemctlController {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl SystemctlController {
    /// Use `binary` as the `systemctl` executable (looked up on `PATH` when
    /// it is a bare name).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run `systemctl <args>` and return its stdout on a zero exit.
    async fn run(&self, args: &[&str]) -> UnitResult<String> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!(%command, "running systemctl");

        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(UnitError::Spawn {
                    program: self.binary.display().to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(UnitError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(UnitError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl UnitController for SystemctlController {
    async fn exists(&self, unit: &str) -> UnitResult<bool> {
        let listing = self.run(LIST_UNITS_ARGS).await?;
        Ok(listing_contains(&listing, unit))
    }

    async fn restart(&self, unit: &str) -> UnitResult<String> {
        self.run(&["restart", "--job-mode=replace", unit]).await?;
        info!(%unit, "unit restarted");
        Ok("done".to_string())
    }
}

/// Unit names from `systemctl list-units --plain --no-legend` output.
pub fn unit_names(listing: &str) -> impl Iterator<Item = &str> {
    listing.lines().filter_map(|line| {
        let mut columns = line.split_whitespace();
        match columns.next()? {
            // Failed units can still carry a status marker in some versions.
            "●" | "*" => columns.next(),
            name => Some(name),
        }
    })
}

/// Whether `unit` (with or without its `.service` suffix) appears in `listing`.
pub fn listing_contains(listing: &str, unit: &str) -> bool {
    let with_suffix = format!("{unit}.service");
    unit_names(listing).any(|name| name == unit || name == with_suffix)
}

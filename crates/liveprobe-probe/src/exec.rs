//! Exec probe: run a command and judge it by its exit code.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt as _};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::outcome::{ProbeError, ProbeOutcome};

/// Run `command` (argv-style, no shell) with a hard timeout.
///
/// Stdout and stderr are captured into one buffer in arrival order. Exit
/// code 0 is a success, any other exit (including being killed on timeout)
/// is a failure carrying the captured output. Only a failure to start or
/// wait for the process yields `Outcome::Unknown`.
pub async fn exec_probe(command: &[String], timeout: Duration) -> ProbeOutcome {
    let Some((program, args)) = command.split_first() else {
        return ProbeOutcome::unknown(ProbeError::EmptyCommand);
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return ProbeOutcome::unknown(ProbeError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            });
        }
    };

    let mut output = Vec::new();
    let waited = tokio::time::timeout(timeout, collect_output(&mut child, &mut output)).await;
    let text = String::from_utf8_lossy(&output).into_owned();

    match waited {
        Ok(Ok(status)) if status.success() => ProbeOutcome::success(text),
        Ok(Ok(status)) => {
            debug!(%program, %status, "exec probe exited unsuccessfully");
            ProbeOutcome::failure(text)
        }
        Ok(Err(e)) => ProbeOutcome::unknown(ProbeError::Wait {
            program: program.clone(),
            message: e.to_string(),
        }),
        Err(_) => {
            debug!(%program, ?timeout, "exec probe timed out; killing process");
            if let Err(e) = child.kill().await {
                debug!(%program, error = %e, "failed to kill timed out probe process");
            }
            ProbeOutcome::failure(text)
        }
    }
}

/// Drain stdout and stderr into `buf` as data arrives, then reap the child.
async fn collect_output(child: &mut Child, buf: &mut Vec<u8>) -> std::io::Result<ExitStatus> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_chunk) => match read? {
                0 => stdout = None,
                n => buf.extend_from_slice(&out_chunk[..n]),
            },
            read = read_chunk(&mut stderr, &mut err_chunk) => match read? {
                0 => stderr = None,
                n => buf.extend_from_slice(&err_chunk[..n]),
            },
        }
    }

    child.wait().await
}

/// Read from a stream that may already be closed; a closed stream never resolves.
async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    chunk: &mut [u8],
) -> std::io::Result<usize> {
    match reader {
        Some(reader) => reader.read(chunk).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use liveprobe_core::Outcome;

    use super::*;

    fn cmd(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn zero_exit_is_success_with_output() {
        let outcome = exec_probe(&cmd(&["echo", "hello"]), Duration::from_secs(5)).await;
        assert_eq!(outcome.status, Outcome::Success);
        assert_eq!(outcome.output, "hello\n");
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn single_token_command() {
        let outcome = exec_probe(&cmd(&["true"]), Duration::from_secs(5)).await;
        assert_eq!(outcome.status, Outcome::Success);
        assert!(outcome.output.is_empty());
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure_not_error() {
        let outcome = exec_probe(
            &cmd(&["sh", "-c", "echo broken; exit 3"]),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome.status, Outcome::Failure);
        assert_eq!(outcome.output, "broken\n");
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn stdout_and_stderr_share_one_buffer() {
        let outcome = exec_probe(
            &cmd(&["sh", "-c", "echo out; sleep 0.1; echo err >&2"]),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome.status, Outcome::Success);
        assert_eq!(outcome.output, "out\nerr\n");
    }

    #[tokio::test]
    async fn missing_binary_is_unknown() {
        let outcome = exec_probe(
            &cmd(&["/nonexistent/liveprobe-test-binary"]),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome.status, Outcome::Unknown);
        assert!(outcome.output.is_empty());
        assert!(matches!(outcome.error, Some(ProbeError::Spawn { .. })));
    }

    #[tokio::test]
    async fn empty_command_is_unknown() {
        let outcome = exec_probe(&[], Duration::from_secs(5)).await;
        assert_eq!(outcome.status, Outcome::Unknown);
        assert_eq!(outcome.error, Some(ProbeError::EmptyCommand));
    }

    #[tokio::test]
    async fn timeout_kills_and_fails() {
        let started = std::time::Instant::now();
        let outcome = exec_probe(
            &cmd(&["sh", "-c", "echo started; sleep 10"]),
            Duration::from_millis(300),
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.status, Outcome::Failure);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.output, "started\n");
    }

    #[tokio::test]
    async fn no_shell_interpretation() {
        let outcome = exec_probe(&cmd(&["echo", "$HOME", "|", "cat"]), Duration::from_secs(5)).await;
        assert_eq!(outcome.output, "$HOME | cat\n");
    }
}

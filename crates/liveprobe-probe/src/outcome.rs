//! The value every probe strategy returns.

use liveprobe_core::Outcome;
use thiserror::Error;

/// Why a probe could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("exec probe command cannot be empty")]
    EmptyCommand,

    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("failed to wait for {program}: {message}")]
    Wait { program: String, message: String },

    #[error("invalid probe request: {0}")]
    InvalidRequest(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Result of one probe execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeOutcome {
    pub status: Outcome,
    /// Diagnostic text: captured process output, response body, or error text.
    pub output: String,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: Outcome::Success,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            status: Outcome::Failure,
            output: output.into(),
            error: None,
        }
    }

    pub fn warning(output: impl Into<String>) -> Self {
        Self {
            status: Outcome::Warning,
            output: output.into(),
            error: None,
        }
    }

    /// The status could not be determined.
    pub fn unknown(error: ProbeError) -> Self {
        Self {
            status: Outcome::Unknown,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// Render an error with its whole source chain, `outer: inner: root`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !text.contains(&inner_text) {
            text.push_str(": ");
            text.push_str(&inner_text);
        }
        source = inner.source();
    }
    text
}

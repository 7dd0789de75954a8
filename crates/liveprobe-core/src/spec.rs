//! Liveness probe records and their validation.
//!
//! [`LivenessProbe`] is the record as written in the probe file: every
//! tunable is optional and the three probe mechanisms are independent
//! fields. [`LivenessProbe::validate`] checks that exactly one mechanism is
//! set and produces a [`ProbeSpec`], where the mechanism is a single
//! [`ProbeAction`] and every default has been filled in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SpecError, SpecResult};

pub const DEFAULT_INITIAL_DELAY_SECONDS: u64 = 10;
pub const DEFAULT_PERIOD_SECONDS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 1;
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 1;
pub const DEFAULT_AUTO_RESTART: bool = false;

/// Run a command; exit code 0 means healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecAction {
    /// argv-style command; the first element is the executable. No shell is involved.
    pub command: Vec<String>,
}

/// A single request header sent by an HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// Issue a GET request; 2xx means healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpGetAction {
    /// Request path on localhost, or a base URL (`https://10.0.0.5`) whose port is replaced.
    #[serde(default)]
    pub path: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

/// Open a TCP connection to `localhost:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpSocketAction {
    pub port: u16,
}

/// One probe record from the probe file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LivenessProbe {
    #[serde(default)]
    pub service_name: String,
    pub exec: Option<ExecAction>,
    pub http_get: Option<HttpGetAction>,
    pub tcp_socket: Option<TcpSocketAction>,
    pub initial_delay_seconds: Option<u64>,
    pub period_seconds: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub failure_threshold: Option<u32>,
    pub success_threshold: Option<u32>,
    pub auto_restart: Option<bool>,
}

/// The probe mechanism of a validated spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAction {
    Exec(ExecAction),
    HttpGet(HttpGetAction),
    TcpSocket(TcpSocketAction),
}

impl ProbeAction {
    /// Short mechanism name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeAction::Exec(_) => "exec",
            ProbeAction::HttpGet(_) => "httpGet",
            ProbeAction::TcpSocket(_) => "tcpSocket",
        }
    }
}

/// A validated probe: one mechanism, every default materialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSpec {
    pub service_name: String,
    pub action: ProbeAction,
    /// Wait before the first probe, and again after every restart.
    pub initial_delay: Duration,
    pub period: Duration,
    /// Upper bound for a single probe execution.
    pub timeout: Duration,
    /// Consecutive non-success outcomes before the service is restarted.
    pub failure_threshold: u32,
    /// Consecutive successes before the service is marked healthy again.
    pub success_threshold: u32,
    /// Only services with auto-restart get marked healthy after recovering.
    pub auto_restart: bool,
}

impl ProbeSpec {
    /// Create a spec with every tunable at its default.
    pub fn new(service_name: impl Into<String>, action: ProbeAction) -> Self {
        Self {
            service_name: service_name.into(),
            action,
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECONDS),
            period: Duration::from_secs(DEFAULT_PERIOD_SECONDS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            auto_restart: DEFAULT_AUTO_RESTART,
        }
    }
}

impl LivenessProbe {
    /// Check the record and fill in every unset field with its default.
    ///
    /// Fails when the service name is empty or when the number of probe
    /// mechanisms set is not exactly one. Explicit values are kept as-is.
    pub fn validate(&self) -> SpecResult<ProbeSpec> {
        if self.service_name.is_empty() {
            return Err(SpecError::MissingServiceName);
        }

        let mut actions = Vec::with_capacity(1);
        if let Some(exec) = &self.exec {
            actions.push(ProbeAction::Exec(exec.clone()));
        }
        if let Some(http) = &self.http_get {
            actions.push(ProbeAction::HttpGet(http.clone()));
        }
        if let Some(tcp) = &self.tcp_socket {
            actions.push(ProbeAction::TcpSocket(tcp.clone()));
        }

        let service = self.service_name.clone();
        let action = match actions.len() {
            0 => return Err(SpecError::NoProbeAction { service }),
            1 => actions.remove(0),
            _ => return Err(SpecError::MultipleProbeActions { service }),
        };

        Ok(ProbeSpec {
            service_name: self.service_name.clone(),
            action,
            initial_delay: Duration::from_secs(
                self.initial_delay_seconds
                    .unwrap_or(DEFAULT_INITIAL_DELAY_SECONDS),
            ),
            period: Duration::from_secs(self.period_seconds.unwrap_or(DEFAULT_PERIOD_SECONDS)),
            timeout: Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            failure_threshold: self.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
            success_threshold: self.success_threshold.unwrap_or(DEFAULT_SUCCESS_THRESHOLD),
            auto_restart: self.auto_restart.unwrap_or(DEFAULT_AUTO_RESTART),
        })
    }
}

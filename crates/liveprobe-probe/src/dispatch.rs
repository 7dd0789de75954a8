//! Probe dispatcher. Runs the strategy selected by a spec's action.

use liveprobe_core::{HttpGetAction, ProbeAction, ProbeSpec};
use reqwest::Url;

use crate::exec::exec_probe;
use crate::http::HttpProber;
use crate::outcome::{ProbeError, ProbeOutcome};
use crate::tcp::tcp_probe;

/// Host probed by TCP checks and by HTTP checks given a bare path.
pub const LOCALHOST: &str = "localhost";

/// Anything that can run one probe for a spec.
///
/// [`Dispatcher`] is the production implementation; tests substitute
/// scripted probers.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, spec: &ProbeSpec) -> ProbeOutcome;
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Follow redirects that leave the original host.
    pub follow_non_local_redirects: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            follow_non_local_redirects: true,
        }
    }
}

/// Selects exactly one strategy per spec and adapts the spec's fields to it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: HttpProber,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            http: HttpProber::new(config.follow_non_local_redirects)?,
        })
    }

    pub async fn dispatch(&self, spec: &ProbeSpec) -> ProbeOutcome {
        match &spec.action {
            ProbeAction::Exec(exec) => exec_probe(&exec.command, spec.timeout).await,
            ProbeAction::HttpGet(http) => match target_url(http) {
                Ok(url) => {
                    self.http
                        .probe(url.as_str(), &http.http_headers, spec.timeout)
                        .await
                }
                Err(e) => ProbeOutcome::unknown(e),
            },
            ProbeAction::TcpSocket(tcp) => tcp_probe(LOCALHOST, tcp.port, spec.timeout).await,
        }
    }
}

#[async_trait::async_trait]
impl Prober for Dispatcher {
    async fn probe(&self, spec: &ProbeSpec) -> ProbeOutcome {
        self.dispatch(spec).await
    }
}

/// Build the request URL for an HTTP action.
///
/// An absolute `http(s)://` path keeps its host, path and query and gets
/// the action's port; anything else is a path on `localhost:<port>`.
pub fn target_url(action: &HttpGetAction) -> Result<Url, ProbeError> {
    let path = action.path.trim();
    let lower = path.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        let mut url = Url::parse(path)
            .map_err(|e| ProbeError::InvalidRequest(format!("{path}: {e}")))?;
        url.set_port(Some(action.port))
            .map_err(|()| ProbeError::InvalidRequest(format!("{path}: cannot set a port")))?;
        return Ok(url);
    }

    let raw = if path.starts_with('/') {
        format!("http://{LOCALHOST}:{}{path}", action.port)
    } else {
        format!("http://{LOCALHOST}:{}/{path}", action.port)
    };
    Url::parse(&raw).map_err(|e| ProbeError::InvalidRequest(format!("{raw}: {e}")))
}

//! HTTP GET probe.
//!
//! The client skips TLS certificate verification, keeps no idle
//! connections, never asks for compressed responses and honours the
//! standard proxy environment variables for remote hosts. Loopback targets
//! are always reached directly. Redirects to another host can be refused,
//! in which case the redirect response itself is reported as a
//! [`Outcome::Warning`](liveprobe_core::Outcome::Warning).

use std::net::IpAddr;
use std::time::Duration;

use liveprobe_core::{HttpHeader, Outcome};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::debug;

use crate::outcome::{ProbeError, ProbeOutcome, error_chain};

/// Hops allowed before a same-host redirect chain is abandoned.
pub const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = concat!("liveprobe/", env!("CARGO_PKG_VERSION"));

/// Reusable HTTP prober; cheap to share between service loops.
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// Remote targets, through the configured proxy if any.
    proxied: Client,
    /// Loopback targets, never proxied.
    direct: Client,
    follow_non_local_redirects: bool,
}

impl HttpProber {
    /// Prober using the proxy environment variables for remote targets.
    pub fn new(follow_non_local_redirects: bool) -> Result<Self, ProbeError> {
        Self::build(follow_non_local_redirects, None)
    }

    /// Prober sending remote targets through `proxy` instead of the
    /// environment's proxy.
    pub fn with_proxy(follow_non_local_redirects: bool, proxy: Proxy) -> Result<Self, ProbeError> {
        Self::build(follow_non_local_redirects, Some(proxy))
    }

    fn build(follow_non_local_redirects: bool, proxy: Option<Proxy>) -> Result<Self, ProbeError> {
        let proxied = match proxy {
            Some(proxy) => client_builder(follow_non_local_redirects).proxy(proxy),
            None => client_builder(follow_non_local_redirects),
        };
        let direct = client_builder(follow_non_local_redirects).no_proxy();

        Ok(Self {
            proxied: finish(proxied)?,
            direct: finish(direct)?,
            follow_non_local_redirects,
        })
    }

    pub fn follows_non_local_redirects(&self) -> bool {
        self.follow_non_local_redirects
    }

    /// GET `url` with `headers`, giving up after `timeout`.
    pub async fn probe(&self, url: &str, headers: &[HttpHeader], timeout: Duration) -> ProbeOutcome {
        let request = match self.build_request(url, headers, timeout) {
            Ok(request) => request,
            Err(e) => return ProbeOutcome::unknown(e),
        };

        let client = if is_loopback_host(request.url().host_str()) {
            &self.direct
        } else {
            &self.proxied
        };

        let response = match client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let text = error_chain(&e);
                debug!(%url, error = %text, "http probe request failed");
                return ProbeOutcome::failure(text);
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(e) => {
                return ProbeOutcome {
                    status: Outcome::Failure,
                    output: String::new(),
                    error: Some(ProbeError::Body(error_chain(&e))),
                };
            }
        };

        classify(status, body)
    }

    fn build_request(
        &self,
        url: &str,
        headers: &[HttpHeader],
        timeout: Duration,
    ) -> Result<reqwest::Request, ProbeError> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for header in headers {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|e| {
                ProbeError::InvalidRequest(format!("header name {:?}: {e}", header.name))
            })?;
            let value = HeaderValue::from_str(&header.value).map_err(|e| {
                ProbeError::InvalidRequest(format!("header {:?} value: {e}", header.name))
            })?;
            header_map.insert(name, value);
        }

        self.direct
            .get(url)
            .headers(header_map)
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::InvalidRequest(error_chain(&e)))
    }
}

/// Map a final status code and body onto an outcome.
pub fn classify(status: u16, body: String) -> ProbeOutcome {
    match status {
        200..=299 => ProbeOutcome::success(body),
        300..=399 => {
            ProbeOutcome::warning(format!("Probe terminated redirects, Response body: {body}"))
        }
        _ => ProbeOutcome::failure(format!("HTTP probe failed with statuscode: {status}")),
    }
}

fn client_builder(follow_non_local_redirects: bool) -> ClientBuilder {
    Client::builder()
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .no_gzip()
        .user_agent(USER_AGENT)
        .redirect(redirect_policy(follow_non_local_redirects))
}

fn finish(builder: ClientBuilder) -> Result<Client, ProbeError> {
    builder.build().map_err(|e| ProbeError::Client(error_chain(&e)))
}

/// `localhost`, any `*.localhost` name, or a loopback address.
fn is_loopback_host(host: Option<&str>) -> bool {
    let Some(host) = host else {
        return false;
    };
    let host = host.trim_end_matches('.');
    if host.eq_ignore_ascii_case("localhost")
        || host.to_ascii_lowercase().ends_with(".localhost")
    {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

fn redirect_policy(follow_non_local_redirects: bool) -> Policy {
    if follow_non_local_redirects {
        Policy::default()
    } else {
        Policy::custom(local_redirects_only)
    }
}

fn local_redirects_only(attempt: Attempt<'_>) -> reqwest::redirect::Action {
    let original_host = attempt.previous().first().and_then(|url| url.host_str());
    let same_host = attempt.url().host_str() == original_host;
    let hops = attempt.previous().len();

    if !same_host {
        attempt.stop()
    } else if hops >= MAX_REDIRECTS {
        attempt.error(format!("stopped after {MAX_REDIRECTS} redirects"))
    } else {
        attempt.follow()
    }
}

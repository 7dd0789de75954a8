//! Probe file parser.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::spec::{LivenessProbe, ProbeSpec};

/// The probe file: an ordered list of `[[probe]]` records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeFile {
    #[serde(default, rename = "probe")]
    pub probes: Vec<LivenessProbe>,
}

impl ProbeFile {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_toml_str(&content)?;
        debug!(?path, probes = file.probes.len(), "probe file loaded");
        Ok(file)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate every record, in file order.
    ///
    /// The first invalid record aborts loading; a service name may only
    /// appear once.
    pub fn validate(&self) -> ConfigResult<Vec<ProbeSpec>> {
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.probes.len());

        for (index, probe) in self.probes.iter().enumerate() {
            let spec = probe.validate().map_err(|source| ConfigError::InvalidProbe {
                index,
                service: probe.service_name.clone(),
                source,
            })?;
            if !seen.insert(spec.service_name.clone()) {
                return Err(ConfigError::DuplicateService(spec.service_name));
            }
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Read and validate a probe file in one step.
    pub fn load(path: &Path) -> ConfigResult<Vec<ProbeSpec>> {
        Self::from_file(path)?.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::time::Duration;

    use super::*;
    use crate::error::SpecError;
    use crate::spec::{DEFAULT_PERIOD_SECONDS, HttpHeader, ProbeAction};

    const SAMPLE: &str = r#"
[[probe]]
serviceName = "nginx.service"
initialDelaySeconds = 0
periodSeconds = 5
failureThreshold = 3
autoRestart = true

[probe.httpGet]
path = "/healthz"
port = 8080
httpHeaders = [{ name = "X-Probe", value = "liveprobe" }]

[[probe]]
serviceName = "redis.service"
tcpSocket = { port = 6379 }

[[probe]]
serviceName = "cron.service"
exec = { command = ["pgrep", "cron"] }
"#;

    #[test]
    fn parse_and_validate_sample() {
        let specs = ProbeFile::from_toml_str(SAMPLE).unwrap().validate().unwrap();
        assert_eq!(specs.len(), 3);

        let nginx = &specs[0];
        assert_eq!(nginx.service_name, "nginx.service");
        assert_eq!(nginx.initial_delay, Duration::ZERO);
        assert_eq!(nginx.period, Duration::from_secs(5));
        assert_eq!(nginx.failure_threshold, 3);
        assert!(nginx.auto_restart);
        match &nginx.action {
            ProbeAction::HttpGet(http) => {
                assert_eq!(http.path, "/healthz");
                assert_eq!(http.port, 8080);
                assert_eq!(
                    http.http_headers,
                    vec![HttpHeader {
                        name: "X-Probe".to_string(),
                        value: "liveprobe".to_string(),
                    }]
                );
            }
            other => panic!("unexpected action {other:?}"),
        }

        assert!(matches!(specs[1].action, ProbeAction::TcpSocket(ref t) if t.port == 6379));
        assert_eq!(specs[1].period, Duration::from_secs(30));
        assert!(matches!(specs[2].action, ProbeAction::Exec(ref e) if e.command == ["pgrep", "cron"]));
    }

    #[test]
    fn empty_file_has_no_probes() {
        let file = ProbeFile::from_toml_str("").unwrap();
        assert!(file.validate().unwrap().is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProbeFile::from_toml_str(
            r#"
[[probe]]
serviceName = "a"
tcpSocket = { port = 1 }
periodSecs = 3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_record_reports_its_index() {
        let err = ProbeFile::from_toml_str(
            r#"
[[probe]]
serviceName = "ok"
tcpSocket = { port = 1 }

[[probe]]
serviceName = "broken"
tcpSocket = { port = 2 }
exec = { command = ["true"] }
"#,
        )
        .unwrap()
        .validate()
        .unwrap_err();

        match err {
            ConfigError::InvalidProbe {
                index,
                service,
                source,
            } => {
                assert_eq!(index, 1);
                assert_eq!(service, "broken");
                assert!(matches!(source, SpecError::MultipleProbeActions { .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn missing_service_name_is_fatal() {
        let err = ProbeFile::from_toml_str("[[probe]]\ntcpSocket = { port = 1 }\n")
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidProbe {
                source: SpecError::MissingServiceName,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_services_are_rejected() {
        let err = ProbeFile::from_toml_str(
            r#"
[[probe]]
serviceName = "dup"
tcpSocket = { port = 1 }

[[probe]]
serviceName = "dup"
tcpSocket = { port = 2 }
"#,
        )
        .unwrap()
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateService(ref s) if s == "dup"));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let specs = ProbeFile::load(file.path()).unwrap();
        assert_eq!(specs.len(), 3);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProbeFile::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn shipped_example_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../liveprobe.example.toml");
        let specs = ProbeFile::load(&path).unwrap();

        let names: Vec<&str> = specs.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(names, vec!["nginx.service", "redis-server", "cron.service"]);
        assert_eq!(specs[1].period, Duration::from_secs(DEFAULT_PERIOD_SECONDS));
    }
}

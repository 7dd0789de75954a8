//! Prometheus text exposition format.

/// Gauge name exposed for every monitored service.
pub const METRIC_NAME: &str = "liveprobe_service_health";

/// Render `(service, value)` pairs as the `liveprobe_service_health` gauge.
///
/// HELP and TYPE lines are always emitted, even with no services.
pub fn render_prometheus(gauges: &[(String, i64)]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# HELP {METRIC_NAME} Health status of services: 0 = healthy, 1 = unhealthy, -1 = unknown\n"
    ));
    out.push_str(&format!("# TYPE {METRIC_NAME} gauge\n"));
    for (service, value) in gauges {
        out.push_str(&format!(
            "{METRIC_NAME}{{service_name=\"{}\"}} {value}\n",
            escape_label(service)
        ));
    }

    out
}

fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

//! OpenTelemetry integration for telereplay.
//!
//! Builds an OTel tracing layer with a sampler tuned for replay spans: control
//! and load operations are always kept, per-tick and per-line spans are
//! heavily thinned out.
//!
//! # Activation
//!
//! Export activates (with the `telemetry` feature) when standard OTel
//! environment variables are set:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 telereplay play match.log
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to disable even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{otel_layer, OtelGuard};

/// Errors setting up OTel export.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("OTel export needs a running tokio runtime")]
    NoRuntime,
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),
}

/// Check whether OTel export should be enabled.
///
/// True when `OTEL_SDK_DISABLED` is not `"true"` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `"none"`.
pub fn otel_enabled() -> bool {
    otel_enabled_with(|key| std::env::var(key).ok())
}

fn otel_enabled_with(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Sampling rate for a span name.
///
/// | Prefix           | Rate | Rationale                          |
/// |------------------|------|------------------------------------|
/// | `replay.load`    | 100% | One per log, always worth keeping  |
/// | `replay.control` | 100% | User-driven transitions            |
/// | `replay.tick`    |  1%  | One per dispatched entry           |
/// | `extract.*`      |  1%  | One per log line                   |
/// | other            | 10%  | Default for unclassified spans     |
///
/// Spans flagged as errors are always sampled regardless of name.
pub fn sampling_rate(name: &str) -> f64 {
    if name.starts_with("replay.load") || name.starts_with("replay.control") {
        1.0
    } else if name.starts_with("replay.tick") || name.starts_with("extract") {
        0.01
    } else {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn enabled(vars: &[(&str, &str)]) -> bool {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        otel_enabled_with(|key| map.get(key).cloned())
    }

    #[test]
    fn test_disabled_without_env() {
        assert!(!enabled(&[]));
    }

    #[test]
    fn test_enabled_by_endpoint() {
        assert!(enabled(&[("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317")]));
    }

    #[test]
    fn test_sdk_disabled_wins() {
        assert!(!enabled(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("OTEL_SDK_DISABLED", "TRUE"),
        ]));
    }

    #[test]
    fn test_traces_exporter_none() {
        assert!(!enabled(&[("OTEL_TRACES_EXPORTER", "none")]));
        assert!(enabled(&[("OTEL_TRACES_EXPORTER", "otlp")]));
    }

    #[test]
    fn test_sampling_rates() {
        assert_eq!(sampling_rate("replay.load"), 1.0);
        assert_eq!(sampling_rate("replay.control"), 1.0);
        assert_eq!(sampling_rate("replay.tick"), 0.01);
        assert_eq!(sampling_rate("extract.line"), 0.01);
        assert_eq!(sampling_rate("replay.assemble"), 0.1);
        assert_eq!(sampling_rate("anything"), 0.1);
    }
}

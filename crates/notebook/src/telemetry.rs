//! Tracing subscriber and metrics recorder setup.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::error::{NotebookError, Result};

/// Installs the global subscriber: an `EnvFilter` built from
/// `config.log_level` and a plain or JSON fmt layer.
///
/// Fails if a subscriber is already installed.
pub fn init(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| NotebookError::Telemetry(e.to_string()))
}

/// Installs a Prometheus recorder as the global `metrics` recorder.
///
/// Without one, the counters and histograms the crates emit are dropped.
/// The returned handle renders the current values in the text exposition
/// format. Fails if a recorder is already installed.
pub fn install_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| NotebookError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_recorder_renders_counters() {
        let handle = install_metrics().unwrap();
        metrics::counter!("notebook_telemetry_check_total").increment(3);

        let rendered = handle.render();
        assert!(rendered.contains("notebook_telemetry_check_total 3"), "{rendered}");

        assert!(matches!(install_metrics(), Err(NotebookError::Telemetry(_))));
    }
}

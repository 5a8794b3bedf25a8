//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics`
/// endpoint. Must be called once at server startup before any metrics
/// are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Invocations total (counter, labels: variant inferred downstream).
pub const INVOCATIONS_TOTAL: &str = "invocations_total";
/// Invocation errors total (counter, labels: `error_type`).
pub const INVOCATION_ERRORS_TOTAL: &str = "invocation_errors_total";

/// Shared recorder handle for tests — the global recorder can only be
/// installed once per process, so all tests reuse one handle.
#[cfg(test)]
pub fn test_handle() -> PrometheusHandle {
    use std::sync::OnceLock;
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install test metrics recorder")
        })
        .clone()
}

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder once and return its handle.
///
/// Later calls return the already installed handle. When another recorder
/// owns the global slot (tests building several routers), a detached
/// recorder is returned so rendering still works.
pub fn install_recorder() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder already installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

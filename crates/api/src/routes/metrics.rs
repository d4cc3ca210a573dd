//! Prometheus metrics endpoint.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — render the Prometheus exposition text.
pub async fn get(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

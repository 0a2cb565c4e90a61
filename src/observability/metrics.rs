//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus recorder once per process
//! - Define framework metrics (requests, connector failures)
//! - Hand the render handle to the admin `/metrics` route
//!
//! # Metrics
//! - `mainspring_requests_total` (counter): dispatched requests by traffic class, status
//! - `mainspring_connector_failures_total` (counter): connectors whose start failed
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Without an installed recorder every update is a no-op

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::config::MetricsConfig;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder if enabled.
///
/// Returns the render handle, or `None` when disabled or when another
/// recorder already owns the global slot. Repeated calls reuse the first
/// outcome.
pub fn install(config: &MetricsConfig) -> Option<PrometheusHandle> {
    if !config.enabled {
        tracing::debug!("Metrics disabled");
        return None;
    }

    HANDLE
        .get_or_init(|| activate(PrometheusBuilder::new().build_recorder()))
        .clone()
}

/// Make `recorder` the global recorder and return its handle.
fn activate(recorder: PrometheusRecorder) -> Option<PrometheusHandle> {
    let handle = recorder.handle();
    match metrics::set_global_recorder(recorder) {
        Ok(()) => {
            describe();
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Another metrics recorder is already installed");
            None
        }
    }
}

fn describe() {
    metrics::describe_counter!(
        "mainspring_requests_total",
        "Requests dispatched by traffic class and status"
    );
    metrics::describe_counter!(
        "mainspring_connector_failures_total",
        "Connectors that failed to start or stopped serving"
    );
}

/// Record a dispatched request.
pub fn record_request(traffic: &str, status: u16) {
    metrics::counter!(
        "mainspring_requests_total",
        "traffic" => traffic.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a connector whose start failed.
pub fn record_connector_failure(connector: &str) {
    metrics::counter!(
        "mainspring_connector_failures_total",
        "connector" => connector.to_string()
    )
    .increment(1);
}

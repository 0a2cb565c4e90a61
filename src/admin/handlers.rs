use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::admin::health::{HealthCheckRegistry, HealthCheckResult};

pub async fn ping() -> &'static str {
    "pong\n"
}

pub async fn healthcheck(State(registry): State<HealthCheckRegistry>) -> Response {
    let results: BTreeMap<String, HealthCheckResult> =
        match tokio::task::spawn_blocking(move || registry.run_all()).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Health checks panicked");
                return (StatusCode::INTERNAL_SERVER_ERROR, "health checks panicked\n").into_response();
            }
        };

    let status = if results.values().all(|r| r.healthy) {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(results)).into_response()
}

pub async fn metrics(State(handle): State<PrometheusHandle>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

//! Administrative surface.
//!
//! # Routes (below the admin context path)
//! - `GET /ping` → `pong`
//! - `GET /healthcheck` → JSON of every registered health check;
//!   500 when any is unhealthy
//! - `GET /metrics` → Prometheus text (only when metrics are enabled)

pub mod handlers;
pub mod health;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::http::handler::RequestHandler;
use self::health::HealthCheckRegistry;

/// Admin request handler plus the state its built-in routes serve.
#[derive(Clone, Debug)]
pub struct AdminEnvironment {
    handler: RequestHandler,
    health_checks: HealthCheckRegistry,
    metrics: Option<PrometheusHandle>,
}

impl AdminEnvironment {
    pub fn new(handler: RequestHandler, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            handler,
            health_checks: HealthCheckRegistry::default(),
            metrics,
        }
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    pub fn health_checks(&self) -> &HealthCheckRegistry {
        &self.health_checks
    }

    /// Register the built-in admin routes.
    pub fn initialize(&self) {
        self.handler.handle("/ping", get(handlers::ping));
        self.handler.handle(
            "/healthcheck",
            get(handlers::healthcheck).with_state(self.health_checks.clone()),
        );
        if let Some(handle) = &self.metrics {
            self.handler
                .handle("/metrics", get(handlers::metrics).with_state(handle.clone()));
        }
    }
}

//! Runtime environment handed to bundles and the application.

use std::marker::PhantomData;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::admin::AdminEnvironment;
use crate::config::Configuration;
use crate::http::handler::RequestHandler;
use crate::observability::{logging, metrics};

/// The application and admin request handlers plus shared services.
#[derive(Debug)]
pub struct Environment {
    name: String,
    application: RequestHandler,
    admin: AdminEnvironment,
    metrics: Option<PrometheusHandle>,
}

impl Environment {
    pub fn new(
        name: impl Into<String>,
        application: RequestHandler,
        admin: AdminEnvironment,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            name: name.into(),
            application,
            admin,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler for application routes.
    pub fn application(&self) -> &RequestHandler {
        &self.application
    }

    pub fn admin(&self) -> &AdminEnvironment {
        &self.admin
    }

    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

/// Builds the environment from the validated configuration.
pub trait EnvironmentFactory<C>: Send + Sync {
    fn build_environment(&self, name: &str, configuration: &C) -> Environment;
}

/// Initializes logging and metrics, then creates both handlers with their
/// configured context paths.
pub struct DefaultEnvironmentFactory<C> {
    _configuration: PhantomData<fn(&C)>,
}

impl<C> DefaultEnvironmentFactory<C> {
    pub fn new() -> Self {
        Self {
            _configuration: PhantomData,
        }
    }
}

impl<C> Default for DefaultEnvironmentFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Configuration> EnvironmentFactory<C> for DefaultEnvironmentFactory<C> {
    fn build_environment(&self, name: &str, configuration: &C) -> Environment {
        logging::init(configuration.logging());
        let metrics = metrics::install(configuration.metrics());

        let server = configuration.server();
        let application =
            RequestHandler::new("application", server.application_context_path.as_str());
        let admin = AdminEnvironment::new(
            RequestHandler::new("admin", server.admin_context_path.as_str()),
            metrics.clone(),
        );

        Environment::new(name, application, admin, metrics)
    }
}

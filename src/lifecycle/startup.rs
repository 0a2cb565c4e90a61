//! Startup orchestration.
//!
//! # Stages
//! ```text
//! ConfigBuild → ConfigValidate → EnvironmentBuild → ServerBuild
//!     → BundleRun → ApplicationRun → ServerStart
//! ```
//!
//! # Design Decisions
//! - Fail fast: the first failing stage aborts the sequence, no retries
//! - Validation reports every violation, not just the first
//! - The server is built before bundles and application run, but started
//!   only after them: every route exists before any socket accepts traffic

use std::fmt;
use std::future::Future;
use std::path::Path;

use crate::config::{ConfigBuildError, Configuration, ValidationError};
use crate::http::server::ManagedServer;
use crate::lifecycle::bootstrap::Bootstrap;
use crate::lifecycle::environment::Environment;
use crate::net::connector::ConnectorError;
use crate::BoxError;

/// One step of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ConfigBuild,
    ConfigValidate,
    EnvironmentBuild,
    ServerBuild,
    BundleRun,
    ApplicationRun,
    ServerStart,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ConfigBuild => "config-build",
            Stage::ConfigValidate => "config-validate",
            Stage::EnvironmentBuild => "environment-build",
            Stage::ServerBuild => "server-build",
            Stage::BundleRun => "bundle-run",
            Stage::ApplicationRun => "application-run",
            Stage::ServerStart => "server-start",
        };
        f.write_str(name)
    }
}

/// Failure of the bootstrap sequence.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    ConfigBuild(#[from] ConfigBuildError),

    #[error("configuration is invalid: {0}")]
    Validation(#[source] ValidationError),

    #[error("unable to build server: {0}")]
    ServerBuild(#[source] ValidationError),

    #[error("bundle {name} failed: {source}")]
    Bundle {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("application {name} failed: {source}")]
    Application {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to start server: {0}")]
    Server(#[source] ConnectorError),
}

impl StartupError {
    /// Stage at which the sequence stopped.
    pub fn stage(&self) -> Stage {
        match self {
            StartupError::ConfigBuild(_) => Stage::ConfigBuild,
            StartupError::Validation(_) => Stage::ConfigValidate,
            StartupError::ServerBuild(_) => Stage::ServerBuild,
            StartupError::Bundle { .. } => Stage::BundleRun,
            StartupError::Application { .. } => Stage::ApplicationRun,
            StartupError::Server(_) => Stage::ServerStart,
        }
    }
}

/// Everything built before the server starts.
pub struct Prepared<C> {
    pub configuration: C,
    pub environment: Environment,
    pub server: ManagedServer,
}

/// Build and validate the configuration.
pub fn check<C: Configuration>(
    bootstrap: &Bootstrap<C>,
    path: Option<&Path>,
) -> Result<C, StartupError> {
    tracing::debug!(stage = %Stage::ConfigBuild, path = ?path, "Building configuration");
    let configuration = bootstrap.configuration_factory().build(path)?;

    tracing::debug!(stage = %Stage::ConfigValidate, "Validating configuration");
    let violations = bootstrap.validator().validate(&configuration);
    if let Some(error) = ValidationError::from_violations(violations) {
        tracing::error!(error = %error, "Configuration is invalid");
        return Err(StartupError::Validation(error));
    }

    Ok(configuration)
}

/// Run every stage up to, but not including, `ServerStart`.
pub fn prepare<C: Configuration>(
    bootstrap: &Bootstrap<C>,
    path: Option<&Path>,
) -> Result<Prepared<C>, StartupError> {
    let configuration = check(bootstrap, path)?;
    let application = bootstrap.application();

    let mut environment = bootstrap
        .environment_factory()
        .build_environment(application.name(), &configuration);
    tracing::debug!(stage = %Stage::EnvironmentBuild, "Environment built");

    let server = bootstrap
        .server_factory()
        .build_server(&configuration, &mut environment)
        .map_err(StartupError::ServerBuild)?;
    tracing::debug!(stage = %Stage::ServerBuild, "Server built");

    for bundle in bootstrap.bundles() {
        tracing::debug!(stage = %Stage::BundleRun, bundle = %bundle.name(), "Running bundle");
        bundle
            .run(&configuration, &mut environment)
            .map_err(|source| StartupError::Bundle {
                name: bundle.name().to_string(),
                source,
            })?;
    }

    tracing::debug!(stage = %Stage::ApplicationRun, application = %application.name(), "Running application");
    application
        .run(&configuration, &mut environment)
        .map_err(|source| StartupError::Application {
            name: application.name().to_string(),
            source,
        })?;

    Ok(Prepared {
        configuration,
        environment,
        server,
    })
}

/// Start the server and block until it stops.
///
/// When `shutdown` resolves the server is stopped and this returns once
/// every connector has returned.
pub async fn serve<F>(server: &ManagedServer, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()>,
{
    tracing::info!(stage = %Stage::ServerStart, "Starting server");

    let start = server.start();
    tokio::pin!(start);

    let result = tokio::select! {
        result = &mut start => result,
        () = shutdown => {
            if let Err(e) = server.stop() {
                tracing::warn!(error = %e, "Error while stopping server");
            }
            start.await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Unable to start server, shutting down");
            Err(StartupError::Server(e))
        }
    }
}

/// The full sequence: `prepare` then `serve` until `shutdown` resolves.
pub async fn run_server<C, F>(
    bootstrap: &Bootstrap<C>,
    path: Option<&Path>,
    shutdown: F,
) -> Result<(), StartupError>
where
    C: Configuration,
    F: Future<Output = ()>,
{
    let prepared = prepare(bootstrap, path)?;
    serve(&prepared.server, shutdown).await
}

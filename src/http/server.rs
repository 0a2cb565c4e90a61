//! Managed server: connector sets and the lifecycle coordinator.
//!
//! # Responsibilities
//! - Build one connector per configuration entry, bound to its set's handler
//! - Start every connector of both sets concurrently
//! - Treat both sets as one failure domain: the first failure stops all
//! - Reclaim every connector before `start()` returns
//!
//! # Design Decisions
//! - Each connector runs in its own task inside a `JoinSet`
//! - A `CancellationToken` tells surviving tasks the server is going down;
//!   each then gives its connector a bounded grace to return before
//!   dropping it, which releases the socket
//! - `stop()` is best-effort: every connector is asked, the first error is
//!   returned and the rest are logged
//! - No retries and no startup timeouts: a connector that hangs while
//!   binding stalls `start()` until the server is stopped

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::validation::{validate_connector, ValidationError};
use crate::config::{Configuration, ConnectorConfig};
use crate::http::handler::RequestHandler;
use crate::lifecycle::environment::Environment;
use crate::net::connector::{Connector, ConnectorError, HttpConnector, ShutdownError};
use crate::observability::metrics;

/// How long a cancelled connector may take to return from `start()`.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// The connectors of one traffic class and the handler they share.
pub struct ConnectorSet {
    handler: RequestHandler,
    connectors: Vec<Arc<dyn Connector>>,
}

impl ConnectorSet {
    /// One `HttpConnector` per entry, in input order.
    ///
    /// Fails before constructing anything if any entry is invalid
    /// (e.g. https without certificate or key).
    pub fn build(
        handler: RequestHandler,
        configs: &[ConnectorConfig],
    ) -> Result<Self, ValidationError> {
        let violations = configs
            .iter()
            .enumerate()
            .flat_map(|(i, config)| {
                let field = format!("server.{}_connectors[{}]", handler.name(), i);
                validate_connector(&field, config)
            })
            .collect();
        if let Some(error) = ValidationError::from_violations(violations) {
            return Err(error);
        }

        let connectors = configs
            .iter()
            .map(|config| {
                Arc::new(HttpConnector::new(handler.clone(), config.clone())) as Arc<dyn Connector>
            })
            .collect();

        Ok(Self {
            handler,
            connectors,
        })
    }

    /// Wrap already constructed connectors.
    pub fn from_connectors(handler: RequestHandler, connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self {
            handler,
            connectors,
        }
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    pub fn connectors(&self) -> &[Arc<dyn Connector>] {
        &self.connectors
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

/// Owns the application and admin connector sets and coordinates their
/// all-or-nothing startup.
pub struct ManagedServer {
    application: ConnectorSet,
    admin: ConnectorSet,
    cancel: CancellationToken,
}

impl ManagedServer {
    pub fn new(application: ConnectorSet, admin: ConnectorSet) -> Self {
        Self {
            application,
            admin,
            cancel: CancellationToken::new(),
        }
    }

    pub fn application(&self) -> &ConnectorSet {
        &self.application
    }

    pub fn admin(&self) -> &ConnectorSet {
        &self.admin
    }

    /// Every connector, application set first.
    pub fn connectors(&self) -> impl Iterator<Item = &Arc<dyn Connector>> {
        self.application
            .connectors()
            .iter()
            .chain(self.admin.connectors())
    }

    /// Start all connectors and wait for them.
    ///
    /// Returns the first connector failure after every connector has been
    /// stopped, or `Ok(())` once all connectors returned after `stop()`.
    pub async fn start(&self) -> Result<(), ConnectorError> {
        let mut tasks = JoinSet::new();
        for connector in self.connectors() {
            tasks.spawn(run_connector(
                Arc::clone(connector),
                self.cancel.child_token(),
            ));
        }
        tracing::info!(
            application = self.application.len(),
            admin = self.admin.len(),
            "Starting connectors"
        );

        let mut outcome = Ok(());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((name, Err(e))) => {
                    metrics::record_connector_failure(&name);
                    outcome = Err(e);
                    break;
                }
                Err(e) => {
                    metrics::record_connector_failure("unknown");
                    outcome = Err(ConnectorError::Crashed(e.to_string()));
                    break;
                }
            }
        }

        if let Err(e) = &outcome {
            tracing::error!(error = %e, "Connector failed, stopping all connectors");
            if let Err(e) = self.stop() {
                tracing::warn!(error = %e, "Error while stopping connectors");
            }
        }

        // Late outcomes are discarded, but every task is awaited so no
        // connector outlives this call.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Err(e))) => {
                    tracing::debug!(connector = %name, error = %e, "Discarding late connector outcome")
                }
                Err(e) => tracing::debug!(error = %e, "Discarding crashed connector task"),
                Ok(_) => {}
            }
        }

        outcome
    }

    /// Stop every connector. Returns the first error; the rest are logged.
    pub fn stop(&self) -> Result<(), ShutdownError> {
        let mut first = None;
        for connector in self.connectors() {
            if let Err(e) = connector.stop() {
                if first.is_none() {
                    first = Some(e);
                } else {
                    tracing::warn!(connector = %connector.name(), error = %e, "Unable to stop connector");
                }
            }
        }
        self.cancel.cancel();
        first.map_or(Ok(()), Err)
    }
}

async fn run_connector(
    connector: Arc<dyn Connector>,
    cancelled: CancellationToken,
) -> (String, Result<(), ConnectorError>) {
    let name = connector.name().to_string();
    let mut start = connector.start();

    let outcome = tokio::select! {
        outcome = &mut start => outcome,
        _ = cancelled.cancelled() => {
            match tokio::time::timeout(STOP_GRACE, &mut start).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(connector = %name, "Connector did not return after stop, dropping it");
                    Ok(())
                }
            }
        }
    };

    (name, outcome)
}

/// Builds the server from the configuration and environment.
pub trait ServerFactory<C>: Send + Sync {
    fn build_server(
        &self,
        configuration: &C,
        environment: &mut Environment,
    ) -> Result<ManagedServer, ValidationError>;
}

/// Connector sets from `ServerConfig`, bound to the environment's handlers.
/// Also registers the admin routes.
#[derive(Debug, Default)]
pub struct DefaultServerFactory;

impl<C: Configuration> ServerFactory<C> for DefaultServerFactory {
    fn build_server(
        &self,
        configuration: &C,
        environment: &mut Environment,
    ) -> Result<ManagedServer, ValidationError> {
        tracing::info!("{}", startup_message(environment.name(), Path::new(BANNER_FILE)));

        let config = configuration.server();
        let application = ConnectorSet::build(
            environment.application().clone(),
            &config.application_connectors,
        )?;
        let admin = ConnectorSet::build(
            environment.admin().handler().clone(),
            &config.admin_connectors,
        )?;
        environment.admin().initialize();

        Ok(ManagedServer::new(application, admin))
    }
}

/// Looked up in the working directory.
const BANNER_FILE: &str = "banner.txt";

/// `Starting <name>`, followed by the banner when `banner` has content.
fn startup_message(name: &str, banner: &Path) -> String {
    match std::fs::read_to_string(banner) {
        Ok(text) if !text.trim().is_empty() => format!("Starting {}\n{}", name, text),
        _ => format!("Starting {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectorKind;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Serves until stopped, counting `stop()` calls.
    #[derive(Default)]
    struct Blocking {
        stops: AtomicUsize,
        stopped: Notify,
    }

    impl Connector for Blocking {
        fn name(&self) -> &str {
            "blocking"
        }

        fn start(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
            Box::pin(async move {
                self.stopped.notified().await;
                Ok(())
            })
        }

        fn stop(&self) -> Result<(), ShutdownError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.stopped.notify_one();
            Ok(())
        }
    }

    /// Fails to bind immediately.
    #[derive(Default)]
    struct Failing {
        stops: AtomicUsize,
    }

    impl Connector for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn start(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
            Box::pin(async move {
                Err(ConnectorError::Bind {
                    addr: "127.0.0.1:1".into(),
                    source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
                })
            })
        }

        fn stop(&self) -> Result<(), ShutdownError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Never returns, even after stop.
    #[derive(Default)]
    struct Stuck;

    impl Connector for Stuck {
        fn name(&self) -> &str {
            "stuck"
        }

        fn start(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
            Box::pin(std::future::pending())
        }

        fn stop(&self) -> Result<(), ShutdownError> {
            Err(ShutdownError {
                connector: "stuck".into(),
                reason: "refusing".into(),
            })
        }
    }

    fn set(name: &str, connectors: Vec<Arc<dyn Connector>>) -> ConnectorSet {
        ConnectorSet::from_connectors(RequestHandler::new(name, ""), connectors)
    }

    #[test]
    fn startup_message_includes_banner_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let banner = dir.path().join(BANNER_FILE);

        assert_eq!(startup_message("hello", &banner), "Starting hello");

        std::fs::write(&banner, "  \n\t\n").unwrap();
        assert_eq!(startup_message("hello", &banner), "Starting hello");

        std::fs::write(&banner, "=== hello ===\n").unwrap();
        assert_eq!(
            startup_message("hello", &banner),
            "Starting hello\n=== hello ===\n"
        );
    }

    #[test]
    fn build_preserves_order() {
        let configs = vec![
            ConnectorConfig::http("127.0.0.1:9001"),
            ConnectorConfig::http("127.0.0.1:9002"),
        ];
        let set = ConnectorSet::build(RequestHandler::new("application", ""), &configs).unwrap();
        let names: Vec<&str> = set.connectors().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "application http://127.0.0.1:9001",
                "application http://127.0.0.1:9002",
            ]
        );
    }

    #[test]
    fn build_rejects_https_without_material() {
        let configs = vec![
            ConnectorConfig::http("127.0.0.1:9001"),
            ConnectorConfig {
                kind: ConnectorKind::Https,
                addr: "127.0.0.1:9443".into(),
                cert_file: Some("cert.pem".into()),
                key_file: None,
            },
        ];
        let error = match ConnectorSet::build(RequestHandler::new("admin", ""), &configs) {
            Err(error) => error,
            Ok(set) => panic!("built {} connectors", set.len()),
        };
        assert_eq!(error.violations().len(), 1);
        assert_eq!(error.violations()[0].field, "server.admin_connectors[1].key_file");
    }

    #[tokio::test]
    async fn first_failure_stops_every_connector_once() {
        let a = Arc::new(Blocking::default());
        let b = Arc::new(Blocking::default());
        let failing = Arc::new(Failing::default());
        let server = ManagedServer::new(
            set("application", vec![a.clone(), failing.clone()]),
            set("admin", vec![b.clone()]),
        );

        let result = tokio::time::timeout(Duration::from_secs(5), server.start())
            .await
            .expect("start() should return after a failure");

        assert!(matches!(result, Err(ConnectorError::Bind { .. })));
        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
        assert_eq!(b.stops.load(Ordering::SeqCst), 1);
        assert_eq!(failing.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn healthy_connectors_keep_start_pending() {
        let server = ManagedServer::new(
            set("application", vec![Arc::new(Blocking::default())]),
            set("admin", vec![Arc::new(Blocking::default())]),
        );

        let pending = tokio::time::timeout(Duration::from_millis(200), server.start()).await;
        assert!(pending.is_err(), "start() returned while connectors were serving");
    }

    #[tokio::test]
    async fn external_stop_ends_start_successfully() {
        let a = Arc::new(Blocking::default());
        let server = Arc::new(ManagedServer::new(
            set("application", vec![a.clone()]),
            set("admin", vec![Arc::new(Blocking::default())]),
        ));

        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.start().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.stop().unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_returns_first_error_and_asks_everyone() {
        let a = Arc::new(Blocking::default());
        let server = ManagedServer::new(
            set("application", vec![Arc::new(Stuck), a.clone()]),
            set("admin", vec![Arc::new(Stuck)]),
        );

        let error = server.stop().unwrap_err();
        assert_eq!(error.connector, "stuck");
        assert_eq!(a.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_connector_is_dropped_after_grace() {
        let server = ManagedServer::new(
            set("application", vec![Arc::new(Stuck), Arc::new(Failing::default())]),
            set("admin", Vec::new()),
        );

        let result = server.start().await;
        assert!(matches!(result, Err(ConnectorError::Bind { .. })));
    }

    #[tokio::test]
    async fn empty_server_starts_and_returns() {
        let server = ManagedServer::new(set("application", Vec::new()), set("admin", Vec::new()));
        assert!(server.start().await.is_ok());
    }
}

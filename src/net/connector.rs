//! Connectors: one configured listening endpoint each.
//!
//! # Responsibilities
//! - Open the endpoint on `start()` (TLS material first, then the socket)
//! - Serve the owning handler's routes until stopped or failed
//! - Close the listener on `stop()`
//!
//! # Lifecycle
//! ```text
//! New ──start()──▶ Started ──stop()──▶ Stopped
//!  └────────────────stop()────────────────┘
//! ```
//! A connector stopped before it started never binds; its `start()`
//! returns `Ok(())` immediately.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use axum_server::Handle;
use futures_util::future::BoxFuture;
use tracing::Instrument;

use crate::config::{ConnectorConfig, ConnectorKind};
use crate::http::handler::RequestHandler;
use crate::net::listener;
use crate::net::tls::{self, CertificateError};

/// Failure of a connector's `start()`.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to load TLS material for {addr}: {source}")]
    Certificate {
        addr: String,
        #[source]
        source: CertificateError,
    },

    #[error("connector on {addr} stopped serving: {source}")]
    Serve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connector {0} was already started")]
    AlreadyStarted(String),

    #[error("connector task crashed: {0}")]
    Crashed(String),
}

/// Failure of a connector's `stop()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to stop connector {connector}: {reason}")]
pub struct ShutdownError {
    pub connector: String,
    pub reason: String,
}

/// A listening endpoint managed by the server.
pub trait Connector: Send + Sync {
    /// Human-readable identity used in logs.
    fn name(&self) -> &str;

    /// Serve until stopped (`Ok`) or until serving becomes impossible (`Err`).
    ///
    /// The returned future resolves on termination, not on readiness.
    fn start(&self) -> BoxFuture<'_, Result<(), ConnectorError>>;

    /// Close the listener. No new connections are accepted afterwards;
    /// in-flight connections are not drained.
    fn stop(&self) -> Result<(), ShutdownError>;
}

const NEW: u8 = 0;
const STARTED: u8 = 1;
const STOPPED: u8 = 2;

/// HTTP or HTTPS connector backed by `axum-server`.
pub struct HttpConnector {
    name: String,
    config: ConnectorConfig,
    handler: RequestHandler,
    handle: Handle,
    state: AtomicU8,
    local_addr: OnceLock<SocketAddr>,
    span: tracing::Span,
}

impl HttpConnector {
    /// Bind `config` to `handler`. No I/O happens until `start()`.
    pub fn new(handler: RequestHandler, config: ConnectorConfig) -> Self {
        let name = format!("{} {}://{}", handler.name(), config.kind, config.addr);
        let span = tracing::info_span!(
            "connector",
            handler = %handler.name(),
            kind = %config.kind,
            addr = %config.addr,
        );
        Self {
            name,
            config,
            handler,
            handle: Handle::new(),
            state: AtomicU8::new(NEW),
            local_addr: OnceLock::new(),
            span,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Address actually bound, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    async fn serve(&self) -> Result<(), ConnectorError> {
        let addr = &self.config.addr;
        let app = self.handler.router().into_make_service();

        let result = match self.config.kind {
            ConnectorKind::Http => {
                let listener = self.bind().await?;
                axum_server::from_tcp(listener)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
            ConnectorKind::Https => {
                let tls = tls::load_tls_config(
                    self.config.cert_file.as_deref(),
                    self.config.key_file.as_deref(),
                )
                .await
                .map_err(|source| ConnectorError::Certificate {
                    addr: addr.clone(),
                    source,
                })?;
                let listener = self.bind().await?;
                axum_server::tls_rustls::from_tcp_rustls(listener, tls)
                    .handle(self.handle.clone())
                    .serve(app)
                    .await
            }
        };

        result.map_err(|source| ConnectorError::Serve {
            addr: addr.clone(),
            source,
        })
    }

    async fn bind(&self) -> Result<std::net::TcpListener, ConnectorError> {
        let (listener, local_addr) = listener::bind(&self.config.addr).await?;
        let _ = self.local_addr.set(local_addr);
        tracing::info!(address = %local_addr, routes = self.handler.routes().len(), "Connector listening");
        Ok(listener)
    }
}

impl Connector for HttpConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> BoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(
            async move {
                if let Err(state) =
                    self.state
                        .compare_exchange(NEW, STARTED, Ordering::SeqCst, Ordering::SeqCst)
                {
                    if state == STOPPED {
                        tracing::debug!("Connector stopped before start, not binding");
                        return Ok(());
                    }
                    return Err(ConnectorError::AlreadyStarted(self.name.clone()));
                }

                let result = self.serve().await;
                match &result {
                    Ok(()) => tracing::info!("Connector closed"),
                    Err(e) => tracing::error!(error = %e, "Connector failed"),
                }
                result
            }
            .instrument(self.span.clone()),
        )
    }

    fn stop(&self) -> Result<(), ShutdownError> {
        let _entered = self.span.enter();
        match self.state.swap(STOPPED, Ordering::SeqCst) {
            STARTED => {
                self.handle.shutdown();
                tracing::info!("Connector stopping");
            }
            NEW => tracing::debug!("Connector stopped before start"),
            _ => {}
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnector")
            .field("name", &self.name)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

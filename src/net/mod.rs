//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectorConfig
//!     → tls.rs (https only: load certificate + key)
//!     → listener.rs (bind socket)
//!     → connector.rs (serve the handler's routes until stopped)
//!
//! Connector States:
//!     New → Started → Stopped
//! ```
//!
//! # Design Decisions
//! - Sockets open only on start, never while building
//! - TLS material is checked before the socket is bound
//! - Stop closes the listener immediately (no connection draining)

pub mod connector;
pub mod listener;
pub mod tls;

pub use connector::{Connector, ConnectorError, HttpConnector, ShutdownError};
pub use tls::CertificateError;

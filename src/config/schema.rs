//! Configuration schema definitions.
//!
//! This module defines the configuration structure shared by every
//! application built on the framework. All types derive Serde traits for
//! deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::validation::Violation;

/// Capability every application configuration must provide.
///
/// Applications usually embed [`ServerConfig`], [`LoggingConfig`] and
/// [`MetricsConfig`] in their own struct and expose them through this trait.
pub trait Configuration: DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    fn server(&self) -> &ServerConfig;

    fn logging(&self) -> &LoggingConfig;

    fn metrics(&self) -> &MetricsConfig;

    /// Application-specific semantic checks, run after the framework's own.
    fn validate(&self) -> Vec<Violation> {
        Vec::new()
    }
}

/// Configuration for applications with no settings of their own.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DefaultConfiguration {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Configuration for DefaultConfiguration {
    fn server(&self) -> &ServerConfig {
        &self.server
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn metrics(&self) -> &MetricsConfig {
        &self.metrics
    }
}

/// Server configuration: the two connector sets and their path prefixes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Connectors serving application traffic.
    pub application_connectors: Vec<ConnectorConfig>,

    /// Connectors serving administrative traffic.
    pub admin_connectors: Vec<ConnectorConfig>,

    /// Path prefix for every application route (e.g. "/api").
    pub application_context_path: String,

    /// Path prefix for every admin route.
    pub admin_context_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            application_connectors: vec![ConnectorConfig::http(":8080")],
            admin_connectors: vec![ConnectorConfig::http(":8081")],
            application_context_path: String::new(),
            admin_context_path: String::new(),
        }
    }
}

/// Connector protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    #[default]
    Http,
    Https,
}

impl ConnectorKind {
    pub fn is_secure(self) -> bool {
        matches!(self, ConnectorKind::Https)
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Http => f.write_str("http"),
            ConnectorKind::Https => f.write_str("https"),
        }
    }
}

/// A single listening endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Protocol, `"http"` or `"https"`.
    #[serde(rename = "type", default)]
    pub kind: ConnectorKind,

    /// Bind address (e.g. "127.0.0.1:8080" or ":8080" for all interfaces).
    pub addr: String,

    /// Path to certificate file (PEM), required for https.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,

    /// Path to private key file (PEM), required for https.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
}

impl ConnectorConfig {
    /// Plaintext connector on `addr`.
    pub fn http(addr: impl Into<String>) -> Self {
        Self {
            kind: ConnectorKind::Http,
            addr: addr.into(),
            cert_file: None,
            key_file: None,
        }
    }

    /// TLS connector on `addr` with the given certificate and key.
    pub fn https(
        addr: impl Into<String>,
        cert_file: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind: ConnectorKind::Https,
            addr: addr.into(),
            cert_file: Some(cert_file.into()),
            key_file: Some(key_file.into()),
        }
    }
}

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Root log level (trace, debug, info, warn, error, off).
    pub level: String,

    /// Record format.
    pub format: LogFormat,

    /// Per-target overrides, e.g. `"mainspring::server" = "debug"`.
    pub loggers: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            loggers: BTreeMap::new(),
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and expose `/metrics` on the admin side.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Connector invariants (https needs both certificate and key)
//! - Validate value ranges (ports, context paths, log levels)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: `&C → Vec<Violation>`
//! - Runs before any connector is constructed

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::{Configuration, ConnectorConfig, LoggingConfig, ServerConfig};

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Semantically invalid configuration. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Wrap a violation list, or `None` when there is nothing to report.
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration has {} error(s): ", self.violations.len())?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Pluggable validator run by the bootstrap sequence.
pub trait Validator<C>: Send + Sync {
    fn validate(&self, configuration: &C) -> Vec<Violation>;
}

/// Framework checks followed by the configuration's own `validate()` hook.
pub struct DefaultValidator<C> {
    _configuration: PhantomData<fn(&C)>,
}

impl<C> DefaultValidator<C> {
    pub fn new() -> Self {
        Self {
            _configuration: PhantomData,
        }
    }
}

impl<C> Default for DefaultValidator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Configuration> Validator<C> for DefaultValidator<C> {
    fn validate(&self, configuration: &C) -> Vec<Violation> {
        let mut violations = validate_server(configuration.server());
        violations.extend(validate_logging(configuration.logging()));
        violations.extend(configuration.validate());
        violations
    }
}

/// Check both connector lists and the context paths.
pub fn validate_server(config: &ServerConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (i, connector) in config.application_connectors.iter().enumerate() {
        let field = format!("server.application_connectors[{}]", i);
        violations.extend(validate_connector(&field, connector));
    }
    for (i, connector) in config.admin_connectors.iter().enumerate() {
        let field = format!("server.admin_connectors[{}]", i);
        violations.extend(validate_connector(&field, connector));
    }

    violations.extend(validate_context_path(
        "server.application_context_path",
        &config.application_context_path,
    ));
    violations.extend(validate_context_path(
        "server.admin_context_path",
        &config.admin_context_path,
    ));

    violations
}

/// Check a single connector entry; `field` prefixes every reported field.
pub fn validate_connector(field: &str, connector: &ConnectorConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if connector.addr.trim().is_empty() {
        violations.push(Violation::new(format!("{}.addr", field), "must not be empty"));
    } else if !has_valid_port(&connector.addr) {
        violations.push(Violation::new(
            format!("{}.addr", field),
            format!("must be of the form host:port (got {:?})", connector.addr),
        ));
    }

    if connector.kind.is_secure() {
        let missing = |path: &Option<std::path::PathBuf>| {
            path.as_ref().map_or(true, |p| p.as_os_str().is_empty())
        };
        if missing(&connector.cert_file) {
            violations.push(Violation::new(
                format!("{}.cert_file", field),
                "is required for https connectors",
            ));
        }
        if missing(&connector.key_file) {
            violations.push(Violation::new(
                format!("{}.key_file", field),
                "is required for https connectors",
            ));
        }
    }

    violations
}

fn has_valid_port(addr: &str) -> bool {
    addr.rsplit_once(':')
        .map(|(_, port)| port.parse::<u16>().is_ok())
        .unwrap_or(false)
}

fn validate_context_path(field: &str, path: &str) -> Option<Violation> {
    if path.is_empty() {
        return None;
    }
    if !path.starts_with('/') {
        return Some(Violation::new(field, "must start with '/'"));
    }
    if path.ends_with('/') {
        return Some(Violation::new(field, "must not end with '/'"));
    }
    None
}

fn validate_logging(config: &LoggingConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    if LevelFilter::from_str(&config.level).is_err() {
        violations.push(Violation::new(
            "logging.level",
            format!("is not a valid level (got {:?})", config.level),
        ));
    }
    for (target, level) in &config.loggers {
        if LevelFilter::from_str(level).is_err() {
            violations.push(Violation::new(
                format!("logging.loggers.{}", target),
                format!("is not a valid level (got {:?})", level),
            ));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ConnectorKind, DefaultConfiguration};

    fn fields(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn default_configuration_is_valid() {
        let config = DefaultConfiguration::default();
        assert!(DefaultValidator::new().validate(&config).is_empty());
    }

    #[test]
    fn https_without_material_reports_both_fields() {
        let connector = ConnectorConfig {
            kind: ConnectorKind::Https,
            addr: ":8443".into(),
            cert_file: None,
            key_file: Some("".into()),
        };
        let violations = validate_connector("c", &connector);
        assert_eq!(fields(&violations), vec!["c.cert_file", "c.key_file"]);
    }

    #[test]
    fn http_ignores_tls_fields() {
        assert!(validate_connector("c", &ConnectorConfig::http("127.0.0.1:80")).is_empty());
    }

    #[test]
    fn bad_addresses() {
        for addr in ["", "localhost", "host:http", "127.0.0.1:70000"] {
            let violations = validate_connector("c", &ConnectorConfig::http(addr));
            assert_eq!(fields(&violations), vec!["c.addr"], "addr {:?}", addr);
        }
        assert!(validate_connector("c", &ConnectorConfig::http(":0")).is_empty());
        assert!(validate_connector("c", &ConnectorConfig::http("[::1]:8080")).is_empty());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = DefaultConfiguration::default();
        config.server.admin_connectors = vec![ConnectorConfig {
            kind: ConnectorKind::Https,
            addr: ":8444".into(),
            cert_file: Some("cert.pem".into()),
            key_file: None,
        }];
        config.server.application_context_path = "api/".into();
        config.logging.level = "loud".into();
        config
            .logging
            .loggers
            .insert("mainspring::server".into(), "debug".into());

        let violations = DefaultValidator::new().validate(&config);
        assert_eq!(
            fields(&violations),
            vec![
                "server.admin_connectors[0].key_file",
                "server.application_context_path",
                "logging.level",
            ]
        );
    }

    #[test]
    fn error_lists_all_violations() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());

        let error = ValidationError::from_violations(vec![
            Violation::new("a", "is bad"),
            Violation::new("b", "is worse"),
        ])
        .unwrap();
        assert_eq!(error.violations().len(), 2);
        assert_eq!(error.to_string(), "configuration has 2 error(s): a is bad, b is worse");
    }
}

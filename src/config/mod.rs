//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize into C: Configuration)
//!     → validation.rs (semantic checks, every violation collected)
//!     → C (validated, immutable)
//!     → handed by reference to bundles, application and server factory
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Applications extend the schema through the `Configuration` trait

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigBuildError, ConfigurationFactory, TomlConfigurationFactory};
pub use schema::{
    Configuration, ConnectorConfig, ConnectorKind, DefaultConfiguration, LogFormat,
    LoggingConfig, MetricsConfig, ServerConfig,
};
pub use validation::{DefaultValidator, ValidationError, Validator, Violation};

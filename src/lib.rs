//! Application bootstrap and server lifecycle framework.
//!
//! Turns a TOML configuration into running application and admin
//! connectors, after bundles and the application have registered their
//! routes.

pub mod admin;
pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

/// Error type returned by bundles, applications and health checks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::{Configuration, DefaultConfiguration};
pub use http::{ManagedServer, RequestHandler};
pub use lifecycle::{Application, Bootstrap, Bundle, Environment};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap (bootstrap.rs):
//!     Application + bundles + factories for one command invocation
//!
//! Startup (startup.rs):
//!     Build config → Validate → Environment → Server → Bundles
//!     → Application → Start connectors
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop every connector → server returns
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then environment, then listeners
//! - Listeners start last (traffic only when every route is registered)
//! - Stop closes listeners; in-flight requests are not drained

pub mod bootstrap;
pub mod environment;
pub mod signals;
pub mod startup;

pub use bootstrap::{Application, Bootstrap, Bundle};
pub use environment::{DefaultEnvironmentFactory, Environment, EnvironmentFactory};
pub use startup::{Prepared, Stage, StartupError};

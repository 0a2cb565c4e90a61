//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Bundles / application
//!     → handler.rs (register pattern → behavior, per traffic class)
//!
//! Server build
//!     → server.rs (connector sets bound to the handlers)
//!
//! Accepted request
//!     → handler.rs (route snapshot, most specific pattern, or 404)
//!     → behavior
//! ```

pub mod handler;
pub mod server;

pub use handler::{Behavior, RequestHandler, RouteTable};
pub use server::{ConnectorSet, DefaultServerFactory, ManagedServer, ServerFactory};

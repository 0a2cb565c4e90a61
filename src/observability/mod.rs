//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, filtered per module target)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Admin `/metrics` endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Metrics are cheap (facade no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;

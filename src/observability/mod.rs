//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! client, parser, executor, middleware produce:
//!     → logging.rs (structured log events, JSON or pretty)
//!     → metrics.rs (outbound call counters/histograms, submissions)
//!     → tracing.rs (outbound spans carrying the request id)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span and log line
//! - No exporter is installed here; the host process owns that choice

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use logging::{init_logging, EXTERNAL_TARGET};

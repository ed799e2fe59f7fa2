//! Outbound request client.
//!
//! # Data Flow
//! ```text
//! DownstreamRegistry (one per process, built from ServiceConfig)
//!     → DownstreamClient (one per peer service, fixed ParserKind)
//!     → ConnectionPool (shared reqwest::Client + concurrency caps)
//! ```
//!
//! # Design Decisions
//! - No global session: the pool is an owned value shared by `Arc`
//! - The request context is an explicit argument on every call

pub mod downstream;
pub mod pool;
pub mod registry;
pub mod request;

pub use downstream::{DownstreamClient, TIMEOUT_MESSAGE};
pub use pool::{ConnectionPool, PoolPermit};
pub use registry::DownstreamRegistry;
pub use request::{RequestBody, RequestParams};

//! Outbound request composition.
//!
//! # Data Flow
//! ```text
//! base host + path
//!     → query.rs (merge typed query parameters into the URL)
//! caller headers + RequestContext + ServiceIdentity
//!     → headers.rs (fill identity/correlation headers the caller left out)
//! ```
//!
//! # Design Decisions
//! - Pure functions, no I/O, no shared state
//! - Caller intent always wins on header conflicts

pub mod headers;
pub mod query;

pub use headers::{compose_headers, identity_headers, APPLICATION_JSON, MULTIPART_FORM_DATA};
pub use query::{apply_query, QueryParams, QueryValue};

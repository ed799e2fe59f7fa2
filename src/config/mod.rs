//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), supplied by the host process
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → read once when the DownstreamRegistry and ConnectionPool are built
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::DownstreamConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServiceConfig;
pub use schema::ServiceIdentity;
pub use validation::ValidationError;

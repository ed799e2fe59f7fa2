//! Service-to-service communication core.
//!
//! # Architecture Overview
//!
//! ```text
//!     inbound request headers
//!             │
//!             ▼
//!     ┌───────────────┐      ┌──────────────────────────────────────────────┐
//!     │    context    │─────▶│                 task executor                 │
//!     │ RequestContext│      │  Task(main) ─┐                                │
//!     └───────────────┘      │  Task ───────┼─▶ join_all ─▶ annotated tasks  │
//!                            │  Task ───────┘                                │
//!                            └──────┬───────────────────────────────────────┘
//!                                   │ each task typically wraps:
//!                                   ▼
//!     ┌─────────┐    ┌──────────────────┐    ┌────────────┐    ┌─────────────┐
//!     │ compose │───▶│ DownstreamClient │───▶│ pool       │───▶│ peer service│
//!     │query/hdr│    │ timeout, decode  │    │ caps+client│    └──────┬──────┘
//!     └─────────┘    └────────┬─────────┘    └────────────┘           │
//!                             ▼                                       │
//!                    ┌─────────────────┐  AsyncTaskResponse           │
//!                    │ parser          │◀─────────────────────────────┘
//!                    │ ParserKind      │  or ServiceError
//!                    └─────────────────┘
//! ```
//!
//! Cross-cutting: `config` (TOML + validation), `error` (typed failures),
//! `envelope` (wire envelopes), `observability` (logs, metrics, spans).

pub mod client;
pub mod compose;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod parser;
pub mod task;

pub use client::{ConnectionPool, DownstreamClient, DownstreamRegistry, RequestParams};
pub use config::ServiceConfig;
pub use context::RequestContext;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use parser::ParserKind;
pub use task::{AsyncTaskResponse, Task, TaskExecutor};

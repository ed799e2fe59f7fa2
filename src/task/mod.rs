//! Concurrent fan-out of downstream calls.
//!
//! # Data Flow
//! ```text
//! handler builds Task { future, result_key, is_main }
//!     → executor.rs (main-task check, then run all concurrently)
//!     → each Task annotated with Ok(AsyncTaskResponse) or Err(ServiceError)
//!     → handler inspects main task(s)
//! ```

pub mod executor;
pub mod response;
#[allow(clippy::module_inception)]
pub mod task;

pub use executor::{ensure_main_succeeded, find_task, TaskExecutor};
pub use response::AsyncTaskResponse;
pub use task::{Task, TaskFuture};

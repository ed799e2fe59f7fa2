//! Concurrent task submission.
//!
//! # Responsibilities
//! - Refuse a submission with no main task before any work starts
//! - Run every task concurrently and wait for all of them
//! - Attach each outcome to its own task, in submission order
//!
//! # Design Decisions
//! - One task failing (or panicking) never cancels its siblings
//! - `submit` consumes the executor: an executor runs at most once
//! - Aggregate policy is the caller's; [`ensure_main_succeeded`] covers the
//!   usual "fail only if a main task failed" rule

use futures_util::future::join_all;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::error::{ServiceError, ServiceResult};
use crate::observability::metrics;
use crate::task::{AsyncTaskResponse, Task};

const NO_MAIN_TASK: &str = "At least one task should be main while submitting to executor";

/// Runs a fixed list of tasks together.
#[derive(Debug)]
pub struct TaskExecutor<T = AsyncTaskResponse> {
    tasks: Vec<Task<T>>,
}

impl<T: Send + 'static> TaskExecutor<T> {
    pub fn new(tasks: Vec<Task<T>>) -> Self {
        Self { tasks }
    }

    pub fn push(&mut self, task: Task<T>) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run all tasks and return them annotated with their outcomes.
    ///
    /// Fails only when no task is marked main; in that case nothing runs.
    pub async fn submit(self) -> ServiceResult<Vec<Task<T>>> {
        let mut tasks = self.tasks;

        if !tasks.iter().any(Task::is_main) {
            tracing::warn!(tasks = tasks.len(), "Rejected submission without a main task");
            metrics::record_task_submission("rejected");
            return Err(ServiceError::task_executor(NO_MAIN_TASK));
        }

        let pending: Vec<_> = tasks
            .iter_mut()
            .enumerate()
            .filter_map(|(index, task)| task.take_future().map(|fut| (index, fut)))
            .map(|(index, fut)| async move {
                let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(ServiceError::task_executor(format!(
                        "Task panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                };
                (index, outcome)
            })
            .collect();

        tracing::debug!(tasks = tasks.len(), running = pending.len(), "Submitting tasks");

        for (index, outcome) in join_all(pending).await {
            tasks[index].set_result(outcome);
        }

        let failed = tasks.iter().filter(|t| t.error().is_some()).count();
        let outcome = if failed == 0 { "complete" } else { "partial" };
        tracing::debug!(tasks = tasks.len(), failed, "Tasks finished");
        metrics::record_task_submission(outcome);

        Ok(tasks)
    }
}

impl<T> Default for TaskExecutor<T> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

/// Find a task by its result key.
pub fn find_task<'a, T>(tasks: &'a [Task<T>], result_key: &str) -> Option<&'a Task<T>> {
    tasks.iter().find(|t| t.result_key() == result_key)
}

/// Return the first main task's error, if any main task failed.
pub fn ensure_main_succeeded<T>(tasks: &[Task<T>]) -> ServiceResult<()> {
    match tasks.iter().filter(|t| t.is_main()).find_map(Task::error) {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

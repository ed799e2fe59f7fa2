//! A single unit of concurrent work.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::fmt;
use std::future::Future;

use crate::error::{ServiceError, ServiceResult};
use crate::task::AsyncTaskResponse;

/// Boxed future a task wraps.
pub type TaskFuture<T> = BoxFuture<'static, ServiceResult<T>>;

/// Work submitted to a [`TaskExecutor`](crate::task::TaskExecutor).
///
/// The `result` slot is written exactly once, by the executor, after the
/// wrapped future has completed or panicked.
pub struct Task<T = AsyncTaskResponse> {
    future: Option<TaskFuture<T>>,
    result_key: String,
    is_main: bool,
    result: Option<ServiceResult<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// A main task: its failure is fatal to the submission.
    pub fn new<F>(result_key: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = ServiceResult<T>> + Send + 'static,
    {
        Self {
            future: Some(future.boxed()),
            result_key: result_key.into(),
            is_main: true,
            result: None,
        }
    }

    /// A task whose failure the caller may tolerate.
    pub fn secondary<F>(result_key: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = ServiceResult<T>> + Send + 'static,
    {
        Self::new(result_key, future).with_main(false)
    }
}

impl<T> Task<T> {
    pub fn with_main(mut self, is_main: bool) -> Self {
        self.is_main = is_main;
        self
    }

    pub fn result_key(&self) -> &str {
        &self.result_key
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Outcome, once the executor has run the task.
    pub fn result(&self) -> Option<&ServiceResult<T>> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ServiceResult<T>> {
        self.result.take()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, Some(Ok(_)))
    }

    /// Error captured for this task, if it failed.
    pub fn error(&self) -> Option<&ServiceError> {
        match &self.result {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn take_future(&mut self) -> Option<TaskFuture<T>> {
        self.future.take()
    }

    pub(crate) fn set_result(&mut self, result: ServiceResult<T>) {
        if self.result.is_none() {
            self.result = Some(result);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("result_key", &self.result_key)
            .field("is_main", &self.is_main)
            .field("pending", &self.future.is_some())
            .field("result", &self.result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_once() {
        let mut task: Task<u32> = Task::secondary("count", async { Ok(1) });
        assert!(!task.is_complete());
        assert!(!task.is_main());

        task.set_result(Ok(7));
        task.set_result(Err(ServiceError::bad_request("late")));

        assert!(task.is_success());
        assert_eq!(task.result().and_then(|r| r.as_ref().ok()), Some(&7));
        assert!(task.error().is_none());
    }

    #[test]
    fn test_tasks_are_main_by_default() {
        let task: Task<()> = Task::new("profile", async { Ok(()) });
        assert!(task.is_main());
        assert_eq!(task.result_key(), "profile");

        let aux: Task<()> = Task::new("aux", async { Ok(()) }).with_main(false);
        assert!(!aux.is_main());
    }
}

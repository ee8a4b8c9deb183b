//! Error types for the runner and its tasks.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced synchronously to the caller of a [`crate::Runner`] operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// A queue replacement or task table was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure raised by a single aggregator or sensor.
///
/// Never propagated out of a cycle: the runner hands it to its notifier
/// and moves on to the next task.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("task '{task}' failed: {message}")]
pub struct TaskError {
    /// Name of the task that failed.
    pub task: String,
    /// Human-readable failure description.
    pub message: String,
}

impl TaskError {
    pub fn new(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        let err = TaskError::new("cpu", "probe unavailable");
        assert_eq!(err.to_string(), "task 'cpu' failed: probe unavailable");
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = RunnerError::InvalidArgument("empty task name".to_string());
        assert_eq!(err.to_string(), "invalid argument: empty task name");
    }
}

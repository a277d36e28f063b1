//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::task::TaskType;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Task rejected at admission; the scheduler is left unchanged.
    #[error("invalid task: {0}")]
    InvalidTask(String),
    /// Target backend has no spare concurrency. Internal signal driving the
    /// look-ahead policy; never returned from `run_once`.
    #[error("{0} backend saturated")]
    BackendSaturated(TaskType),
    /// Backend submission infrastructure failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

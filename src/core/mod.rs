//! Core scheduling abstractions: tasks, ordering, orchestration.

pub mod error;
pub mod metrics;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use error::{AppResult, SchedulerError};
pub use metrics::{MetricsCollector, MetricsSummary, TaskMetrics};
pub use queue::{PendingQueue, QueueEntry};
pub use scheduler::Scheduler;
pub use task::{
    AsyncWork, SyncWork, Task, TaskBuilder, TaskId, TaskSnapshot, TaskState, TaskType, Work,
    WorkResult, DEFAULT_PRIORITY,
};

//! IO backend: non-blocking operations on the async runtime.
//!
//! IO payloads are spawned directly onto the runtime; resolution occurs on
//! completion notification through the shared channel. The backend holds no
//! threads of its own.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::backend::{report, report_marker, Backend, CompletionSender, DispatchedTask};
use crate::core::error::SchedulerError;
use crate::core::task::{TaskType, Work};
use crate::runtime::Spawn;

/// Async-runtime backend for IO-bound tasks.
pub struct IoBackend {
    max_in_flight: usize,
    spawner: Arc<dyn Spawn>,
    completions: CompletionSender,
}

impl IoBackend {
    /// Create a backend allowing `max_in_flight` concurrent operations.
    pub fn new(
        max_in_flight: usize,
        spawner: Arc<dyn Spawn>,
        completions: CompletionSender,
    ) -> Self {
        Self {
            max_in_flight,
            spawner,
            completions,
        }
    }
}

impl Backend for IoBackend {
    fn kind(&self) -> TaskType {
        TaskType::Io
    }

    fn capacity(&self) -> usize {
        self.max_in_flight
    }

    fn dispatch(&mut self, task: DispatchedTask) -> Result<(), SchedulerError> {
        let op = match task.work {
            Some(Work::Async(op)) => op,
            Some(Work::Sync(_)) => {
                return Err(SchedulerError::Backend(
                    "sync payload routed to io backend".into(),
                ));
            }
            None => {
                report_marker(&self.completions, task.id);
                return Ok(());
            }
        };

        debug!(task = %task.id, name = %task.name, "starting io operation");

        let completions = self.completions.clone();
        let id = task.id;
        let started = Instant::now();
        self.spawner.spawn(Box::pin(async move {
            let result = op.await;
            report(&completions, id, started, result);
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::completion_channel;
    use crate::core::task::{Task, TaskId};
    use crate::runtime::TokioSpawner;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_operation_and_reports() {
        let (tx, rx) = completion_channel();
        let mut backend = IoBackend::new(4, Arc::new(TokioSpawner::current()), tx);

        let task = Task::builder("log_writer", TaskType::Io)
            .work_future(async { Ok(()) })
            .build();
        backend
            .dispatch(DispatchedTask {
                id: TaskId(1),
                name: task.name,
                work: task.work,
            })
            .unwrap();

        let completion = tokio::task::spawn_blocking(move || {
            rx.recv_timeout(Duration::from_secs(5)).unwrap()
        })
        .await
        .unwrap();
        assert_eq!(completion.id, TaskId(1));
        assert!(completion.outcome.is_success());
    }

    #[tokio::test]
    async fn marker_resolves_without_spawn() {
        let (tx, rx) = completion_channel();
        let mut backend = IoBackend::new(1, Arc::new(TokioSpawner::current()), tx);

        let task = Task::builder("noop", TaskType::Io).build();
        backend
            .dispatch(DispatchedTask {
                id: TaskId(2),
                name: task.name,
                work: task.work,
            })
            .unwrap();

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.id, TaskId(2));
        assert!(completion.outcome.is_success());
    }
}

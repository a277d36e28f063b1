//! CPU backend: dedicated OS worker threads.
//!
//! Work closures run to completion on a fixed pool of named worker threads
//! fed by a bounded crossbeam channel. The scheduler enforces the concurrency
//! capacity, so the channel bound only guards against protocol violations.
//! Dropping the backend drops the submission side; idle workers observe the
//! closed channel and exit.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::backend::{report, report_marker, Backend, CompletionSender, DispatchedTask};
use crate::core::error::SchedulerError;
use crate::core::task::{SyncWork, TaskId, TaskType, Work};

struct CpuJob {
    id: TaskId,
    name: String,
    work: SyncWork,
    accepted: Instant,
}

/// Worker-thread backend for processor-bound tasks.
pub struct CpuBackend {
    capacity: usize,
    job_tx: Option<Sender<CpuJob>>,
    completions: CompletionSender,
    workers: Vec<JoinHandle<()>>,
}

impl CpuBackend {
    /// Spawn `workers` dedicated threads reporting into `completions`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Backend`] if a worker thread cannot be spawned.
    pub fn new(workers: usize, completions: CompletionSender) -> Result<Self, SchedulerError> {
        let (job_tx, job_rx) = bounded::<CpuJob>(workers);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            handles.push(spawn_worker(worker_id, job_rx.clone(), completions.clone())?);
        }

        info!(workers, "cpu backend started");

        Ok(Self {
            capacity: workers,
            job_tx: Some(job_tx),
            completions,
            workers: handles,
        })
    }

    /// Drop the submission side and join every worker.
    ///
    /// Idle workers exit as soon as the channel closes; busy workers finish
    /// their current closure first. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.job_tx.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("cpu worker panicked");
            }
        }
        info!("cpu backend shut down");
    }
}

impl Backend for CpuBackend {
    fn kind(&self) -> TaskType {
        TaskType::Cpu
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn dispatch(&mut self, task: DispatchedTask) -> Result<(), SchedulerError> {
        let Some(job_tx) = self.job_tx.as_ref() else {
            return Err(SchedulerError::Backend("cpu backend shut down".into()));
        };

        let work = match task.work {
            Some(Work::Sync(work)) => work,
            Some(Work::Async(_)) => {
                return Err(SchedulerError::Backend(
                    "async payload routed to cpu backend".into(),
                ));
            }
            None => {
                report_marker(&self.completions, task.id);
                return Ok(());
            }
        };

        let job = CpuJob {
            id: task.id,
            name: task.name,
            work,
            accepted: Instant::now(),
        };

        match job_tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                Err(SchedulerError::BackendSaturated(TaskType::Cpu))
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                Err(SchedulerError::Backend("cpu worker channel closed".into()))
            }
        }
    }
}

impl Drop for CpuBackend {
    fn drop(&mut self) {
        // Close the channel but do not join: a closure blocked on external
        // input would wedge the drop. Explicit shutdown() joins.
        if self.job_tx.take().is_some() {
            debug!("cpu backend dropped without explicit shutdown, workers detached");
        }
    }
}

fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<CpuJob>,
    completions: CompletionSender,
) -> Result<JoinHandle<()>, SchedulerError> {
    thread::Builder::new()
        .name(format!("hd-cpu-{worker_id}"))
        .spawn(move || {
            debug!(worker_id, "cpu worker started");
            // Blocking recv; a closed channel ends the loop.
            while let Ok(job) = job_rx.recv() {
                debug!(worker_id, task = %job.id, name = %job.name, "cpu worker executing");
                let result = (job.work)();
                report(&completions, job.id, job.accepted, result);
            }
            debug!(worker_id, "cpu worker exiting");
        })
        .map_err(|e| SchedulerError::Backend(format!("failed to spawn cpu worker: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::completion_channel;
    use crate::core::task::Task;
    use std::time::Duration;

    fn dispatched(id: u64, task: Task) -> DispatchedTask {
        DispatchedTask {
            id: TaskId(id),
            name: task.name,
            work: task.work,
        }
    }

    #[test]
    fn executes_closure_and_reports() {
        let (tx, rx) = completion_channel();
        let mut backend = CpuBackend::new(2, tx).unwrap();

        let task = Task::builder("adder", TaskType::Cpu)
            .work_fn(|| Ok(()))
            .build();
        backend.dispatch(dispatched(1, task)).unwrap();

        let completion = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(completion.id, TaskId(1));
        assert!(completion.outcome.is_success());
        backend.shutdown();
    }

    #[test]
    fn failed_closure_reports_failure() {
        let (tx, rx) = completion_channel();
        let mut backend = CpuBackend::new(1, tx).unwrap();

        let task = Task::builder("faulty", TaskType::Cpu)
            .work_fn(|| Err(anyhow::anyhow!("sensor offline")))
            .build();
        backend.dispatch(dispatched(2, task)).unwrap();

        let completion = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match completion.outcome {
            crate::backend::TaskOutcome::Failed(reason) => {
                assert!(reason.contains("sensor offline"));
            }
            crate::backend::TaskOutcome::Completed => panic!("expected failure"),
        }
        backend.shutdown();
    }

    #[test]
    fn marker_task_completes_without_worker() {
        let (tx, rx) = completion_channel();
        let mut backend = CpuBackend::new(1, tx).unwrap();

        let task = Task::builder("marker", TaskType::Cpu).build();
        backend.dispatch(dispatched(3, task)).unwrap();

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.id, TaskId(3));
        assert!(completion.outcome.is_success());
        backend.shutdown();
    }

    #[test]
    fn async_payload_is_rejected() {
        let (tx, _rx) = completion_channel();
        let mut backend = CpuBackend::new(1, tx).unwrap();

        let task = Task::builder("wrong", TaskType::Cpu)
            .work_future(async { Ok(()) })
            .build();
        let err = backend.dispatch(dispatched(4, task)).unwrap_err();
        assert!(matches!(err, SchedulerError::Backend(_)));
        backend.shutdown();
    }

    #[test]
    fn dispatch_after_shutdown_errors() {
        let (tx, _rx) = completion_channel();
        let mut backend = CpuBackend::new(1, tx).unwrap();
        backend.shutdown();

        let task = Task::builder("late", TaskType::Cpu).build();
        let err = backend.dispatch(dispatched(5, task)).unwrap_err();
        assert!(matches!(err, SchedulerError::Backend(_)));
    }
}

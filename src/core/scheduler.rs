//! Scheduler: single dispatch authority over the three execution domains.
//!
//! The scheduler owns the pending queue, the task registry, the three
//! backends and the per-backend in-flight accounting. Its decision logic is
//! single-threaded and cooperative: callers drive it by repeated `run_once`
//! invocations and exclusive access is enforced through `&mut self`.
//! Backends parallelize internally and report resolutions through a
//! thread-safe completion channel drained on every step.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Backend, Completion, CompletionReceiver, DispatchedTask, TaskOutcome};
use crate::config::SchedulerConfig;
use crate::core::error::SchedulerError;
use crate::core::metrics::MetricsCollector;
use crate::core::queue::{PendingQueue, QueueEntry};
use crate::core::task::{Task, TaskId, TaskSnapshot, TaskState, TaskType, Work};
use crate::util::clock::now_ms;

/// Internal record of an admitted task. Scheduling-relevant fields are
/// copied out of the caller's [`Task`] at admission and never change.
struct TaskRecord {
    name: String,
    kind: TaskType,
    priority: i32,
    realtime: bool,
    cpu_cores: Vec<usize>,
    state: TaskState,
    work: Option<Work>,
    admitted_at_ms: u128,
}

/// Priority-driven scheduler over CPU, GPU and IO backends.
///
/// Construction goes through [`SchedulerBuilder`](crate::builders::SchedulerBuilder)
/// or, with the `tokio-runtime` feature, [`Scheduler::new`]. The driving
/// protocol is: admit tasks with [`add_task`](Self::add_task), then call
/// [`run_once`](Self::run_once) in a loop until it returns `false`.
pub struct Scheduler {
    config: SchedulerConfig,
    records: HashMap<TaskId, TaskRecord>,
    queue: PendingQueue,
    backends: [Box<dyn Backend>; 3],
    in_flight: [usize; 3],
    completions: CompletionReceiver,
    metrics: Arc<MetricsCollector>,
    next_id: u64,
    next_seq: u64,
}

impl Scheduler {
    /// Build a scheduler with the default tokio spawner of the surrounding
    /// runtime.
    ///
    /// # Errors
    ///
    /// Propagates configuration validation and backend startup failures.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context.
    #[cfg(feature = "tokio-runtime")]
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        crate::builders::SchedulerBuilder::new(config).build()
    }

    pub(crate) fn from_parts(
        config: SchedulerConfig,
        backends: [Box<dyn Backend>; 3],
        completions: CompletionReceiver,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            config,
            records: HashMap::new(),
            queue: PendingQueue::new(),
            backends,
            in_flight: [0; 3],
            completions,
            metrics,
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Admit a task: validate, assign an id, record it as Pending, enqueue.
    ///
    /// On error the scheduler is left unchanged.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidTask`] when the name is empty, the priority
    /// falls outside the configured band, the payload variant does not match
    /// the task kind, or a core hint exceeds the configured budget.
    pub fn add_task(&mut self, task: Task) -> Result<TaskId, SchedulerError> {
        self.validate(&task)?;

        let id = TaskId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = QueueEntry {
            id,
            kind: task.kind,
            realtime: task.realtime,
            priority: task.priority,
            seq,
        };
        self.records.insert(
            id,
            TaskRecord {
                name: task.name,
                kind: task.kind,
                priority: task.priority,
                realtime: task.realtime,
                cpu_cores: task.cpu_cores,
                state: TaskState::Pending,
                work: task.work,
                admitted_at_ms: now_ms(),
            },
        );
        self.queue.push(entry);

        debug!(
            task = %id,
            kind = %task.kind,
            priority = task.priority,
            realtime = task.realtime,
            "task admitted"
        );
        Ok(id)
    }

    /// Number of Pending tasks. O(1), no side effects.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of Running tasks across all backends.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.in_flight.iter().sum()
    }

    /// Lifecycle state of an admitted task, or `None` for unknown ids.
    #[must_use]
    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.records.get(&id).map(|r| r.state.clone())
    }

    /// Handle to the per-task timing metrics the scheduler records.
    #[must_use]
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Snapshot of every admitted task, ordered by id.
    #[must_use]
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        let mut snapshots: Vec<TaskSnapshot> = self
            .records
            .iter()
            .map(|(id, record)| TaskSnapshot {
                id: *id,
                name: record.name.clone(),
                kind: record.kind,
                priority: record.priority,
                realtime: record.realtime,
                cpu_cores: record.cpu_cores.clone(),
                state: record.state.clone(),
                admitted_at_ms: record.admitted_at_ms,
            })
            .collect();
        snapshots.sort_by_key(|s| s.id);
        snapshots
    }

    /// Perform exactly one scheduling decision.
    ///
    /// Drains completion notifications (transitioning finished tasks to
    /// Completed or Failed), then dispatches the highest-ranked Pending task
    /// whose backend has spare capacity, looking past saturated backends up
    /// to the configured depth. Once a task of a given backend has been
    /// skipped, no later-ranked task of that backend is considered in the
    /// same pass, preserving the per-backend realtime-first and FIFO
    /// guarantees.
    ///
    /// Returns `false` only when the system is fully quiescent: no Pending
    /// and no Running tasks.
    pub fn run_once(&mut self) -> bool {
        let drained = self.drain_completions();
        let dispatched = self.dispatch_next();
        drained > 0 || dispatched || !self.is_quiescent()
    }

    /// Whether no task is Pending or Running.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.queue.is_empty() && self.running_count() == 0
    }

    fn validate(&self, task: &Task) -> Result<(), SchedulerError> {
        if task.name.is_empty() {
            return Err(SchedulerError::InvalidTask("name must not be empty".into()));
        }
        if !self.config.priority.contains(task.priority) {
            return Err(SchedulerError::InvalidTask(format!(
                "priority {} outside valid range {}..={}",
                task.priority, self.config.priority.min, self.config.priority.max
            )));
        }
        match (&task.work, task.kind) {
            (Some(Work::Sync(_)), TaskType::Gpu | TaskType::Io) => {
                return Err(SchedulerError::InvalidTask(format!(
                    "sync payload on {} task",
                    task.kind
                )));
            }
            (Some(Work::Async(_)), TaskType::Cpu) => {
                return Err(SchedulerError::InvalidTask(
                    "async payload on CPU task".into(),
                ));
            }
            _ => {}
        }
        if let Some(core) = task
            .cpu_cores
            .iter()
            .find(|&&c| c >= self.config.cpu.core_budget)
        {
            return Err(SchedulerError::InvalidTask(format!(
                "core hint {core} exceeds budget {}",
                self.config.cpu.core_budget
            )));
        }
        Ok(())
    }

    /// Drain the completion channel, applying Running -> Completed/Failed
    /// transitions. Returns the number of transitions applied.
    fn drain_completions(&mut self) -> usize {
        let mut transitions = 0;
        while let Ok(completion) = self.completions.try_recv() {
            if self.apply_completion(&completion) {
                transitions += 1;
            }
        }
        transitions
    }

    fn apply_completion(&mut self, completion: &Completion) -> bool {
        let Some(record) = self.records.get_mut(&completion.id) else {
            warn!(task = %completion.id, "completion for unknown task dropped");
            return false;
        };
        if record.state != TaskState::Running {
            warn!(task = %completion.id, state = ?record.state, "completion for non-running task dropped");
            return false;
        }

        self.in_flight[record.kind.index()] -= 1;
        match &completion.outcome {
            TaskOutcome::Completed => {
                record.state = TaskState::Completed;
                info!(
                    task = %completion.id,
                    name = %record.name,
                    elapsed_ms = completion.elapsed.as_millis() as u64,
                    "task completed"
                );
            }
            TaskOutcome::Failed(reason) => {
                record.state = TaskState::Failed(reason.clone());
                warn!(
                    task = %completion.id,
                    name = %record.name,
                    reason = %reason,
                    "task failed"
                );
            }
        }
        self.metrics
            .record_resolution(completion.id, &completion.outcome, completion.elapsed);
        true
    }

    /// Select and dispatch at most one Pending task. Returns whether a task
    /// state changed.
    fn dispatch_next(&mut self) -> bool {
        let capacities = [
            self.backends[0].capacity(),
            self.backends[1].capacity(),
            self.backends[2].capacity(),
        ];
        let in_flight = self.in_flight;
        // One flag per backend: set when a task of that backend was skipped,
        // which forbids choosing any later-ranked task of the same backend in
        // this pass.
        let mut blocked = [false; 3];

        let entry = self.queue.pop_where(self.config.lookahead, |candidate| {
            let slot = candidate.kind.index();
            if blocked[slot] {
                return false;
            }
            if in_flight[slot] < capacities[slot] {
                true
            } else {
                debug!(
                    task = %candidate.id,
                    error = %SchedulerError::BackendSaturated(candidate.kind),
                    "looking past saturated backend"
                );
                blocked[slot] = true;
                false
            }
        });

        let Some(entry) = entry else {
            return false;
        };
        let Some(record) = self.records.get_mut(&entry.id) else {
            warn!(task = %entry.id, "queue entry without record dropped");
            return false;
        };

        record.state = TaskState::Running;
        let dispatched = DispatchedTask {
            id: entry.id,
            name: record.name.clone(),
            work: record.work.take(),
        };
        let slot = entry.kind.index();
        self.in_flight[slot] += 1;
        self.metrics.record_dispatch(entry.id, &dispatched.name);

        debug!(
            task = %entry.id,
            name = %dispatched.name,
            kind = %entry.kind,
            "dispatching"
        );
        match self.backends[slot].dispatch(dispatched) {
            Ok(()) => true,
            Err(e) => {
                // Submission failure is recorded on the task, never thrown
                // back through run_once.
                self.in_flight[slot] -= 1;
                let reason = e.to_string();
                self.metrics.record_resolution(
                    entry.id,
                    &TaskOutcome::Failed(reason.clone()),
                    std::time::Duration::ZERO,
                );
                if let Some(record) = self.records.get_mut(&entry.id) {
                    record.state = TaskState::Failed(reason.clone());
                }
                warn!(task = %entry.id, reason = %reason, "dispatch failed");
                true
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_count())
            .field("running", &self.running_count())
            .field("admitted", &self.records.len())
            .finish_non_exhaustive()
    }
}


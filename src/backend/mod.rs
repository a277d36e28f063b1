//! Backend dispatchers: one execution domain per [`TaskType`].
//!
//! A backend accepts a single dispatched task of its kind and resolves it to
//! Completed or Failed through the scheduler's completion channel. Dispatch
//! never blocks the calling thread; the scheduler drains completions on every
//! `run_once` call.

pub mod cpu;
pub mod gpu;
pub mod io;

use std::time::{Duration, Instant};

use crate::core::error::SchedulerError;
use crate::core::task::{TaskId, TaskType, Work, WorkResult};

pub use cpu::CpuBackend;
pub use gpu::{Accelerator, GpuBackend, InlineAccelerator};
pub use io::IoBackend;

/// Terminal outcome reported by a backend for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Work resolved successfully.
    Completed,
    /// Work resolved with a failure reason.
    Failed(String),
}

impl TaskOutcome {
    /// Whether the outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Completion notification delivered from a backend to the scheduler.
#[derive(Debug)]
pub struct Completion {
    /// Task that resolved.
    pub id: TaskId,
    /// How it resolved.
    pub outcome: TaskOutcome,
    /// Time from dispatch to resolution.
    pub elapsed: Duration,
}

/// Sending half of the completion channel, cloned into every backend.
pub type CompletionSender = crossbeam_channel::Sender<Completion>;

/// Receiving half, drained by the scheduler during `run_once`.
pub(crate) type CompletionReceiver = crossbeam_channel::Receiver<Completion>;

/// Build the completion channel shared by the scheduler and its backends.
pub(crate) fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    crossbeam_channel::unbounded()
}

/// A task as handed to a backend: identity plus the work payload taken out of
/// the scheduler's record at dispatch time.
#[derive(Debug)]
pub struct DispatchedTask {
    /// Identifier assigned at admission.
    pub id: TaskId,
    /// Label, for logging.
    pub name: String,
    /// Work payload; `None` marks a payload-free task that resolves
    /// immediately as Completed.
    pub work: Option<Work>,
}

/// Contract shared by the three execution domains.
///
/// Exactly three implementations exist ([`CpuBackend`], [`GpuBackend`],
/// [`IoBackend`]); a task is routed once at dispatch and never re-routed.
pub trait Backend: Send {
    /// The task kind this backend executes.
    fn kind(&self) -> TaskType;

    /// How many tasks the backend can hold Running concurrently.
    fn capacity(&self) -> usize;

    /// Accept one task of this backend's kind. Must return promptly; the
    /// eventual outcome arrives through the completion channel.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Backend`] when the submission path is unavailable,
    /// [`SchedulerError::BackendSaturated`] when an internal bound is hit.
    fn dispatch(&mut self, task: DispatchedTask) -> Result<(), SchedulerError>;
}

/// Map a finished work result onto the completion channel.
pub(crate) fn report(tx: &CompletionSender, id: TaskId, started: Instant, result: WorkResult) {
    let outcome = match result {
        Ok(()) => TaskOutcome::Completed,
        Err(e) => TaskOutcome::Failed(e.to_string()),
    };
    let completion = Completion {
        id,
        outcome,
        elapsed: started.elapsed(),
    };
    // The receiver only disappears when the scheduler is gone; the outcome
    // has nowhere to land then.
    if tx.send(completion).is_err() {
        tracing::debug!(task = %id, "completion dropped, scheduler gone");
    }
}

/// Resolve a payload-free marker task as Completed without scheduling work.
pub(crate) fn report_marker(tx: &CompletionSender, id: TaskId) {
    report(tx, id, Instant::now(), Ok(()));
}

//! Task model: the unit of schedulable work.
//!
//! A [`Task`] describes one unit of work for one of the three execution
//! domains of the platform (host CPU, GPU accelerator, asynchronous IO).
//! Tasks are built up front through [`TaskBuilder`] and become immutable the
//! moment they are admitted: the scheduler copies every scheduling-relevant
//! field into an internal record, so nothing the caller retains can affect
//! ordering after admission.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Neutral priority assigned when the caller does not pick one.
///
/// Mid-range of the default valid band (0..=10).
pub const DEFAULT_PRIORITY: i32 = 5;

/// Execution domain a task is bound to. Fixed at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    /// Processor-bound work executed on a dedicated worker thread.
    Cpu,
    /// Work submitted to the accelerator execution context.
    Gpu,
    /// Non-blocking input/output driven on the async runtime.
    Io,
}

impl TaskType {
    /// All backend kinds, in dispatch-table order.
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Gpu, Self::Io];

    /// Canonical uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Io => "IO",
        }
    }

    /// Dense index into per-backend tables.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Gpu => 1,
            Self::Io => 2,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque task identifier, assigned at admission and never reused within a
/// scheduler's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Raw numeric value, for logging and external correlation.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// For external correlation (persisted ids, test fixtures). Admission is the
/// only source of live ids.
impl From<u64> for TaskId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Lifecycle state of an admitted task. Written only by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Admitted, waiting in the queue.
    Pending,
    /// Dispatched to a backend, not yet resolved.
    Running,
    /// Resolved successfully.
    Completed,
    /// Resolved with a backend-reported failure reason.
    Failed(String),
}

impl TaskState {
    /// Whether the task has reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Outcome of executing a work payload.
pub type WorkResult = Result<(), anyhow::Error>;

/// Closure executed synchronously on a CPU worker thread.
pub type SyncWork = Box<dyn FnOnce() -> WorkResult + Send + 'static>;

/// Future driven by the GPU or IO backend.
pub type AsyncWork = Pin<Box<dyn Future<Output = WorkResult> + Send + 'static>>;

/// Work payload of a task. The variant must match the task's [`TaskType`]:
/// `Sync` for CPU, `Async` for GPU and IO. Tasks without a payload are
/// markers that resolve as `Completed` immediately upon dispatch.
pub enum Work {
    /// Runs to completion on a dedicated worker thread.
    Sync(SyncWork),
    /// Submitted to the accelerator context or the IO runtime.
    Async(AsyncWork),
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Work::Sync(..)"),
            Self::Async(_) => f.write_str("Work::Async(..)"),
        }
    }
}

/// Pre-admission description of one unit of work.
///
/// Construction goes through [`Task::builder`]; all fields are set up front
/// and there is no post-construction mutation. Validation (priority bounds,
/// payload/kind match, core hints) happens at admission.
pub struct Task {
    pub(crate) name: String,
    pub(crate) kind: TaskType,
    pub(crate) priority: i32,
    pub(crate) realtime: bool,
    pub(crate) cpu_cores: Vec<usize>,
    pub(crate) work: Option<Work>,
}

impl Task {
    /// Start building a task with the two required fields.
    pub fn builder(name: impl Into<String>, kind: TaskType) -> TaskBuilder {
        TaskBuilder {
            name: name.into(),
            kind,
            priority: DEFAULT_PRIORITY,
            realtime: false,
            cpu_cores: Vec::new(),
            work: None,
        }
    }

    /// Human-readable label. Not required to be unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execution domain.
    #[must_use]
    pub const fn kind(&self) -> TaskType {
        self.kind
    }

    /// Numeric priority; higher is scheduled sooner.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the task belongs to the realtime class.
    #[must_use]
    pub const fn realtime(&self) -> bool {
        self.realtime
    }

    /// Advisory core-pinning hint.
    #[must_use]
    pub fn cpu_cores(&self) -> &[usize] {
        &self.cpu_cores
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("realtime", &self.realtime)
            .field("cpu_cores", &self.cpu_cores)
            .field("work", &self.work)
            .finish()
    }
}

/// Builder for [`Task`]. Unset fields take documented defaults:
/// priority [`DEFAULT_PRIORITY`], realtime `false`, no core hint, no payload.
pub struct TaskBuilder {
    name: String,
    kind: TaskType,
    priority: i32,
    realtime: bool,
    cpu_cores: Vec<usize>,
    work: Option<Work>,
}

impl TaskBuilder {
    /// Set the numeric priority. Higher values are scheduled sooner.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the task realtime. Realtime tasks order strictly ahead of all
    /// best-effort tasks regardless of numeric priority.
    #[must_use]
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Advisory core-pinning hint, validated against the configured core
    /// budget at admission.
    #[must_use]
    pub fn cpu_cores(mut self, cores: impl Into<Vec<usize>>) -> Self {
        self.cpu_cores = cores.into();
        self
    }

    /// Attach a synchronous work closure (CPU tasks).
    #[must_use]
    pub fn work_fn(mut self, f: impl FnOnce() -> WorkResult + Send + 'static) -> Self {
        self.work = Some(Work::Sync(Box::new(f)));
        self
    }

    /// Attach an asynchronous work payload (GPU and IO tasks).
    #[must_use]
    pub fn work_future(mut self, fut: impl Future<Output = WorkResult> + Send + 'static) -> Self {
        self.work = Some(Work::Async(Box::pin(fut)));
        self
    }

    /// Finish building. No validation happens here; the scheduler validates
    /// at admission.
    #[must_use]
    pub fn build(self) -> Task {
        Task {
            name: self.name,
            kind: self.kind,
            priority: self.priority,
            realtime: self.realtime,
            cpu_cores: self.cpu_cores,
            work: self.work,
        }
    }
}

/// Read-only snapshot of an admitted task, as reported by the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    /// Identifier assigned at admission.
    pub id: TaskId,
    /// Human-readable label.
    pub name: String,
    /// Execution domain.
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Numeric priority.
    pub priority: i32,
    /// Realtime class membership.
    pub realtime: bool,
    /// Advisory core-pinning hint.
    pub cpu_cores: Vec<usize>,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Admission timestamp, milliseconds since epoch.
    pub admitted_at_ms: u128,
}

impl TaskSnapshot {
    /// JSON rendering of the snapshot.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for TaskSnapshot {
    /// Compact one-line summary, e.g.
    /// `[Task#1] camera_capture | CPU | pri=7 | REALTIME`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Task#{}] {} | {} | pri={}",
            self.id, self.name, self.kind, self.priority
        )?;
        if self.realtime {
            f.write_str(" | REALTIME")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let task = Task::builder("sensor_poll", TaskType::Cpu).build();
        assert_eq!(task.name(), "sensor_poll");
        assert_eq!(task.kind(), TaskType::Cpu);
        assert_eq!(task.priority(), DEFAULT_PRIORITY);
        assert!(!task.realtime());
        assert!(task.cpu_cores().is_empty());
        assert!(task.work.is_none());
    }

    #[test]
    fn builder_sets_all_fields() {
        let task = Task::builder("inference", TaskType::Gpu)
            .priority(10)
            .realtime(true)
            .work_future(async { Ok(()) })
            .build();
        assert_eq!(task.priority(), 10);
        assert!(task.realtime());
        assert!(matches!(task.work, Some(Work::Async(_))));
    }

    #[test]
    fn snapshot_summary_format() {
        let snap = TaskSnapshot {
            id: TaskId(1),
            name: "camera_capture".into(),
            kind: TaskType::Cpu,
            priority: 7,
            realtime: false,
            cpu_cores: vec![],
            state: TaskState::Pending,
            admitted_at_ms: 0,
        };
        assert_eq!(snap.to_string(), "[Task#1] camera_capture | CPU | pri=7");

        let rt = TaskSnapshot {
            realtime: true,
            kind: TaskType::Gpu,
            name: "neural_inference".into(),
            priority: 10,
            ..snap
        };
        assert_eq!(
            rt.to_string(),
            "[Task#1] neural_inference | GPU | pri=10 | REALTIME"
        );
    }

    #[test]
    fn snapshot_serializes_kind_uppercase() {
        let snap = TaskSnapshot {
            id: TaskId(3),
            name: "log_writer".into(),
            kind: TaskType::Io,
            priority: 2,
            realtime: false,
            cpu_cores: vec![0, 1],
            state: TaskState::Completed,
            admitted_at_ms: 1_700_000_000_000,
        };
        let json = snap.to_json().unwrap();
        assert!(json.contains("\"type\":\"IO\""));
        assert!(json.contains("\"cpu_cores\":[0,1]"));
        assert!(json.contains("\"state\":\"completed\""));
    }

    #[test]
    fn state_terminality() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed("x".into()).is_terminal());
    }
}

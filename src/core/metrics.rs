//! Per-task timing metrics.
//!
//! The scheduler records an entry at dispatch and fills in duration and
//! outcome at resolution. Storage is bounded; the oldest entries are evicted
//! first. Collectors are shared behind an `Arc` so the embedding application
//! can read while the scheduler writes.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::backend::TaskOutcome;
use crate::core::task::TaskId;
use crate::util::clock::now_ms;

/// Timing record for one dispatched task.
#[derive(Debug, Clone)]
pub struct TaskMetrics {
    /// Task identifier.
    pub id: TaskId,
    /// Task label at dispatch time.
    pub name: String,
    /// Wall-clock dispatch timestamp, milliseconds since epoch.
    pub started_at_ms: u128,
    /// Dispatch-to-resolution time; `None` while still running.
    pub duration: Option<Duration>,
    /// Terminal outcome; `None` while still running.
    pub outcome: Option<TaskOutcome>,
}

/// Aggregate view over the stored entries.
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    /// Entries recorded (dispatched tasks still retained).
    pub tasks: usize,
    /// Entries resolved as failed.
    pub failures: usize,
    /// Sum of resolved durations.
    pub total: Duration,
    /// Longest resolved task, by label.
    pub longest: Option<(String, Duration)>,
}

/// Bounded in-memory collector of [`TaskMetrics`].
pub struct MetricsCollector {
    inner: Mutex<Inner>,
}

struct Inner {
    entries: VecDeque<TaskMetrics>,
    max_entries: usize,
}

impl MetricsCollector {
    /// Create a collector retaining at most `max_entries` records.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(max_entries.min(1024)),
                max_entries,
            }),
        }
    }

    /// Record a dispatch. Evicts the oldest entry past the bound.
    pub fn record_dispatch(&self, id: TaskId, name: &str) {
        let mut inner = self.inner.lock();
        if inner.entries.len() >= inner.max_entries {
            inner.entries.pop_front();
        }
        inner.entries.push_back(TaskMetrics {
            id,
            name: name.to_owned(),
            started_at_ms: now_ms(),
            duration: None,
            outcome: None,
        });
    }

    /// Record a resolution for the most recent unresolved entry of `id`.
    /// A resolution whose dispatch entry was evicted is dropped silently.
    pub fn record_resolution(&self, id: TaskId, outcome: &TaskOutcome, elapsed: Duration) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner
            .entries
            .iter_mut()
            .rev()
            .find(|m| m.id == id && m.outcome.is_none())
        {
            entry.duration = Some(elapsed);
            entry.outcome = Some(outcome.clone());
        }
    }

    /// Snapshot of stored entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TaskMetrics> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Aggregate over the stored entries.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        let inner = self.inner.lock();
        let mut summary = MetricsSummary {
            tasks: inner.entries.len(),
            ..MetricsSummary::default()
        };
        for entry in &inner.entries {
            if matches!(entry.outcome, Some(TaskOutcome::Failed(_))) {
                summary.failures += 1;
            }
            if let Some(duration) = entry.duration {
                summary.total += duration;
                let longest = summary.longest.as_ref().map_or(Duration::ZERO, |l| l.1);
                if duration >= longest {
                    summary.longest = Some((entry.name.clone(), duration));
                }
            }
        }
        summary
    }

    /// Drop all stored entries.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

//! GPU backend: submission to an accelerator execution context.
//!
//! The backend does not define a kernel execution model. It hands the task's
//! async payload to an [`Accelerator`] and reports the outcome when the
//! accelerator signals completion; the scheduler is never blocked waiting.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::backend::{report, report_marker, Backend, CompletionSender, DispatchedTask};
use crate::core::error::SchedulerError;
use crate::core::task::{AsyncWork, TaskType, Work, WorkResult};
use crate::runtime::Spawn;

/// Abstract accelerator execution context.
///
/// The sole contract the core places on GPU integration: accept one
/// submitted job and drive it to completion. Implementations wrap whatever
/// driver or stream machinery the platform provides.
#[async_trait]
pub trait Accelerator: Send + Sync {
    /// Drive one submitted job to completion on the accelerator.
    async fn run(&self, job: AsyncWork) -> WorkResult;
}

/// Default context that drives the job directly on the backend's runtime.
///
/// Stands in for real accelerator plumbing in tests and on hosts without a
/// device.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineAccelerator;

#[async_trait]
impl Accelerator for InlineAccelerator {
    async fn run(&self, job: AsyncWork) -> WorkResult {
        job.await
    }
}

/// Accelerator-submission backend for GPU-bound tasks.
pub struct GpuBackend {
    streams: usize,
    accelerator: Arc<dyn Accelerator>,
    spawner: Arc<dyn Spawn>,
    completions: CompletionSender,
}

impl GpuBackend {
    /// Create a backend with `streams` concurrent submissions, targeting
    /// `accelerator` and driving completions via `spawner`.
    pub fn new(
        streams: usize,
        accelerator: Arc<dyn Accelerator>,
        spawner: Arc<dyn Spawn>,
        completions: CompletionSender,
    ) -> Self {
        Self {
            streams,
            accelerator,
            spawner,
            completions,
        }
    }
}

impl Backend for GpuBackend {
    fn kind(&self) -> TaskType {
        TaskType::Gpu
    }

    fn capacity(&self) -> usize {
        self.streams
    }

    fn dispatch(&mut self, task: DispatchedTask) -> Result<(), SchedulerError> {
        let job = match task.work {
            Some(Work::Async(job)) => job,
            Some(Work::Sync(_)) => {
                return Err(SchedulerError::Backend(
                    "sync payload routed to gpu backend".into(),
                ));
            }
            None => {
                report_marker(&self.completions, task.id);
                return Ok(());
            }
        };

        debug!(task = %task.id, name = %task.name, "submitting to accelerator");

        let accelerator = Arc::clone(&self.accelerator);
        let completions = self.completions.clone();
        let id = task.id;
        let submitted = Instant::now();
        self.spawner.spawn(Box::pin(async move {
            let result = accelerator.run(job).await;
            report(&completions, id, submitted, result);
        }));
        Ok(())
    }
}

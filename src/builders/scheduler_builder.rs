//! Builder wiring configuration, runtime and backends into a scheduler.

use std::sync::Arc;

use crate::backend::{completion_channel, Accelerator, Backend, CpuBackend, GpuBackend, IoBackend};
use crate::config::SchedulerConfig;
use crate::core::error::SchedulerError;
use crate::core::metrics::MetricsCollector;
use crate::core::scheduler::Scheduler;
use crate::runtime::Spawn;

/// Assembles a [`Scheduler`] from configuration plus injected runtime pieces.
///
/// The spawn handle is the only mandatory injection (defaulted from the
/// ambient tokio runtime when the `tokio-runtime` feature is on); the
/// accelerator defaults to [`InlineAccelerator`](crate::backend::InlineAccelerator)
/// and the metrics collector is sized by the configuration unless replaced.
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    spawner: Option<Arc<dyn Spawn>>,
    accelerator: Option<Arc<dyn Accelerator>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SchedulerBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            spawner: None,
            accelerator: None,
            metrics: None,
        }
    }

    /// Inject the runtime spawn handle used by the GPU and IO backends.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawn>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Inject a custom accelerator execution context.
    #[must_use]
    pub fn accelerator(mut self, accelerator: Arc<dyn Accelerator>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    /// Replace the default metrics collector (sized by the configuration's
    /// `metrics_capacity`) with a caller-owned one.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the configuration, start the backends and build.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Backend`] for invalid configuration, a missing
    /// spawn handle, or CPU worker startup failure.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        self.config
            .validate()
            .map_err(|e| SchedulerError::Backend(format!("config invalid: {e}")))?;

        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => default_spawner()?,
        };
        let accelerator = self
            .accelerator
            .unwrap_or_else(|| Arc::new(crate::backend::InlineAccelerator));
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(MetricsCollector::new(self.config.metrics_capacity)));

        let (completion_tx, completion_rx) = completion_channel();

        let cpu = CpuBackend::new(self.config.cpu.effective_workers(), completion_tx.clone())?;
        let gpu = GpuBackend::new(
            self.config.gpu.streams,
            accelerator,
            Arc::clone(&spawner),
            completion_tx.clone(),
        );
        let io = IoBackend::new(self.config.io.max_in_flight, spawner, completion_tx);

        let backends: [Box<dyn Backend>; 3] = [Box::new(cpu), Box::new(gpu), Box::new(io)];
        Ok(Scheduler::from_parts(
            self.config,
            backends,
            completion_rx,
            metrics,
        ))
    }
}

#[cfg(feature = "tokio-runtime")]
fn default_spawner() -> Result<Arc<dyn Spawn>, SchedulerError> {
    Ok(Arc::new(crate::runtime::TokioSpawner::current()))
}

#[cfg(not(feature = "tokio-runtime"))]
fn default_spawner() -> Result<Arc<dyn Spawn>, SchedulerError> {
    Err(SchedulerError::Backend(
        "no spawn handle configured and tokio-runtime feature disabled".into(),
    ))
}

//! Scheduler and backend configuration structures.

use serde::{Deserialize, Serialize};

use crate::core::task::DEFAULT_PRIORITY;

/// CPU backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Worker thread count; 0 selects the host's logical CPU count.
    pub workers: usize,
    /// Highest core index accepted in a task's pinning hint, exclusive.
    pub core_budget: usize,
}

impl CpuConfig {
    /// Worker count with the auto value resolved.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            core_budget: num_cpus::get(),
        }
    }
}

/// GPU backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuConfig {
    /// Concurrent accelerator submissions.
    pub streams: usize,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self { streams: 2 }
    }
}

/// IO backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Concurrent in-flight operations.
    pub max_in_flight: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self { max_in_flight: 64 }
    }
}

/// Valid band for task priorities, inclusive on both ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityRange {
    /// Lowest accepted priority.
    pub min: i32,
    /// Highest accepted priority.
    pub max: i32,
}

impl PriorityRange {
    /// Whether `priority` falls inside the band.
    #[must_use]
    pub const fn contains(&self, priority: i32) -> bool {
        priority >= self.min && priority <= self.max
    }
}

impl Default for PriorityRange {
    fn default() -> Self {
        Self { min: 0, max: 10 }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// CPU backend settings.
    pub cpu: CpuConfig,
    /// GPU backend settings.
    pub gpu: GpuConfig,
    /// IO backend settings.
    pub io: IoConfig,
    /// Accepted priority band.
    pub priority: PriorityRange,
    /// Entries inspected per `run_once` when the top-ranked backend is
    /// saturated.
    pub lookahead: usize,
    /// Bound on retained per-task metrics entries.
    pub metrics_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            gpu: GpuConfig::default(),
            io: IoConfig::default(),
            priority: PriorityRange::default(),
            lookahead: 4,
            metrics_capacity: 1024,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration, for builder-style assembly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CPU worker count (0 = logical CPU count).
    #[must_use]
    pub fn with_cpu_workers(mut self, workers: usize) -> Self {
        self.cpu.workers = workers;
        self
    }

    /// Set the exclusive core-index budget for pinning hints.
    #[must_use]
    pub fn with_core_budget(mut self, core_budget: usize) -> Self {
        self.cpu.core_budget = core_budget;
        self
    }

    /// Set the concurrent accelerator stream count.
    #[must_use]
    pub fn with_gpu_streams(mut self, streams: usize) -> Self {
        self.gpu.streams = streams;
        self
    }

    /// Set the concurrent in-flight IO bound.
    #[must_use]
    pub fn with_io_in_flight(mut self, max_in_flight: usize) -> Self {
        self.io.max_in_flight = max_in_flight;
        self
    }

    /// Set the accepted priority band.
    #[must_use]
    pub fn with_priority_range(mut self, min: i32, max: i32) -> Self {
        self.priority = PriorityRange { min, max };
        self
    }

    /// Set the look-ahead depth.
    #[must_use]
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.gpu.streams == 0 {
            return Err("gpu streams must be greater than 0".into());
        }
        if self.io.max_in_flight == 0 {
            return Err("io max_in_flight must be greater than 0".into());
        }
        if self.cpu.core_budget == 0 {
            return Err("cpu core_budget must be greater than 0".into());
        }
        if self.priority.min > self.priority.max {
            return Err("priority range is inverted".into());
        }
        if !self.priority.contains(DEFAULT_PRIORITY) {
            return Err(format!(
                "priority range must include the neutral default {DEFAULT_PRIORITY}"
            ));
        }
        if self.lookahead == 0 {
            return Err("lookahead must be greater than 0".into());
        }
        if self.metrics_capacity == 0 {
            return Err("metrics_capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

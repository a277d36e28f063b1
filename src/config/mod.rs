//! Configuration models for the scheduler and its backends.

pub mod scheduler;

pub use scheduler::{CpuConfig, GpuConfig, IoConfig, PriorityRange, SchedulerConfig};

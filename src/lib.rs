//! # Hetero Dispatch
//!
//! A priority-driven task scheduler for heterogeneous embedded compute
//! platforms: host CPU, GPU accelerator, and asynchronous IO subsystem under
//! a single dispatch authority.
//!
//! Embedded boards run a mix of workloads with very different execution
//! characteristics: processor-bound pipelines, accelerator-offloaded
//! inference, and slow peripheral IO. This library interleaves real-time and
//! best-effort tasks across those three domains while keeping every
//! scheduling decision deterministic and externally paced.
//!
//! ## Ordering guarantees
//!
//! - **Realtime first**: realtime tasks dispatch strictly ahead of all
//!   best-effort tasks, regardless of numeric priority.
//! - **Priority within class**: higher numeric priority dispatches sooner.
//! - **FIFO tie-break**: equal-rank tasks dispatch in admission order, so no
//!   task is starved by equally-ranked later arrivals.
//! - **Bounded look-ahead**: when the top-ranked task's backend is saturated,
//!   the scheduler may dispatch a lower-ranked task of a *different* backend;
//!   it never reorders tasks bound to the same backend.
//!
//! ## Driving protocol
//!
//! The scheduler never spawns its own driving thread. Callers admit tasks and
//! step the engine one decision at a time:
//!
//! ```rust,ignore
//! use hetero_dispatch::config::SchedulerConfig;
//! use hetero_dispatch::core::{Scheduler, Task, TaskType};
//!
//! let mut scheduler = Scheduler::new(SchedulerConfig::default())?;
//!
//! scheduler.add_task(
//!     Task::builder("camera_capture", TaskType::Cpu)
//!         .priority(7)
//!         .work_fn(|| Ok(()))
//!         .build(),
//! )?;
//! scheduler.add_task(
//!     Task::builder("neural_inference", TaskType::Gpu)
//!         .priority(10)
//!         .realtime(true)
//!         .work_future(async { Ok(()) })
//!         .build(),
//! )?;
//!
//! while scheduler.run_once() {
//!     // one decision per call; pace however the host loop likes
//! }
//! ```
//!
//! Backends resolve dispatched work concurrently (CPU worker threads, async
//! accelerator submissions, non-blocking IO) and report through a completion
//! channel the scheduler drains on every step, so `run_once` always returns
//! promptly.
//!
//! For complete examples, see `tests/scheduler_test.rs` and
//! `tests/backpressure_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Backend dispatchers for the three execution domains.
pub mod backend;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Configuration models for the scheduler and backends.
pub mod config;
/// Core scheduling abstractions: tasks, ordering, orchestration.
pub mod core;
/// Runtime adapters and the spawn seam.
pub mod runtime;
/// Shared utilities.
pub mod util;

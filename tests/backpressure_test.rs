//! Integration tests for backend saturation and the look-ahead policy.
//!
//! These tests validate:
//! - a saturated backend lets lower-ranked tasks of other backends through
//! - tasks bound to the same backend are never reordered by the look-ahead
//! - look-ahead depth bounds the scan
//! - configured CPU capacity is enforced
//! - execution failures resolve tasks without halting the scheduler

use std::sync::mpsc;
use std::time::Duration;

use hetero_dispatch::core::{Scheduler, Task, TaskState, TaskType};
use hetero_dispatch::config::SchedulerConfig;

const MAX_STEPS: usize = 1_000;

/// A CPU task blocking on a gate until the test releases it.
fn gated(name: &str, priority: i32, realtime: bool) -> (Task, mpsc::Sender<()>) {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let task = Task::builder(name, TaskType::Cpu)
        .priority(priority)
        .realtime(realtime)
        .work_fn(move || {
            // A dropped sender also releases the gate.
            let _ = gate_rx.recv();
            Ok(())
        })
        .build();
    (task, gate_tx)
}

fn marker(name: &str, kind: TaskType, priority: i32, realtime: bool) -> Task {
    Task::builder(name, kind)
        .priority(priority)
        .realtime(realtime)
        .build()
}

/// Step until quiescent, with an iteration guard.
async fn drive(scheduler: &mut Scheduler) {
    for _ in 0..MAX_STEPS {
        if !scheduler.run_once() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("scheduler did not reach quiescence in {MAX_STEPS} steps");
}

/// Step until `id` leaves Pending, with an iteration guard.
async fn drive_until_dispatched(scheduler: &mut Scheduler, id: hetero_dispatch::core::TaskId) {
    for _ in 0..MAX_STEPS {
        if scheduler.task_state(id).unwrap() != TaskState::Pending {
            return;
        }
        scheduler.run_once();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("task {id} was never dispatched");
}

#[tokio::test]
async fn saturated_cpu_lets_lower_ranked_gpu_through() {
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_cpu_workers(1)).unwrap();

    let (blocker, gate) = gated("blocker", 9, false);
    let blocker = scheduler.add_task(blocker).unwrap();
    assert!(scheduler.run_once());
    assert_eq!(scheduler.task_state(blocker).unwrap(), TaskState::Running);

    // Higher-ranked CPU task cannot start; the lower-ranked GPU task can.
    let cpu_high = scheduler
        .add_task(marker("cpu_high", TaskType::Cpu, 8, false))
        .unwrap();
    let gpu_low = scheduler
        .add_task(marker("gpu_low", TaskType::Gpu, 1, false))
        .unwrap();

    assert!(scheduler.run_once());
    assert_ne!(scheduler.task_state(gpu_low).unwrap(), TaskState::Pending);
    assert_eq!(scheduler.task_state(cpu_high).unwrap(), TaskState::Pending);

    gate.send(()).unwrap();
    drive(&mut scheduler).await;
    for id in [blocker, cpu_high, gpu_low] {
        assert_eq!(scheduler.task_state(id).unwrap(), TaskState::Completed);
    }
}

#[tokio::test]
async fn saturation_never_reorders_within_a_backend() {
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_cpu_workers(1)).unwrap();

    let (blocker, gate) = gated("blocker", 10, false);
    let blocker = scheduler.add_task(blocker).unwrap();
    assert!(scheduler.run_once());
    assert_eq!(scheduler.task_state(blocker).unwrap(), TaskState::Running);

    // A realtime CPU task blocked only by its own backend's saturation must
    // not be bypassed by a best-effort CPU task of higher numeric priority.
    let rt_cpu = scheduler
        .add_task(marker("rt_cpu", TaskType::Cpu, 1, true))
        .unwrap();
    let be_cpu = scheduler
        .add_task(marker("be_cpu", TaskType::Cpu, 9, false))
        .unwrap();

    assert!(scheduler.run_once());
    assert_eq!(scheduler.task_state(rt_cpu).unwrap(), TaskState::Pending);
    assert_eq!(scheduler.task_state(be_cpu).unwrap(), TaskState::Pending);

    gate.send(()).unwrap();

    // Once capacity frees, the realtime task goes first.
    drive_until_dispatched(&mut scheduler, rt_cpu).await;
    assert_eq!(scheduler.task_state(be_cpu).unwrap(), TaskState::Pending);

    drive(&mut scheduler).await;
    assert_eq!(scheduler.task_state(rt_cpu).unwrap(), TaskState::Completed);
    assert_eq!(scheduler.task_state(be_cpu).unwrap(), TaskState::Completed);
}

#[tokio::test]
async fn lookahead_depth_bounds_the_scan() {
    let mut scheduler = Scheduler::new(
        SchedulerConfig::new()
            .with_cpu_workers(1)
            .with_lookahead(1),
    )
    .unwrap();

    let (blocker, gate) = gated("blocker", 9, false);
    let blocker = scheduler.add_task(blocker).unwrap();
    assert!(scheduler.run_once());

    let cpu_high = scheduler
        .add_task(marker("cpu_high", TaskType::Cpu, 8, false))
        .unwrap();
    let gpu_low = scheduler
        .add_task(marker("gpu_low", TaskType::Gpu, 1, false))
        .unwrap();

    // Depth 1 only inspects the blocked CPU head: no dispatch, still live.
    assert!(scheduler.run_once());
    assert_eq!(scheduler.task_state(cpu_high).unwrap(), TaskState::Pending);
    assert_eq!(scheduler.task_state(gpu_low).unwrap(), TaskState::Pending);

    gate.send(()).unwrap();
    drive(&mut scheduler).await;
    for id in [blocker, cpu_high, gpu_low] {
        assert_eq!(scheduler.task_state(id).unwrap(), TaskState::Completed);
    }
}

#[tokio::test]
async fn cpu_capacity_bounds_concurrent_dispatch() {
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_cpu_workers(2)).unwrap();

    let (first, gate_a) = gated("first", 5, false);
    let (second, gate_b) = gated("second", 5, false);
    let first = scheduler.add_task(first).unwrap();
    let second = scheduler.add_task(second).unwrap();
    let third = scheduler
        .add_task(marker("third", TaskType::Cpu, 5, false))
        .unwrap();

    assert!(scheduler.run_once());
    assert!(scheduler.run_once());
    assert_eq!(scheduler.running_count(), 2);
    assert_eq!(scheduler.task_state(first).unwrap(), TaskState::Running);
    assert_eq!(scheduler.task_state(second).unwrap(), TaskState::Running);

    // Both workers busy: the third CPU task has to wait.
    assert!(scheduler.run_once());
    assert_eq!(scheduler.task_state(third).unwrap(), TaskState::Pending);

    gate_a.send(()).unwrap();
    gate_b.send(()).unwrap();
    drive(&mut scheduler).await;
    assert_eq!(scheduler.task_state(third).unwrap(), TaskState::Completed);
}

#[tokio::test]
async fn execution_failure_does_not_halt_scheduling() {
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_cpu_workers(1)).unwrap();

    let faulty = scheduler
        .add_task(
            Task::builder("faulty", TaskType::Cpu)
                .priority(9)
                .work_fn(|| Err(anyhow::anyhow!("sensor offline")))
                .build(),
        )
        .unwrap();
    let healthy = scheduler
        .add_task(marker("healthy", TaskType::Cpu, 1, false))
        .unwrap();

    drive(&mut scheduler).await;

    match scheduler.task_state(faulty).unwrap() {
        TaskState::Failed(reason) => assert!(reason.contains("sensor offline")),
        state => panic!("expected failure, got {state:?}"),
    }
    assert_eq!(scheduler.task_state(healthy).unwrap(), TaskState::Completed);
}

//! Blocking event tests
//!
//! I/O countdowns and mutex contention driven through the full tick loop.

use cpu_scheduler_sim_core::models::task::{TaskEvent, TaskState};
use cpu_scheduler_sim_core::orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, TaskConfig};
use cpu_scheduler_sim_core::SimEvent;

fn create_orchestrator(algorithm: &str, quantum: usize, tasks: Vec<TaskConfig>) -> Orchestrator {
    Orchestrator::new(OrchestratorConfig {
        algorithm: algorithm.to_string(),
        quantum,
        rng_seed: 7,
        task_configs: tasks,
        ..Default::default()
    })
    .unwrap()
}

fn history(orchestrator: &Orchestrator, id: &str) -> Vec<usize> {
    orchestrator.task_by_id(id).unwrap().execution_history().to_vec()
}

// ============================================================================
// I/O
// ============================================================================

#[test]
fn test_io_returns_exactly_after_its_duration() {
    // IO:2-3 starts after the 2nd executed tick (tick 1) and the task is
    // ready again 3 ticks later.
    let mut orchestrator = create_orchestrator(
        "fifo",
        10,
        vec![TaskConfig::new("A", 0, 4, 0).with_event(TaskEvent::io(2, 3))],
    );
    let a = orchestrator.task_by_id("A").unwrap().index();

    orchestrator.step();
    let result = orchestrator.step();
    assert_eq!(result.blocked, Some(a));
    assert_eq!(orchestrator.task_state(a), Some(TaskState::BlockedIo));

    assert!(orchestrator.step().is_idle());
    assert!(orchestrator.step().is_idle());

    let result = orchestrator.step();
    assert_eq!(result.tick, 4);
    assert_eq!(result.num_io_returns, 1);
    assert_eq!(result.ran, Some(a));

    assert_eq!(orchestrator.run_until_finished(10), RunOutcome::Finished { clock: 6 });
    assert_eq!(history(&orchestrator, "A"), vec![0, 1, 4, 5]);
}

#[test]
fn test_io_countdowns_run_in_parallel() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        10,
        vec![
            TaskConfig::new("A", 0, 2, 0).with_event(TaskEvent::io(1, 2)),
            TaskConfig::new("B", 0, 2, 0).with_event(TaskEvent::io(1, 2)),
        ],
    );

    assert_eq!(orchestrator.run_until_finished(20), RunOutcome::Finished { clock: 4 });
    assert_eq!(history(&orchestrator, "A"), vec![0, 2]);
    assert_eq!(history(&orchestrator, "B"), vec![1, 3]);
}

#[test]
fn test_io_return_preempts_under_srtf() {
    let mut orchestrator = create_orchestrator(
        "srtf",
        10,
        vec![
            TaskConfig::new("short", 0, 2, 0).with_event(TaskEvent::io(1, 1)),
            TaskConfig::new("long", 0, 5, 0),
        ],
    );

    // t0: short runs and blocks; t1: short returns with 1 tick left and
    // takes the CPU back from long.
    orchestrator.step();
    let result = orchestrator.step();
    assert_eq!(result.num_io_returns, 1);
    assert_eq!(result.ran, orchestrator.task_by_id("short").map(|t| t.index()));
    assert_eq!(result.completed, result.ran);
}

// ============================================================================
// Mutexes
// ============================================================================

#[test]
fn test_mutex_waiters_admitted_in_request_order() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        1,
        vec![
            TaskConfig::new("O", 0, 3, 0)
                .with_event(TaskEvent::lock(1, "m"))
                .with_event(TaskEvent::unlock(3, "m")),
            TaskConfig::new("A", 0, 2, 0)
                .with_event(TaskEvent::lock(1, "m"))
                .with_event(TaskEvent::unlock(2, "m")),
            TaskConfig::new("B", 0, 2, 0)
                .with_event(TaskEvent::lock(1, "m"))
                .with_event(TaskEvent::unlock(2, "m")),
        ],
    );

    assert_eq!(orchestrator.run_until_finished(30), RunOutcome::Finished { clock: 7 });
    assert_eq!(history(&orchestrator, "O"), vec![0, 3, 4]);
    assert_eq!(history(&orchestrator, "A"), vec![1, 5]);
    assert_eq!(history(&orchestrator, "B"), vec![2, 6]);

    let owners: Vec<(usize, &str)> = orchestrator
        .event_log()
        .events_of_type("MutexAcquired")
        .iter()
        .map(|e| (e.tick(), orchestrator.task(e.task().unwrap()).unwrap().id()))
        .collect();
    assert_eq!(owners, vec![(0, "O"), (4, "A"), (5, "B")]);
    assert!(orchestrator.warnings().is_empty());
}

#[test]
fn test_blocked_lock_still_counts_executed_tick() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        1,
        vec![
            TaskConfig::new("O", 0, 2, 0).with_event(TaskEvent::lock(1, "m")),
            TaskConfig::new("W", 0, 3, 0).with_event(TaskEvent::lock(1, "m")),
        ],
    );

    orchestrator.step();
    let result = orchestrator.step();
    let w = orchestrator.task_by_id("W").unwrap();
    assert_eq!(result.blocked, Some(w.index()));
    assert_eq!(w.execution_history(), &[1]);
    assert_eq!(w.remaining_time(), 2);
    assert_eq!(
        orchestrator.task_state(w.index()),
        Some(TaskState::BlockedMutex {
            mutex_id: "m".to_string()
        })
    );
}

#[test]
fn test_mutexes_are_independent() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        1,
        vec![
            TaskConfig::new("A", 0, 2, 0)
                .with_event(TaskEvent::lock(1, "x"))
                .with_event(TaskEvent::unlock(2, "x")),
            TaskConfig::new("B", 0, 2, 0)
                .with_event(TaskEvent::lock(1, "y"))
                .with_event(TaskEvent::unlock(2, "y")),
        ],
    );

    orchestrator.run_until_finished(10);
    assert!(orchestrator.event_log().events_of_type("MutexBlocked").is_empty());
    assert_eq!(history(&orchestrator, "A"), vec![0, 2]);
    assert_eq!(history(&orchestrator, "B"), vec![1, 3]);
}

// ============================================================================
// Event sanitization
// ============================================================================

#[test]
fn test_unreachable_events_dropped_with_warnings() {
    let orchestrator = create_orchestrator(
        "fifo",
        2,
        vec![TaskConfig::new("A", 0, 3, 0)
            .with_event(TaskEvent::io(0, 2))
            .with_event(TaskEvent::io(3, 1))
            .with_event(TaskEvent::unlock(4, "m"))
            .with_event(TaskEvent::io(1, 0))
            .with_event(TaskEvent::unlock(3, "m"))],
    );

    assert_eq!(orchestrator.warnings().len(), 4);
    assert_eq!(
        orchestrator.task_by_id("A").unwrap().events(),
        &[TaskEvent::unlock(3, "m")]
    );
    assert!(orchestrator
        .event_log()
        .events()
        .iter()
        .all(|e| matches!(e, SimEvent::Warning { tick: 0, .. })));
}

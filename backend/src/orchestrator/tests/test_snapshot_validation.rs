// Snapshot integrity checks against hand-corrupted state

use crate::models::task::{TaskEvent, TaskId};
use crate::orchestrator::checkpoint::{validate_snapshot, StateSnapshot};
use crate::orchestrator::engine::{Orchestrator, OrchestratorConfig, SimulationError, TaskConfig};

fn running_orchestrator() -> Orchestrator {
    let mut orchestrator = Orchestrator::new(OrchestratorConfig {
        algorithm: "rr".to_string(),
        quantum: 2,
        task_configs: vec![
            TaskConfig::new("A", 0, 4, 0).with_event(TaskEvent::io(1, 3)),
            TaskConfig::new("B", 0, 3, 0).with_event(TaskEvent::lock(1, "m")),
            TaskConfig::new("C", 1, 2, 0).with_event(TaskEvent::lock(1, "m")),
        ],
        ..Default::default()
    })
    .unwrap();
    for _ in 0..4 {
        orchestrator.step();
    }
    orchestrator
}

fn assert_rejected(snapshot: &StateSnapshot, needle: &str) {
    match validate_snapshot(snapshot) {
        Err(SimulationError::StateValidationError(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {}", msg)
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_live_snapshots_validate_every_tick() {
    let mut orchestrator = running_orchestrator();
    while !orchestrator.is_finished() {
        validate_snapshot(&orchestrator.snapshot()).unwrap();
        orchestrator.step();
    }
    validate_snapshot(&orchestrator.snapshot()).unwrap();
}

#[test]
fn test_task_in_two_locations_rejected() {
    let mut snapshot = running_orchestrator().snapshot();
    // A is sitting in the ready queue
    snapshot.state.finished.push(TaskId(0));
    assert_rejected(&snapshot, "multiple locations");
}

#[test]
fn test_unknown_task_rejected() {
    let mut snapshot = running_orchestrator().snapshot();
    snapshot.state.running = Some(TaskId(17));
    assert_rejected(&snapshot, "Unknown task");
}

#[test]
fn test_running_mismatch_rejected() {
    let mut snapshot = running_orchestrator().snapshot();
    let running = snapshot.state.running;
    assert!(running.is_some());
    snapshot.state.scheduler.set_running(None);
    assert_rejected(&snapshot, "Scheduler thinks");
}

#[test]
fn test_restore_rejects_corrupt_snapshot_and_keeps_state() {
    let mut orchestrator = running_orchestrator();
    let before = orchestrator.snapshot();

    let mut corrupt = before.clone();
    corrupt.state.running = None;

    let err = orchestrator.restore(corrupt).unwrap_err();
    assert!(matches!(err, SimulationError::StateValidationError(_)));
    assert_eq!(orchestrator.snapshot(), before);
}

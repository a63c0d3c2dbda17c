//! Orchestrator Integration Tests
//!
//! End-to-end runs of the tick loop under each scheduling algorithm,
//! checking who held the CPU at every tick.

use cpu_scheduler_sim_core::orchestrator::{
    Orchestrator, OrchestratorConfig, RunOutcome, TaskConfig,
};
use cpu_scheduler_sim_core::{Algorithm, PreemptReason, TaskId};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_orchestrator(algorithm: &str, quantum: usize, tasks: Vec<TaskConfig>) -> Orchestrator {
    let config = OrchestratorConfig {
        algorithm: algorithm.to_string(),
        quantum,
        alpha: 1,
        rng_seed: 12345,
        task_configs: tasks,
    };
    Orchestrator::new(config).unwrap()
}

/// Config id of the task that ran at each tick, "-" for idle ticks
fn run_trace(orchestrator: &mut Orchestrator, max_ticks: usize) -> Vec<String> {
    let mut trace = Vec::new();
    for _ in 0..max_ticks {
        if orchestrator.is_finished() {
            break;
        }
        let result = orchestrator.step();
        let name = match result.ran {
            Some(id) => orchestrator.task(id).unwrap().id().to_string(),
            None => "-".to_string(),
        };
        trace.push(name);
    }
    trace
}

fn history(orchestrator: &Orchestrator, id: &str) -> Vec<usize> {
    orchestrator.task_by_id(id).unwrap().execution_history().to_vec()
}

// ============================================================================
// FIFO / Round Robin
// ============================================================================

#[test]
fn test_fifo_round_robin_end_to_end() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        2,
        vec![
            TaskConfig::new("T1", 0, 4, 0),
            TaskConfig::new("T2", 1, 2, 0),
            TaskConfig::new("T3", 2, 3, 0),
        ],
    );

    let trace = run_trace(&mut orchestrator, 50);

    // T1 is preempted at its quantum with T2 already queued; T3 queues
    // behind the preempted T1.
    assert_eq!(trace, vec!["T1", "T1", "T2", "T2", "T1", "T1", "T3", "T3", "T3"]);
    assert!(orchestrator.is_finished());
    assert_eq!(orchestrator.clock(), 9);
    assert_eq!(history(&orchestrator, "T1"), vec![0, 1, 4, 5]);
    assert_eq!(history(&orchestrator, "T2"), vec![2, 3]);
    assert_eq!(history(&orchestrator, "T3"), vec![6, 7, 8]);

    let finished: Vec<&str> = orchestrator
        .finished_tasks()
        .iter()
        .map(|id| orchestrator.task(*id).unwrap().id())
        .collect();
    assert_eq!(finished, vec!["T2", "T1", "T3"]);
}

#[test]
fn test_rr_alias_selects_fifo() {
    let orchestrator = create_orchestrator("RR", 3, vec![TaskConfig::new("A", 0, 1, 0)]);
    assert_eq!(orchestrator.algorithm(), Algorithm::Fifo);
    assert!(orchestrator.warnings().is_empty());
}

#[test]
fn test_fifo_same_tick_arrivals_in_config_order() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        10,
        vec![
            TaskConfig::new("C", 0, 1, 0),
            TaskConfig::new("A", 0, 1, 9),
            TaskConfig::new("B", 0, 1, 5),
        ],
    );

    assert_eq!(run_trace(&mut orchestrator, 10), vec!["C", "A", "B"]);
}

#[test]
fn test_idle_ticks_before_first_arrival() {
    let mut orchestrator = create_orchestrator("fifo", 2, vec![TaskConfig::new("A", 2, 1, 0)]);

    assert_eq!(run_trace(&mut orchestrator, 10), vec!["-", "-", "A"]);
    assert_eq!(orchestrator.clock(), 3);
}

#[test]
fn test_admitted_tasks_follow_clock() {
    let mut orchestrator = create_orchestrator(
        "fifo",
        2,
        vec![TaskConfig::new("A", 0, 3, 0), TaskConfig::new("B", 2, 1, 0)],
    );

    assert_eq!(orchestrator.admitted_tasks().len(), 1);
    orchestrator.step();
    orchestrator.step();
    let admitted: Vec<&str> = orchestrator.admitted_tasks().iter().map(|t| t.id()).collect();
    assert_eq!(admitted, vec!["A", "B"]);
}

// ============================================================================
// SRTF
// ============================================================================

#[test]
fn test_srtf_running_task_wins_tie_on_arrival() {
    let mut orchestrator = create_orchestrator(
        "srtf",
        2,
        vec![TaskConfig::new("T1", 0, 5, 0), TaskConfig::new("T2", 2, 3, 0)],
    );

    orchestrator.step();
    orchestrator.step();
    // T1 has 3 ticks left when T2 (3 ticks) arrives: tie, no preemption
    let result = orchestrator.step();
    assert!(result.preemptions.is_empty());
    assert_eq!(result.ran, Some(TaskId(0)));

    run_trace(&mut orchestrator, 20);
    assert_eq!(history(&orchestrator, "T1"), vec![0, 1, 2, 3, 4]);
    assert_eq!(history(&orchestrator, "T2"), vec![5, 6, 7]);
}

#[test]
fn test_srtf_shorter_arrival_preempts() {
    let mut orchestrator = create_orchestrator(
        "srtf",
        2,
        vec![TaskConfig::new("long", 0, 6, 0), TaskConfig::new("short", 1, 2, 0)],
    );

    orchestrator.step();
    let result = orchestrator.step();
    assert_eq!(result.preemptions, vec![(TaskId(0), PreemptReason::Arrival)]);
    assert_eq!(result.ran, Some(TaskId(1)));

    let trace = run_trace(&mut orchestrator, 20);
    assert_eq!(trace, vec!["short", "long", "long", "long", "long", "long"]);
}

#[test]
fn test_srtf_never_uses_quantum() {
    let mut orchestrator = create_orchestrator("srtf", 1, vec![TaskConfig::new("A", 0, 4, 0)]);
    for _ in 0..4 {
        assert!(orchestrator.step().preemptions.is_empty());
    }
    assert!(orchestrator.is_finished());
}

#[test]
fn test_random_tie_break_is_flagged_and_seeded() {
    let tasks = || vec![TaskConfig::new("X", 0, 3, 0), TaskConfig::new("Y", 0, 3, 0)];

    let mut first = create_orchestrator("srtf", 2, tasks());
    let result = first.step();
    assert!(result.random_tie_break);
    assert!(first.last_tie_break_random());

    // Same seed, same coin flip
    let mut second = create_orchestrator("srtf", 2, tasks());
    assert_eq!(run_trace(&mut first, 20)[..], run_trace(&mut second, 20)[1..]);
    assert_eq!(first.finished_tasks(), second.finished_tasks());
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn test_priority_preemptive_on_arrival() {
    let mut orchestrator = create_orchestrator(
        "priop",
        2,
        vec![TaskConfig::new("L", 0, 4, 1), TaskConfig::new("H", 2, 2, 5)],
    );

    let trace = run_trace(&mut orchestrator, 20);
    assert_eq!(trace, vec!["L", "L", "H", "H", "L", "L"]);

    let preempted = orchestrator.event_log().events_of_type("Preempted");
    assert_eq!(preempted.len(), 1);
    assert_eq!(preempted[0].tick(), 2);
}

#[test]
fn test_priority_equal_arrival_does_not_preempt() {
    let mut orchestrator = create_orchestrator(
        "priop",
        2,
        vec![TaskConfig::new("L", 0, 3, 5), TaskConfig::new("M", 1, 2, 5)],
    );

    assert_eq!(run_trace(&mut orchestrator, 20), vec!["L", "L", "L", "M", "M"]);
}

#[test]
fn test_priority_aging_quantum_and_reset() {
    let mut orchestrator = create_orchestrator(
        "priopenv",
        2,
        vec![TaskConfig::new("A", 0, 5, 3), TaskConfig::new("B", 0, 2, 1)],
    );

    // B ages 1 -> 2 -> 3 -> 4 while waiting, overtaking A (reset to 3) at
    // A's second quantum boundary.
    for _ in 0..4 {
        orchestrator.step();
    }
    let b = orchestrator.task_by_id("B").unwrap();
    assert_eq!(orchestrator.running_task(), Some(b.index()));
    assert_eq!(b.dynamic_priority(), b.static_priority());
    assert_eq!(orchestrator.task_by_id("A").unwrap().dynamic_priority(), 4);

    run_trace(&mut orchestrator, 20);
    assert_eq!(history(&orchestrator, "A"), vec![0, 1, 2, 3, 6]);
    assert_eq!(history(&orchestrator, "B"), vec![4, 5]);
}

// ============================================================================
// Termination
// ============================================================================

#[test]
fn test_finished_within_termination_bound() {
    let mut orchestrator = create_orchestrator(
        "priopenv",
        3,
        vec![
            TaskConfig::new("A", 4, 3, 2),
            TaskConfig::new("B", 0, 2, 1),
            TaskConfig::new("C", 9, 1, 0),
        ],
    );
    let bound = orchestrator.termination_bound();
    assert_eq!(bound, 6 + 9);

    match orchestrator.run_until_finished(bound) {
        RunOutcome::Finished { clock } => assert!(clock <= bound),
        other => panic!("expected completion, got {:?}", other),
    }
}

#[test]
fn test_step_after_finish_is_idle() {
    let mut orchestrator = create_orchestrator("fifo", 1, vec![TaskConfig::new("A", 0, 1, 0)]);
    orchestrator.step();
    assert!(orchestrator.is_finished());

    let events = orchestrator.event_log().len();
    let result = orchestrator.step();
    assert!(result.is_idle());
    assert_eq!(orchestrator.clock(), 2);
    assert_eq!(orchestrator.event_log().len(), events);
}

#[test]
fn test_tick_limit_outcome() {
    let mut orchestrator = create_orchestrator("fifo", 1, vec![TaskConfig::new("A", 0, 10, 0)]);
    assert_eq!(
        orchestrator.run_until_finished(3),
        RunOutcome::TickLimit { clock: 3 }
    );
}

//! CPU Scheduling Simulator CLI
//!
//! Loads a scheduler config file, runs the simulation to completion and
//! prints a Gantt-style chart plus per-task statistics.
//!
//! # Output Format
//!
//! `--format=text` (default): one chart row per task, `#` for ticks the task
//! held the CPU, `.` for ticks after its arrival, followed by a summary table.
//!
//! `--format=json`: a single JSON object with the per-tick CPU owner, every
//! task's execution history and all warnings.
//!
//! Warnings are written to stderr in both formats.
//!
//! # Exit Codes
//!
//! - `0`: Every task finished
//! - `1`: Deadlock or tick limit reached before completion
//! - `2`: Invalid arguments or configuration error

use cpu_scheduler_sim_core::{load_config, Orchestrator, RunOutcome};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <config>

OPTIONS:
    --seed=<N>              Seed for random tie-breaks (default: built-in seed)
    --format=<text|json>    Output format (default: text)
    --max-ticks=<N>         Stop after N ticks (default: termination bound)
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

#[derive(Serialize)]
struct TaskReport<'a> {
    id: &'a str,
    color: &'a str,
    arrival: usize,
    duration: usize,
    priority: i64,
    history: &'a [usize],
    finished_at: Option<usize>,
}

#[derive(Serialize)]
struct Report<'a> {
    algorithm: &'static str,
    quantum: usize,
    clock: usize,
    outcome: &'static str,
    timeline: Vec<Option<&'a str>>,
    tasks: Vec<TaskReport<'a>>,
    warnings: Vec<&'a str>,
}

fn outcome_name(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Finished { .. } => "finished",
        RunOutcome::Deadlocked { .. } => "deadlocked",
        RunOutcome::TickLimit { .. } => "tick_limit",
    }
}

/// Tick at which a finished task completed (one past its last executed tick)
fn finished_at(history: &[usize], complete: bool) -> Option<usize> {
    if complete {
        history.last().map(|t| t + 1)
    } else {
        None
    }
}

/// CPU owner per tick, None for idle ticks
fn cpu_timeline(orchestrator: &Orchestrator) -> Vec<Option<&str>> {
    let mut timeline = vec![None; orchestrator.clock()];
    for task in orchestrator.all_tasks() {
        for &tick in task.execution_history() {
            if let Some(slot) = timeline.get_mut(tick) {
                *slot = Some(task.id());
            }
        }
    }
    timeline
}

fn build_report(orchestrator: &Orchestrator, outcome: RunOutcome) -> Report<'_> {
    Report {
        algorithm: orchestrator.algorithm().name(),
        quantum: orchestrator.quantum(),
        clock: orchestrator.clock(),
        outcome: outcome_name(outcome),
        timeline: cpu_timeline(orchestrator),
        tasks: orchestrator
            .all_tasks()
            .map(|t| TaskReport {
                id: t.id(),
                color: t.color(),
                arrival: t.arrival(),
                duration: t.duration(),
                priority: t.static_priority(),
                history: t.execution_history(),
                finished_at: finished_at(t.execution_history(), t.is_complete()),
            })
            .collect(),
        warnings: orchestrator.warnings(),
    }
}

fn print_text(report: &Report<'_>) {
    println!(
        "algorithm={} quantum={} ticks={} outcome={}",
        report.algorithm, report.quantum, report.clock, report.outcome
    );
    println!();

    let width = report.tasks.iter().map(|t| t.id.len()).max().unwrap_or(0);
    for task in &report.tasks {
        let row: String = (0..report.clock)
            .map(|tick| {
                if task.history.contains(&tick) {
                    '#'
                } else if tick >= task.arrival && task.finished_at.map_or(true, |f| tick < f) {
                    '.'
                } else {
                    ' '
                }
            })
            .collect();
        println!("{:>width$} |{}|", task.id, row, width = width);
    }

    println!();
    println!(
        "{:>width$}  arrival  duration  finished  turnaround  waiting",
        "task",
        width = width
    );
    for task in &report.tasks {
        match task.finished_at {
            Some(end) => {
                let turnaround = end - task.arrival;
                println!(
                    "{:>width$}  {:>7}  {:>8}  {:>8}  {:>10}  {:>7}",
                    task.id,
                    task.arrival,
                    task.duration,
                    end,
                    turnaround,
                    turnaround - task.duration,
                    width = width
                );
            }
            None => println!(
                "{:>width$}  {:>7}  {:>8}  {:>8}  {:>10}  {:>7}",
                task.id,
                task.arrival,
                task.duration,
                "-",
                "-",
                "-",
                width = width
            ),
        }
    }
}

fn main() -> ExitCode {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "cpu-sched-sim".into());
    let mut path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut max_ticks: Option<usize> = None;
    let mut format = Format::Text;

    for arg in args {
        if let Some(flag) = arg.to_str() {
            if let Some(value) = flag.strip_prefix("--seed=") {
                let Ok(n) = value.parse() else {
                    eprintln!("invalid --seed value: {}", value);
                    return ExitCode::from(2);
                };
                seed = Some(n);
                continue;
            }
            if let Some(value) = flag.strip_prefix("--max-ticks=") {
                let Ok(n) = value.parse() else {
                    eprintln!("invalid --max-ticks value: {}", value);
                    return ExitCode::from(2);
                };
                max_ticks = Some(n);
                continue;
            }
            if let Some(value) = flag.strip_prefix("--format=") {
                format = match value {
                    "text" => Format::Text,
                    "json" => Format::Json,
                    _ => {
                        eprintln!("invalid --format value: {}", value);
                        return ExitCode::from(2);
                    }
                };
                continue;
            }
            match flag {
                "--help" | "-h" => {
                    print_usage(&exe);
                    return ExitCode::SUCCESS;
                }
                _ if flag.starts_with("--") => {
                    eprintln!("unknown flag: {}", flag);
                    print_usage(&exe);
                    return ExitCode::from(2);
                }
                _ => {}
            }
        }

        if path.is_some() {
            print_usage(&exe);
            return ExitCode::from(2);
        }
        path = Some(PathBuf::from(arg));
    }

    let Some(path) = path else {
        print_usage(&exe);
        return ExitCode::from(2);
    };

    let mut config = match load_config(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };
    if let Some(seed) = seed {
        config.rng_seed = seed;
    }

    let mut orchestrator = match Orchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    let limit = max_ticks.unwrap_or_else(|| orchestrator.termination_bound() + 1);
    let outcome = orchestrator.run_until_finished(limit);

    for warning in orchestrator.warnings() {
        eprintln!("warning: {}", warning);
    }

    let report = build_report(&orchestrator, outcome);
    match format {
        Format::Text => print_text(&report),
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("failed to encode report: {}", err);
                return ExitCode::from(2);
            }
        },
    }

    match outcome {
        RunOutcome::Finished { .. } => ExitCode::SUCCESS,
        RunOutcome::Deadlocked { clock } => {
            eprintln!("deadlock at tick {}: every remaining task waits on a mutex", clock);
            ExitCode::from(1)
        }
        RunOutcome::TickLimit { clock } => {
            eprintln!("stopped at tick {} before all tasks finished", clock);
            ExitCode::from(1)
        }
    }
}

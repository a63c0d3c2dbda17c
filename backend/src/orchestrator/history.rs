//! Rewind timeline
//!
//! Wraps an [`Orchestrator`] with a stack of snapshots taken before every
//! tick, so a run can be stepped back and forward interactively. Because the
//! engine is deterministic (the RNG is part of the snapshot), stepping
//! forward after stepping back reproduces the tick that was undone.

use crate::orchestrator::checkpoint::StateSnapshot;
use crate::orchestrator::engine::{Orchestrator, RunOutcome, TickResult};

/// Orchestrator plus its undo history
#[derive(Debug, Clone)]
pub struct Timeline {
    orchestrator: Orchestrator,
    history: Vec<StateSnapshot>,
}

impl Timeline {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            history: Vec::new(),
        }
    }

    /// Live orchestrator
    pub fn current(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Consume the timeline, keeping only the live orchestrator
    pub fn into_inner(self) -> Orchestrator {
        self.orchestrator
    }

    /// Number of ticks that can be undone
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn can_step_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Snapshot, then run one tick
    ///
    /// Returns `None` once every task has finished.
    pub fn step_forward(&mut self) -> Option<TickResult> {
        if self.orchestrator.is_finished() {
            return None;
        }
        self.history.push(self.orchestrator.snapshot());
        Some(self.orchestrator.step())
    }

    /// Undo the most recent tick
    ///
    /// Returns false when already at the start.
    pub fn step_back(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        // Every snapshot came from this orchestrator, so it always matches
        // the config hash and passes validation.
        match self.orchestrator.restore(snapshot) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "rewind snapshot rejected");
                false
            }
        }
    }

    /// Step forward until finished, deadlocked, or `max_ticks` ticks ran
    pub fn run_to_end(&mut self, max_ticks: usize) -> RunOutcome {
        for _ in 0..max_ticks {
            if self.orchestrator.is_deadlocked() {
                break;
            }
            if self.step_forward().is_none() {
                break;
            }
        }

        let clock = self.orchestrator.clock();
        if self.orchestrator.is_finished() {
            RunOutcome::Finished { clock }
        } else if self.orchestrator.is_deadlocked() {
            RunOutcome::Deadlocked { clock }
        } else {
            RunOutcome::TickLimit { clock }
        }
    }

    /// Rewind all the way to the first recorded state
    pub fn rewind(&mut self) {
        while self.step_back() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::engine::{OrchestratorConfig, TaskConfig};

    fn timeline() -> Timeline {
        let config = OrchestratorConfig {
            algorithm: "srtf".to_string(),
            quantum: 2,
            task_configs: vec![TaskConfig::new("T1", 0, 5, 0), TaskConfig::new("T2", 2, 3, 0)],
            ..Default::default()
        };
        Timeline::new(Orchestrator::new(config).unwrap())
    }

    #[test]
    fn test_step_back_restores_previous_tick() {
        let mut tl = timeline();
        tl.step_forward();
        tl.step_forward();
        let before = tl.current().snapshot();

        tl.step_forward();
        assert_eq!(tl.depth(), 3);
        assert!(tl.step_back());
        assert_eq!(tl.current().snapshot(), before);
        assert_eq!(tl.current().clock(), 2);
    }

    #[test]
    fn test_step_back_at_start_is_noop() {
        let mut tl = timeline();
        assert!(!tl.can_step_back());
        assert!(!tl.step_back());
        assert_eq!(tl.current().clock(), 0);
    }

    #[test]
    fn test_replay_after_rewind_is_identical() {
        let mut tl = timeline();
        let outcome = tl.run_to_end(100);
        assert_eq!(outcome, RunOutcome::Finished { clock: 8 });
        let finished = tl.current().snapshot();

        tl.rewind();
        assert_eq!(tl.current().clock(), 0);
        assert_eq!(tl.run_to_end(100), outcome);
        assert_eq!(tl.current().snapshot(), finished);
    }

    #[test]
    fn test_no_step_past_completion() {
        let mut tl = timeline();
        tl.run_to_end(100);
        let depth = tl.depth();
        assert!(tl.step_forward().is_none());
        assert_eq!(tl.depth(), depth);
    }
}

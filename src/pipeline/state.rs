//! Pipeline state machine and run-scoped state.

use crate::error::{ReviewError, ReviewResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Stages of a review run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Fetching,
    Analyzing,
    Merged,
    Synthesizing,
    Formatting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "Idle",
            PipelineState::Fetching => "Fetching",
            PipelineState::Analyzing => "Analyzing",
            PipelineState::Merged => "Merged",
            PipelineState::Synthesizing => "Synthesizing",
            PipelineState::Formatting => "Formatting",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

/// States reachable from `from` in one step.
pub fn allowed_transitions(from: PipelineState) -> Vec<PipelineState> {
    use PipelineState::*;
    match from {
        Idle => vec![Fetching, Failed],
        Fetching => vec![Analyzing, Failed],
        Analyzing => vec![Merged, Failed],
        Merged => vec![Synthesizing, Failed],
        Synthesizing => vec![Formatting, Failed],
        Formatting => vec![Done, Failed],
        Done => vec![],
        Failed => vec![],
    }
}

pub fn validate_transition(from: PipelineState, to: PipelineState) -> ReviewResult<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ReviewError::IllegalTransition { from, to })
    }
}

/// State owned by a single pipeline invocation.
#[derive(Debug)]
pub struct ReviewRun {
    pub year: i32,
    state: PipelineState,
    history: Vec<PipelineState>,
    started: Instant,
}

impl ReviewRun {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state this run has been in, oldest first.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn advance(&mut self, to: PipelineState) -> ReviewResult<()> {
        validate_transition(self.state, to)?;
        debug!("Pipeline {} -> {}", self.state, to);
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed`, returning the stage that was active.
    pub fn fail(&mut self) -> PipelineState {
        let stage = self.state;
        if !stage.is_terminal() {
            debug!("Pipeline {} -> {}", stage, PipelineState::Failed);
            self.state = PipelineState::Failed;
            self.history.push(PipelineState::Failed);
        }
        stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut run = ReviewRun::new(2024);
        for to in [
            PipelineState::Fetching,
            PipelineState::Analyzing,
            PipelineState::Merged,
            PipelineState::Synthesizing,
            PipelineState::Formatting,
            PipelineState::Done,
        ] {
            run.advance(to).unwrap();
        }
        assert_eq!(run.state(), PipelineState::Done);
        assert_eq!(run.history().len(), 7);
    }

    #[test]
    fn test_illegal_transition() {
        let mut run = ReviewRun::new(2024);
        let err = run.advance(PipelineState::Merged).unwrap_err();
        assert_eq!(
            err,
            ReviewError::IllegalTransition {
                from: PipelineState::Idle,
                to: PipelineState::Merged
            }
        );
        assert_eq!(run.state(), PipelineState::Idle);
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for state in [
            PipelineState::Idle,
            PipelineState::Fetching,
            PipelineState::Analyzing,
            PipelineState::Merged,
            PipelineState::Synthesizing,
            PipelineState::Formatting,
        ] {
            assert!(validate_transition(state, PipelineState::Failed).is_ok());
        }
        assert!(validate_transition(PipelineState::Done, PipelineState::Failed).is_err());
    }

    #[test]
    fn test_fail_reports_active_stage() {
        let mut run = ReviewRun::new(2024);
        run.advance(PipelineState::Fetching).unwrap();
        assert_eq!(run.fail(), PipelineState::Fetching);
        assert_eq!(run.state(), PipelineState::Failed);
        assert_eq!(run.fail(), PipelineState::Failed);
        assert_eq!(run.history().len(), 3);
    }
}

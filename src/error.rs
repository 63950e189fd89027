//! Error taxonomy for a review run.
//!
//! Parsing and analyzer errors abort the run. Synthesis errors are
//! recorded on the output and rendered as a degraded report instead.

use crate::analysis::AnalyzerKind;
use crate::pipeline::PipelineState;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while producing a review.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    /// A ledger row could not be turned into a shoot record.
    #[error("Malformed record at row {row} ({reason}): {raw}")]
    MalformedRecord {
        /// 1-indexed data row (the header is not counted).
        row: usize,
        /// The row as it appeared in the ledger.
        raw: String,
        reason: String,
    },

    /// An analyzer that needs at least one record received none.
    #[error("{analyzer} analyzer received an empty dataset")]
    EmptyDataset { analyzer: AnalyzerKind },

    #[error("{analyzer} analyzer exceeded its {}ms budget", budget.as_millis())]
    AnalyzerTimeout {
        analyzer: AnalyzerKind,
        budget: Duration,
    },

    /// The analyzer task panicked or was cancelled before producing a result.
    #[error("{analyzer} analyzer aborted: {reason}")]
    AnalyzerAborted {
        analyzer: AnalyzerKind,
        reason: String,
    },

    #[error("Ledger provider failed: {0}")]
    Provider(String),

    #[error("Insight synthesis failed: {0}")]
    Synthesis(String),

    #[error("Illegal pipeline transition: {from} -> {to}")]
    IllegalTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

impl ReviewError {
    /// Whether a bounded retry may help. Only the two external calls qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Synthesis(_))
    }
}

/// A failed run: the stage that was active and what went wrong.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} stage failed: {error}")]
pub struct StageFailure {
    pub stage: PipelineState,
    #[source]
    pub error: ReviewError,
}

impl StageFailure {
    pub fn new(stage: PipelineState, error: ReviewError) -> Self {
        Self { stage, error }
    }
}

pub type ReviewResult<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = ReviewError::MalformedRecord {
            row: 3,
            raw: "2024-01-01,A,Portrait,1:00 PM,2:00 PM,abc,Cash".to_string(),
            reason: "invalid amount 'abc'".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("row 3"));
        assert!(message.contains("abc"));
    }

    #[test]
    fn test_retryable() {
        assert!(ReviewError::Provider("offline".to_string()).is_retryable());
        assert!(ReviewError::Synthesis("timeout".to_string()).is_retryable());
        assert!(!ReviewError::EmptyDataset {
            analyzer: AnalyzerKind::Revenue
        }
        .is_retryable());
    }

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure::new(
            PipelineState::Fetching,
            ReviewError::Provider("connection refused".to_string()),
        );
        assert_eq!(
            failure.to_string(),
            "Fetching stage failed: Ledger provider failed: connection refused"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = ReviewError::AnalyzerTimeout {
            analyzer: AnalyzerKind::Trends,
            budget: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Trends analyzer exceeded its 250ms budget");
    }
}

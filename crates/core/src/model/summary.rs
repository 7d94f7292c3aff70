use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::choice::ChoiceRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// Pass/retry classification of a finished session for the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Pass,
    Retry,
    /// No pass threshold was configured.
    Unrated,
}

impl SessionOutcome {
    #[must_use]
    pub fn classify(score: usize, pass_threshold: Option<usize>) -> Self {
        match pass_threshold {
            Some(threshold) if score >= threshold => Self::Pass,
            Some(_) => Self::Retry,
            None => Self::Unrated,
        }
    }

    #[must_use]
    pub fn is_pass(self) -> Option<bool> {
        match self {
            Self::Pass => Some(true),
            Self::Retry => Some(false),
            Self::Unrated => None,
        }
    }
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: usize,
    pub is_complete: bool,
}

/// Aggregate summary for a completed quiz session.
///
/// This is what reward collaborators consume instead of reaching into
/// the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: usize,
    correct: usize,
    incorrect: usize,
    timed_out: usize,
    outcome: SessionOutcome,
}

impl SessionSummary {
    /// Build a summary from the ordered choice trail.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_choices(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        choices: &[ChoiceRecord],
        pass_threshold: Option<usize>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let mut correct = 0_usize;
        let mut timed_out = 0_usize;
        for choice in choices {
            if choice.is_correct() {
                correct += 1;
            }
            if choice.is_timed_out() {
                timed_out += 1;
            }
        }

        Ok(Self {
            started_at,
            completed_at,
            total: choices.len(),
            correct,
            incorrect: choices.len() - correct,
            timed_out,
            outcome: SessionOutcome::classify(correct, pass_threshold),
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Includes timed-out questions.
    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.incorrect
    }

    #[must_use]
    pub fn timed_out(&self) -> usize {
        self.timed_out
    }

    #[must_use]
    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    /// Fraction of questions answered correctly, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

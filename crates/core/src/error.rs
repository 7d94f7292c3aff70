use thiserror::Error;

use crate::model::{ConfigError, OptionId, QuestionId, SessionSummaryError};
use crate::session::SessionStatus;

/// Contract violations reported by `QuizSession`.
///
/// None of these are transient: each one points at a host bug and should be
/// surfaced, not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("option {option_id} does not belong to question {question_id}")]
    InvalidOption {
        question_id: QuestionId,
        option_id: OptionId,
    },

    #[error("question {question_id} is not part of this session")]
    UnknownQuestion { question_id: QuestionId },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

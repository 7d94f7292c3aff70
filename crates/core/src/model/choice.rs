use serde::Serialize;

use crate::model::ids::{OptionId, QuestionId};

/// Record of how a single question was resolved.
///
/// Exactly one record exists per resolved question, appended in question
/// order. A timed-out record has no option and is never correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceRecord {
    question_id: QuestionId,
    option_id: Option<OptionId>,
    is_correct: bool,
    timed_out: bool,
}

impl ChoiceRecord {
    #[must_use]
    pub fn answered(question_id: QuestionId, option_id: OptionId, is_correct: bool) -> Self {
        Self {
            question_id,
            option_id: Some(option_id),
            is_correct,
            timed_out: false,
        }
    }

    #[must_use]
    pub fn timed_out(question_id: QuestionId) -> Self {
        Self {
            question_id,
            option_id: None,
            is_correct: false,
            timed_out: true,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn option_id(&self) -> Option<&OptionId> {
        self.option_id.as_ref()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }
}

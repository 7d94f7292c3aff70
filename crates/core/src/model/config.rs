use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::{Question, QuestionDraft};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected session configuration. Raised before a session can be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("question list cannot be empty")]
    NoQuestions,

    #[error("question id cannot be blank")]
    BlankQuestionId,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(QuestionId),

    #[error("question {question_id} needs at least 2 options, got {count}")]
    TooFewOptions { question_id: QuestionId, count: usize },

    #[error("question {question_id} has a blank option id")]
    BlankOptionId { question_id: QuestionId },

    #[error("question {question_id} has duplicate option id: {option_id}")]
    DuplicateOptionId {
        question_id: QuestionId,
        option_id: OptionId,
    },

    #[error("question {question_id} has no option marked correct")]
    NoCorrectOption { question_id: QuestionId },

    #[error("round time must be > 0 seconds")]
    InvalidRoundTime,

    #[error("pass threshold ({threshold}) exceeds question count ({total})")]
    UnreachablePassThreshold { threshold: usize, total: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated quiz configuration, usually deserialized from a content pack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_time_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<usize>,
    #[serde(default)]
    pub auto_advance: bool,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    #[must_use]
    pub fn new(questions: Vec<QuestionDraft>) -> Self {
        Self {
            round_time_secs: None,
            pass_threshold: None,
            auto_advance: false,
            questions,
        }
    }

    #[must_use]
    pub fn with_round_time_secs(mut self, secs: u32) -> Self {
        self.round_time_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_pass_threshold(mut self, threshold: usize) -> Self {
        self.pass_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Validate every question and the session-level knobs.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found, checking questions in order.
    pub fn validate(self) -> Result<SessionConfig, ConfigError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = SessionConfig::new(questions)?.with_auto_advance(self.auto_advance);
        if let Some(secs) = self.round_time_secs {
            config = config.with_round_time_secs(secs)?;
        }
        if let Some(threshold) = self.pass_threshold {
            config = config.with_pass_threshold(threshold)?;
        }
        Ok(config)
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Validated configuration for a single quiz session.
///
/// Holds the ordered, non-empty question list plus the optional per-question
/// time limit and pass threshold. The pass threshold only classifies a
/// finished session; it never changes how the session runs.
///
/// With `auto_advance` set, a submitted answer moves straight on to the next
/// question instead of waiting for the host to call `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    questions: Vec<Question>,
    round_time_secs: Option<u32>,
    pass_threshold: Option<usize>,
    auto_advance: bool,
}

impl SessionConfig {
    /// Creates an untimed configuration without a pass threshold.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoQuestions` for an empty list and
    /// `ConfigError::DuplicateQuestionId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, ConfigError> {
        validate_questions(&questions)?;
        Ok(Self {
            questions,
            round_time_secs: None,
            pass_threshold: None,
            auto_advance: false,
        })
    }

    /// Enables the per-question countdown.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRoundTime` if `secs` is zero.
    pub fn with_round_time_secs(mut self, secs: u32) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidRoundTime);
        }
        self.round_time_secs = Some(secs);
        Ok(self)
    }

    /// Sets the score a finished session needs to count as a pass.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnreachablePassThreshold` if it exceeds the question count.
    pub fn with_pass_threshold(mut self, threshold: usize) -> Result<Self, ConfigError> {
        check_threshold(threshold, self.questions.len())?;
        self.pass_threshold = Some(threshold);
        Ok(self)
    }

    #[must_use]
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Rebuild the question list (e.g. reorder or truncate it), keeping the other settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the new list is empty, has duplicate ids, or no
    /// longer satisfies the pass threshold.
    pub fn with_questions(
        self,
        f: impl FnOnce(Vec<Question>) -> Result<Vec<Question>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let questions = f(self.questions)?;
        validate_questions(&questions)?;
        if let Some(threshold) = self.pass_threshold {
            check_threshold(threshold, questions.len())?;
        }
        Ok(Self {
            questions,
            round_time_secs: self.round_time_secs,
            pass_threshold: self.pass_threshold,
            auto_advance: self.auto_advance,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn round_time_secs(&self) -> Option<u32> {
        self.round_time_secs
    }

    #[must_use]
    pub fn round_time(&self) -> Option<Duration> {
        self.round_time_secs
            .map(|secs| Duration::seconds(i64::from(secs)))
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.round_time_secs.is_some()
    }

    #[must_use]
    pub fn pass_threshold(&self) -> Option<usize> {
        self.pass_threshold
    }

    #[must_use]
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    #[must_use]
    pub fn into_draft(self) -> QuizDraft {
        QuizDraft {
            round_time_secs: self.round_time_secs,
            pass_threshold: self.pass_threshold,
            auto_advance: self.auto_advance,
            questions: self
                .questions
                .into_iter()
                .map(Question::into_draft)
                .collect(),
        }
    }
}

fn validate_questions(questions: &[Question]) -> Result<(), ConfigError> {
    if questions.is_empty() {
        return Err(ConfigError::NoQuestions);
    }
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        if !seen.insert(question.id()) {
            return Err(ConfigError::DuplicateQuestionId(question.id().clone()));
        }
    }
    Ok(())
}

fn check_threshold(threshold: usize, total: usize) -> Result<(), ConfigError> {
    if threshold > total {
        return Err(ConfigError::UnreachablePassThreshold { threshold, total });
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

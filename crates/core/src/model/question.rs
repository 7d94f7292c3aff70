use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::config::ConfigError;
use crate::model::ids::{OptionId, QuestionId};

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated answer option as it arrives from content data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDraft {
    pub id: OptionId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_correct: bool,
}

impl OptionDraft {
    #[must_use]
    pub fn new(id: impl Into<OptionId>, label: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            is_correct,
        }
    }

    #[must_use]
    pub fn correct(id: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self::new(id, label, true)
    }

    #[must_use]
    pub fn wrong(id: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self::new(id, label, false)
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    fn into_option(self) -> AnswerOption {
        AnswerOption {
            id: self.id,
            label: self.label,
            icon: self.icon,
            is_correct: self.is_correct,
        }
    }
}

/// Unvalidated question as it arrives from content data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<OptionDraft>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        options: Vec<OptionDraft>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
        }
    }

    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the id is blank, there are fewer than two options,
    /// option ids are blank or duplicated, or no option is flagged correct.
    pub fn validate(self) -> Result<Question, ConfigError> {
        if self.id.is_blank() {
            return Err(ConfigError::BlankQuestionId);
        }
        let options: Vec<AnswerOption> =
            self.options.into_iter().map(OptionDraft::into_option).collect();
        validate_options(&self.id, &options)?;

        Ok(Question {
            id: self.id,
            prompt: self.prompt,
            options,
        })
    }
}

//
// ─── VALIDATED TYPES ───────────────────────────────────────────────────────────
//

/// One selectable answer. `label` and `icon` are display payload only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    id: OptionId,
    label: String,
    icon: Option<String>,
    is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    fn into_draft(self) -> OptionDraft {
        OptionDraft {
            id: self.id,
            label: self.label,
            icon: self.icon,
            is_correct: self.is_correct,
        }
    }
}

/// A validated question: at least two options with unique ids, at least one
/// of them correct. More than one option may be correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<AnswerOption>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Looks up an option by id.
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == *id)
    }

    pub fn correct_options(&self) -> impl Iterator<Item = &AnswerOption> {
        self.options.iter().filter(|option| option.is_correct)
    }

    #[must_use]
    pub fn has_multiple_correct(&self) -> bool {
        self.correct_options().nth(1).is_some()
    }

    /// Rebuild this question with its options transformed by `f` (e.g. reordered).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the transformed option list no longer validates.
    pub fn with_options(
        self,
        f: impl FnOnce(Vec<AnswerOption>) -> Vec<AnswerOption>,
    ) -> Result<Self, ConfigError> {
        let options = f(self.options);
        validate_options(&self.id, &options)?;
        Ok(Self {
            id: self.id,
            prompt: self.prompt,
            options,
        })
    }

    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            id: self.id,
            prompt: self.prompt,
            options: self
                .options
                .into_iter()
                .map(AnswerOption::into_draft)
                .collect(),
        }
    }
}

fn validate_options(question_id: &QuestionId, options: &[AnswerOption]) -> Result<(), ConfigError> {
    if options.len() < 2 {
        return Err(ConfigError::TooFewOptions {
            question_id: question_id.clone(),
            count: options.len(),
        });
    }

    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if option.id.is_blank() {
            return Err(ConfigError::BlankOptionId {
                question_id: question_id.clone(),
            });
        }
        if !seen.insert(&option.id) {
            return Err(ConfigError::DuplicateOptionId {
                question_id: question_id.clone(),
                option_id: option.id.clone(),
            });
        }
    }

    if !options.iter().any(|option| option.is_correct) {
        return Err(ConfigError::NoCorrectOption {
            question_id: question_id.clone(),
        });
    }

    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

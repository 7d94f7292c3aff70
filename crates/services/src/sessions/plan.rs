use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{ConfigError, SessionConfig};

/// Shapes a validated configuration before a session is built from it.
///
/// With shuffling off the plan is deterministic: the first `max_questions`
/// questions in their authored order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionPlanner {
    max_questions: Option<usize>,
    shuffle_questions: bool,
    shuffle_options: bool,
}

impl SessionPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of questions played in one session.
    #[must_use]
    pub fn with_max_questions(mut self, max: usize) -> Self {
        self.max_questions = Some(max);
        self
    }

    /// Shuffle question order before the cap is applied.
    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    /// Shuffle the options within each question.
    #[must_use]
    pub fn with_shuffle_options(mut self, shuffle: bool) -> Self {
        self.shuffle_options = shuffle;
        self
    }

    /// Plan a session using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the cap leaves no questions or drops the
    /// question count below the configured pass threshold.
    pub fn plan(&self, config: SessionConfig) -> Result<SessionConfig, ConfigError> {
        self.plan_with_rng(config, &mut rng())
    }

    /// Plan a session with a caller-supplied RNG (seeded in tests).
    ///
    /// # Errors
    ///
    /// See [`SessionPlanner::plan`].
    pub fn plan_with_rng<R: Rng + ?Sized>(
        &self,
        config: SessionConfig,
        rng: &mut R,
    ) -> Result<SessionConfig, ConfigError> {
        config.with_questions(|mut questions| {
            if self.shuffle_questions {
                questions.shuffle(&mut *rng);
            }
            if let Some(max) = self.max_questions {
                questions.truncate(max);
            }
            if !self.shuffle_options {
                return Ok(questions);
            }

            let mut planned = Vec::with_capacity(questions.len());
            for question in questions {
                planned.push(question.with_options(|mut options| {
                    options.shuffle(&mut *rng);
                    options
                })?);
            }
            Ok(planned)
        })
    }
}

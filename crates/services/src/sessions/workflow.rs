use std::sync::Arc;

use quiz_core::model::{ChoiceRecord, OptionId, SessionConfig, SessionSummary};
use quiz_core::{Clock, Deadline, QuizSession, Resolution, SessionObserver};

use super::plan::SessionPlanner;
use crate::error::ServiceError;

/// Result of resolving the current question through the loop service.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    /// `None` when the trigger was ignored (question already resolved or stale timer).
    pub choice: Option<ChoiceRecord>,
    pub is_complete: bool,
    pub summary: Option<SessionSummary>,
}

/// Orchestrates session start and answering with a shared clock.
///
/// Answers are resolved and advanced in one step; hosts that want a
/// feedback pause between the two drive `QuizSession` directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizLoopService {
    clock: Clock,
    planner: SessionPlanner,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            planner: SessionPlanner::default(),
        }
    }

    #[must_use]
    pub fn with_planner(mut self, planner: SessionPlanner) -> Self {
        self.planner = planner;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Plan and start a new session.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if planning rejects the configuration.
    pub fn start_session(&self, config: SessionConfig) -> Result<QuizSession, ServiceError> {
        self.start_observed(config, Vec::new())
    }

    /// Plan and start a new session with observers subscribed before the
    /// `Started` event fires.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if planning rejects the configuration.
    pub fn start_observed(
        &self,
        config: SessionConfig,
        observers: Vec<Arc<dyn SessionObserver>>,
    ) -> Result<QuizSession, ServiceError> {
        let config = self.planner.plan(config)?;
        let mut session = QuizSession::new(config);
        for observer in observers {
            session.subscribe(observer);
        }
        session.start(self.clock.now())?;
        tracing::info!(
            session_id = %session.id(),
            questions = session.questions().len(),
            timed = session.config().is_timed(),
            "quiz session started"
        );
        Ok(session)
    }

    /// Answer the current question and move on.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Session` for invalid state or an unknown option.
    pub fn answer_current(
        &self,
        session: &mut QuizSession,
        option_id: &OptionId,
    ) -> Result<AnswerResult, ServiceError> {
        let now = self.clock.now();
        let resolution = session.submit_answer(option_id, now)?;
        if resolution.is_resolved() && session.is_current_resolved() {
            session.advance(now)?;
        }
        Ok(self.result(session, resolution))
    }

    /// Handle an elapsed timer for `deadline`.
    ///
    /// Only expires the question if `deadline` is still the session's current
    /// deadline; a timer armed for an earlier question, or before a `reset`,
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Session` if the session is not timed.
    pub fn expire_current(
        &self,
        session: &mut QuizSession,
        deadline: Deadline,
    ) -> Result<AnswerResult, ServiceError> {
        let resolution = if session.deadline() == Some(deadline) {
            session.expire_deadline(self.clock.now())?
        } else {
            tracing::debug!(
                attempt = deadline.attempt(),
                question_index = deadline.question_index(),
                "ignoring stale deadline"
            );
            Resolution::Ignored
        };
        Ok(self.result(session, resolution))
    }

    /// Expire the current question if its deadline has passed on this service's clock.
    ///
    /// For hosts that poll instead of using `DeadlineTimer`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Session` if the session rejects the expiry.
    pub fn poll_deadline(&self, session: &mut QuizSession) -> Result<AnswerResult, ServiceError> {
        let resolution = session.tick(self.clock.now())?;
        Ok(self.result(session, resolution))
    }

    // Runs after the session has committed the transition, so it must not fail.
    fn result(&self, session: &QuizSession, resolution: Resolution) -> AnswerResult {
        let summary = match session.summary() {
            Ok(summary) if resolution.is_resolved() => {
                tracing::info!(
                    session_id = %session.id(),
                    correct = summary.correct(),
                    total = summary.total(),
                    timed_out = summary.timed_out(),
                    "quiz session completed"
                );
                Some(summary)
            }
            Ok(summary) => Some(summary),
            Err(err) if session.is_complete() => {
                tracing::warn!(session_id = %session.id(), error = %err, "completed session has no summary");
                None
            }
            Err(_) => None,
        };

        AnswerResult {
            choice: resolution.into_choice(),
            is_complete: session.is_complete(),
            summary,
        }
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::events::{SessionEvent, SessionObserver};
use crate::model::{
    ChoiceRecord, OptionId, Question, QuestionId, QuizDraft, SessionConfig, SessionId,
    SessionOutcome, SessionProgress, SessionSummary,
};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz session. `Completed` is terminal except for `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Ready,
    InProgress,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::Ready => "ready",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

//
// ─── DEADLINE ──────────────────────────────────────────────────────────────────
//

/// Point in time after which the current question resolves as timed out.
///
/// `attempt` counts starts of the session, so a deadline armed before a
/// `reset` never equals one armed after it, even at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deadline {
    attempt: u32,
    question_index: usize,
    expires_at: DateTime<Utc>,
}

impl Deadline {
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Time left before expiry, never negative.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

//
// ─── RESOLUTION ────────────────────────────────────────────────────────────────
//

/// Result of a trigger that may resolve the current question.
///
/// `Ignored` means the question had already been resolved (or the trigger was
/// stale) and nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ChoiceRecord),
    Ignored,
}

impl Resolution {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    #[must_use]
    pub fn choice(&self) -> Option<&ChoiceRecord> {
        match self {
            Resolution::Resolved(choice) => Some(choice),
            Resolution::Ignored => None,
        }
    }

    #[must_use]
    pub fn into_choice(self) -> Option<ChoiceRecord> {
        match self {
            Resolution::Resolved(choice) => Some(choice),
            Resolution::Ignored => None,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Drives one player through an ordered, fixed list of questions.
///
/// The session never reads a clock: every operation that may arm a deadline
/// takes `now` from the host. Resolution of a question is idempotent, so a
/// click and a timer racing for the same question resolve it exactly once.
pub struct QuizSession {
    id: SessionId,
    config: SessionConfig,
    status: SessionStatus,
    attempt: u32,
    current: usize,
    choices: Vec<ChoiceRecord>,
    deadline: Option<Deadline>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: SessionId::random(),
            config,
            status: SessionStatus::Ready,
            attempt: 0,
            current: 0,
            choices: Vec::new(),
            deadline: None,
            started_at: None,
            completed_at: None,
            observers: Vec::new(),
        }
    }

    /// Validate a draft and build a session from it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidConfiguration` if the draft is rejected.
    pub fn from_draft(draft: QuizDraft) -> Result<Self, SessionError> {
        Ok(Self::new(draft.validate()?))
    }

    /// Register an observer; it sees every event emitted from now on.
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    // ─── Reads ─────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.config.questions()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being played; `None` unless the session is in progress.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.status == SessionStatus::InProgress {
            self.config.questions().get(self.current)
        } else {
            None
        }
    }

    /// Ordered trail of resolved questions; index `i` belongs to question `i`.
    #[must_use]
    pub fn choices(&self) -> &[ChoiceRecord] {
        &self.choices
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Number of correctly answered questions so far.
    #[must_use]
    pub fn score(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct()).count()
    }

    /// `None` when no pass threshold is configured.
    #[must_use]
    pub fn is_passing(&self) -> Option<bool> {
        self.config
            .pass_threshold()
            .map(|threshold| self.score() >= threshold)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// True once the current question has a choice record and is waiting for `advance`.
    #[must_use]
    pub fn is_current_resolved(&self) -> bool {
        self.status == SessionStatus::InProgress && self.choices.len() > self.current
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.config.questions().len();
        SessionProgress {
            total,
            answered: self.choices.len(),
            remaining: total.saturating_sub(self.choices.len()),
            score: self.score(),
            is_complete: self.is_complete(),
        }
    }

    /// Pass/retry classification; `None` until the session completes.
    #[must_use]
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.is_complete()
            .then(|| SessionOutcome::classify(self.score(), self.config.pass_threshold()))
    }

    /// Summary of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session has not completed.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let (Some(started_at), Some(completed_at)) = (self.started_at, self.completed_at) else {
            return Err(self.reject("summarize"));
        };
        Ok(SessionSummary::from_choices(
            started_at,
            completed_at,
            &self.choices,
            self.config.pass_threshold(),
        )?)
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    /// Begin play at question 0.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Ready`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Ready {
            return Err(self.reject("start"));
        }

        self.status = SessionStatus::InProgress;
        self.attempt = self.attempt.wrapping_add(1);
        self.current = 0;
        self.choices.clear();
        self.started_at = Some(now);
        self.completed_at = None;
        self.arm_deadline(now);

        self.emit(&SessionEvent::Started {
            session_id: self.id,
            total: self.config.questions().len(),
            deadline: self.deadline.map(|d| d.expires_at),
        });
        Ok(())
    }

    /// Answer the current question with `option_id`.
    ///
    /// A second answer for an already-resolved question is ignored. With
    /// `auto_advance` configured the session moves on immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is in progress.
    /// Returns `SessionError::InvalidOption` if `option_id` is not an option of
    /// the current question; the session is left unchanged.
    pub fn submit_answer(
        &mut self,
        option_id: &OptionId,
        now: DateTime<Utc>,
    ) -> Result<Resolution, SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(self.reject("submit an answer"));
        }
        if self.is_current_resolved() {
            debug!(session_id = %self.id, question_index = self.current, "ignoring answer for resolved question");
            return Ok(Resolution::Ignored);
        }

        let question = &self.config.questions()[self.current];
        let Some(option) = question.option(option_id) else {
            warn!(
                session_id = %self.id,
                question_id = %question.id(),
                option_id = %option_id,
                "answer references an unknown option"
            );
            return Err(SessionError::InvalidOption {
                question_id: question.id().clone(),
                option_id: option_id.clone(),
            });
        };

        let choice = ChoiceRecord::answered(
            question.id().clone(),
            option_id.clone(),
            option.is_correct(),
        );
        let resolution = self.resolve(choice);

        if self.config.auto_advance() {
            self.advance(now)?;
        }
        Ok(resolution)
    }

    /// Answer `question_id` with `option_id`, ignoring the event if that
    /// question has already been resolved.
    ///
    /// Use this for UI events that may arrive after a timer already moved the
    /// session on.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` if `question_id` is not in the
    /// session. Returns `SessionError::InvalidState` for a question the session
    /// has not reached yet. Otherwise the same as [`QuizSession::submit_answer`].
    pub fn submit_answer_for(
        &mut self,
        question_id: &QuestionId,
        option_id: &OptionId,
        now: DateTime<Utc>,
    ) -> Result<Resolution, SessionError> {
        if !self.questions().iter().any(|q| q.id() == question_id) {
            warn!(session_id = %self.id, question_id = %question_id, "answer references an unknown question");
            return Err(SessionError::UnknownQuestion {
                question_id: question_id.clone(),
            });
        }
        if self.choices.iter().any(|c| c.question_id() == question_id) {
            debug!(session_id = %self.id, question_id = %question_id, "ignoring stale answer");
            return Ok(Resolution::Ignored);
        }

        let is_current = self
            .current_question()
            .is_some_and(|question| question.id() == question_id);
        if self.status == SessionStatus::InProgress && !is_current {
            return Err(self.reject("answer a question not yet reached"));
        }
        self.submit_answer(option_id, now)
    }

    /// Move past the resolved current question, completing the session after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not in progress
    /// or the current question is still unresolved.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<SessionStatus, SessionError> {
        if !self.is_current_resolved() {
            return Err(self.reject("advance"));
        }

        if self.current + 1 < self.config.questions().len() {
            self.current += 1;
            self.arm_deadline(now);
            self.emit(&SessionEvent::Advanced {
                question_index: self.current,
                deadline: self.deadline.map(|d| d.expires_at),
            });
        } else {
            self.status = SessionStatus::Completed;
            // A wall clock stepped backwards must not put completion before start.
            self.completed_at = Some(self.started_at.map_or(now, |started| started.max(now)));
            self.deadline = None;
            debug!(session_id = %self.id, score = self.score(), "session completed");
            self.emit(&SessionEvent::Completed {
                score: self.score(),
                total: self.config.questions().len(),
                choices: self.choices.clone(),
            });
        }
        Ok(self.status)
    }

    /// Resolve the current question as timed out and advance.
    ///
    /// A timer firing after the question was resolved, or after the session
    /// left `InProgress`, is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if no round time is configured.
    pub fn expire_deadline(&mut self, now: DateTime<Utc>) -> Result<Resolution, SessionError> {
        if !self.config.is_timed() {
            return Err(self.reject("expire a deadline"));
        }
        if self.status != SessionStatus::InProgress || self.is_current_resolved() {
            debug!(session_id = %self.id, status = %self.status, "ignoring late deadline");
            return Ok(Resolution::Ignored);
        }

        let question_id = self.config.questions()[self.current].id().clone();
        self.emit(&SessionEvent::TimedOut {
            question_index: self.current,
            question_id: question_id.clone(),
        });
        let resolution = self.resolve(ChoiceRecord::timed_out(question_id));
        self.advance(now)?;
        Ok(resolution)
    }

    /// Expire the current question only if its deadline has passed at `now`.
    ///
    /// Timer drivers call this on every wake-up; an early or stale wake-up is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`QuizSession::expire_deadline`].
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Resolution, SessionError> {
        match self.deadline {
            Some(deadline) if deadline.is_expired(now) => self.expire_deadline(now),
            _ => Ok(Resolution::Ignored),
        }
    }

    /// Return to `Ready` from any state, discarding all progress.
    pub fn reset(&mut self) {
        self.status = SessionStatus::Ready;
        self.current = 0;
        self.choices.clear();
        self.deadline = None;
        self.started_at = None;
        self.completed_at = None;
        self.emit(&SessionEvent::Reset);
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn resolve(&mut self, choice: ChoiceRecord) -> Resolution {
        self.deadline = None;
        self.choices.push(choice.clone());
        self.emit(&SessionEvent::Answered {
            question_index: self.current,
            choice: choice.clone(),
        });
        Resolution::Resolved(choice)
    }

    fn arm_deadline(&mut self, now: DateTime<Utc>) {
        self.deadline = self.config.round_time().map(|round_time| Deadline {
            attempt: self.attempt,
            question_index: self.current,
            expires_at: now + round_time,
        });
    }

    fn reject(&self, operation: &'static str) -> SessionError {
        warn!(session_id = %self.id, status = %self.status, operation, "rejected session operation");
        SessionError::InvalidState {
            operation,
            status: self.status,
        }
    }

    fn emit(&self, event: &SessionEvent) {
        debug!(session_id = %self.id, event = event.kind(), "session event");
        for observer in &self.observers {
            observer.notify(event);
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.config.questions().len())
            .field("status", &self.status)
            .field("attempt", &self.attempt)
            .field("current", &self.current)
            .field("choices_len", &self.choices.len())
            .field("deadline", &self.deadline)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::model::{ConfigError, OptionDraft, QuestionDraft};
    use crate::time::fixed_now;

    /// Five questions, each with the single correct option at index 2.
    fn five_questions() -> QuizDraft {
        let questions = (1..=5)
            .map(|n| {
                QuestionDraft::new(
                    format!("q{n}"),
                    format!("Question {n}"),
                    vec![
                        OptionDraft::wrong("a", "A"),
                        OptionDraft::wrong("b", "B"),
                        OptionDraft::correct("c", "C"),
                        OptionDraft::wrong("d", "D"),
                    ],
                )
            })
            .collect();
        QuizDraft::new(questions)
    }

    fn session(draft: QuizDraft) -> QuizSession {
        QuizSession::from_draft(draft).unwrap()
    }

    fn correct() -> OptionId {
        OptionId::new("c")
    }

    fn wrong() -> OptionId {
        OptionId::new("a")
    }

    fn answer_and_advance(session: &mut QuizSession, option: &OptionId) {
        session.submit_answer(option, fixed_now()).unwrap();
        session.advance(fixed_now()).unwrap();
    }

    #[test]
    fn new_session_is_ready() {
        let session = session(five_questions());
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.current_question().is_none());
        assert_eq!(session.score(), 0);
        assert!(session.deadline().is_none());
    }

    #[test]
    fn all_correct_answers_complete_with_full_score() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        for _ in 0..5 {
            answer_and_advance(&mut session, &correct());
        }

        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.score(), 5);
        assert_eq!(session.choices().len(), 5);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn score_counts_only_correct_choices() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        for option in [correct(), wrong(), correct(), wrong(), wrong()] {
            answer_and_advance(&mut session, &option);
        }

        assert_eq!(session.score(), 2);
        assert!(session.is_complete());
    }

    #[test]
    fn auto_advance_completes_after_n_answers() {
        let mut session = session(five_questions().with_auto_advance(true));
        session.start(fixed_now()).unwrap();

        for i in 0..5 {
            assert_eq!(session.current_index(), i);
            let resolution = session.submit_answer(&correct(), fixed_now()).unwrap();
            assert!(resolution.is_resolved());
        }

        assert!(session.is_complete());
        assert_eq!(session.choices().len(), 5);
    }

    #[test]
    fn duplicate_answer_is_ignored() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        let first = session.submit_answer(&wrong(), fixed_now()).unwrap();
        assert!(first.is_resolved());

        let second = session.submit_answer(&correct(), fixed_now()).unwrap();
        assert_eq!(second, Resolution::Ignored);
        assert_eq!(session.score(), 0);
        assert_eq!(session.choices().len(), 1);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn unknown_option_is_rejected_without_state_change() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        answer_and_advance(&mut session, &correct());

        let err = session
            .submit_answer(&OptionId::new("bogus-id"), fixed_now())
            .unwrap_err();

        assert!(matches!(err, SessionError::InvalidOption { ref option_id, .. } if option_id.as_str() == "bogus-id"));
        assert_eq!(session.choices().len(), 1);
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_current_resolved());
    }

    #[test]
    fn empty_question_list_fails_at_construction() {
        let err = QuizSession::from_draft(QuizDraft::new(Vec::new())).unwrap_err();
        assert_eq!(err, SessionError::InvalidConfiguration(ConfigError::NoQuestions));
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        let err = session.start(fixed_now()).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidState {
                operation: "start",
                status: SessionStatus::InProgress
            }
        );
    }

    #[test]
    fn operations_before_start_are_rejected() {
        let mut session = session(five_questions());
        assert!(matches!(
            session.submit_answer(&correct(), fixed_now()),
            Err(SessionError::InvalidState { status: SessionStatus::Ready, .. })
        ));
        assert!(matches!(
            session.advance(fixed_now()),
            Err(SessionError::InvalidState { .. })
        ));
        assert!(matches!(session.summary(), Err(SessionError::InvalidState { .. })));
    }

    #[test]
    fn advance_requires_resolved_question() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        let err = session.advance(fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { operation: "advance", .. }));
    }

    #[test]
    fn submit_after_completion_is_rejected() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        for _ in 0..5 {
            answer_and_advance(&mut session, &correct());
        }

        let err = session.submit_answer(&correct(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { status: SessionStatus::Completed, .. }));
        assert_eq!(session.score(), 5);
    }

    #[test]
    fn timed_session_arms_and_clears_deadlines() {
        let mut session = session(five_questions().with_round_time_secs(10));
        let now = fixed_now();
        session.start(now).unwrap();

        let deadline = session.deadline().unwrap();
        assert_eq!(deadline.question_index(), 0);
        assert_eq!(deadline.expires_at(), now + Duration::seconds(10));
        assert_eq!(deadline.remaining(now + Duration::seconds(4)), Duration::seconds(6));
        assert_eq!(deadline.remaining(now + Duration::seconds(40)), Duration::zero());

        session.submit_answer(&correct(), now).unwrap();
        assert!(session.deadline().is_none());

        let later = now + Duration::seconds(3);
        session.advance(later).unwrap();
        let next = session.deadline().unwrap();
        assert_eq!(next.question_index(), 1);
        assert_eq!(next.expires_at(), later + Duration::seconds(10));
    }

    #[test]
    fn timeout_on_third_question_scores_four() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();

        answer_and_advance(&mut session, &correct());
        answer_and_advance(&mut session, &correct());
        let resolution = session.expire_deadline(fixed_now()).unwrap();
        assert!(resolution.choice().unwrap().is_timed_out());
        assert_eq!(session.current_index(), 3);
        answer_and_advance(&mut session, &correct());
        answer_and_advance(&mut session, &correct());

        assert!(session.is_complete());
        assert_eq!(session.score(), 4);
        let third = &session.choices()[2];
        assert!(third.is_timed_out());
        assert!(!third.is_correct());
        assert!(third.option_id().is_none());
    }

    #[test]
    fn timeout_matches_incorrect_answer_transition() {
        let timed = five_questions().with_round_time_secs(10);

        let mut expired = session(timed.clone());
        expired.start(fixed_now()).unwrap();
        expired.expire_deadline(fixed_now()).unwrap();

        let mut answered = session(timed);
        answered.start(fixed_now()).unwrap();
        answer_and_advance(&mut answered, &wrong());

        assert_eq!(expired.status(), answered.status());
        assert_eq!(expired.current_index(), answered.current_index());
        assert_eq!(expired.score(), answered.score());
        assert_eq!(expired.deadline(), answered.deadline());
        assert!(expired.choices()[0].is_timed_out());
        assert!(!answered.choices()[0].is_timed_out());
    }

    #[test]
    fn late_timer_after_answer_is_ignored() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();
        session.submit_answer(&correct(), fixed_now()).unwrap();

        let resolution = session.expire_deadline(fixed_now()).unwrap();
        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(session.score(), 1);
        assert_eq!(session.choices().len(), 1);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn late_answer_after_timeout_is_ignored() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();
        let first_id = session.current_question().unwrap().id().clone();
        session.expire_deadline(fixed_now()).unwrap();

        let resolution = session
            .submit_answer_for(&first_id, &correct(), fixed_now())
            .unwrap();
        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(session.choices().len(), 1);
        assert!(!session.is_current_resolved());
    }

    #[test]
    fn stale_answer_after_final_timeout_is_ignored() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();
        for _ in 0..4 {
            answer_and_advance(&mut session, &correct());
        }
        session.expire_deadline(fixed_now()).unwrap();
        assert!(session.is_complete());

        let resolution = session
            .submit_answer_for(&QuestionId::new("q5"), &correct(), fixed_now())
            .unwrap();
        assert_eq!(resolution, Resolution::Ignored);
        assert_eq!(session.score(), 4);
    }

    #[test]
    fn expire_without_round_time_is_rejected() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        let err = session.expire_deadline(fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));
        assert!(session.choices().is_empty());
    }

    #[test]
    fn tick_only_expires_past_deadline() {
        let mut session = session(five_questions().with_round_time_secs(10));
        let now = fixed_now();
        session.start(now).unwrap();

        let early = session.tick(now + Duration::seconds(9)).unwrap();
        assert_eq!(early, Resolution::Ignored);
        assert_eq!(session.current_index(), 0);

        let due = session.tick(now + Duration::seconds(10)).unwrap();
        assert!(due.is_resolved());
        assert_eq!(session.current_index(), 1);

        // The next deadline was armed at the expiry time, so the same instant is early.
        let stale = session.tick(now + Duration::seconds(10)).unwrap();
        assert_eq!(stale, Resolution::Ignored);
    }

    #[test]
    fn reset_then_start_replays_from_scratch() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();
        for _ in 0..5 {
            answer_and_advance(&mut session, &correct());
        }
        assert!(session.is_complete());

        session.reset();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.choices().is_empty());
        assert_eq!(session.current_index(), 0);
        assert!(session.completed_at().is_none());

        session.start(fixed_now()).unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.current_index(), 0);
        assert!(session.choices().is_empty());
        assert_eq!(session.score(), 0);
        assert_eq!(session.deadline().unwrap().question_index(), 0);
    }

    #[test]
    fn restart_arms_a_distinct_deadline() {
        let mut session = session(five_questions().with_round_time_secs(10));
        session.start(fixed_now()).unwrap();
        let before = session.deadline().unwrap();

        session.reset();
        session.start(fixed_now()).unwrap();
        let after = session.deadline().unwrap();

        assert_eq!(before.question_index(), after.question_index());
        assert_eq!(before.expires_at(), after.expires_at());
        assert_ne!(before, after);
        assert_eq!(after.attempt(), before.attempt() + 1);
    }

    #[test]
    fn completion_never_precedes_start() {
        let draft = QuizDraft::new(vec![QuestionDraft::new(
            "only",
            "Only question",
            vec![OptionDraft::correct("a", "A"), OptionDraft::wrong("b", "B")],
        )]);
        let mut session = session(draft);
        let start = fixed_now();
        session.start(start).unwrap();

        let earlier = start - Duration::seconds(1);
        session.submit_answer(&OptionId::new("a"), earlier).unwrap();
        session.advance(earlier).unwrap();

        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(start));
        let summary = session.summary().unwrap();
        assert_eq!(summary.correct(), 1);
    }

    #[test]
    fn answer_for_unknown_question_is_rejected() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        let err = session
            .submit_answer_for(&QuestionId::new("q99"), &correct(), fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::UnknownQuestion {
                question_id: QuestionId::new("q99")
            }
        );
        assert!(session.choices().is_empty());
    }

    #[test]
    fn answer_for_question_not_yet_reached_is_rejected() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        let err = session
            .submit_answer_for(&QuestionId::new("q3"), &correct(), fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));
        assert!(session.choices().is_empty());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn answer_for_current_question_is_scored() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();

        let resolution = session
            .submit_answer_for(&QuestionId::new("q1"), &correct(), fixed_now())
            .unwrap();
        assert!(resolution.choice().unwrap().is_correct());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn choices_follow_question_order() {
        let mut session = session(five_questions().with_round_time_secs(5));
        session.start(fixed_now()).unwrap();

        answer_and_advance(&mut session, &wrong());
        session.expire_deadline(fixed_now()).unwrap();
        answer_and_advance(&mut session, &correct());
        session.expire_deadline(fixed_now()).unwrap();
        answer_and_advance(&mut session, &correct());

        let ids: Vec<_> = session
            .choices()
            .iter()
            .map(|c| c.question_id().as_str().to_owned())
            .collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5"]);
    }

    #[test]
    fn pass_threshold_classifies_result() {
        let mut session = session(five_questions().with_pass_threshold(3));
        session.start(fixed_now()).unwrap();
        assert_eq!(session.is_passing(), Some(false));

        for option in [correct(), correct(), wrong(), correct(), wrong()] {
            answer_and_advance(&mut session, &option);
        }

        assert_eq!(session.is_passing(), Some(true));
        assert_eq!(session.outcome(), Some(SessionOutcome::Pass));
        let summary = session.summary().unwrap();
        assert_eq!(summary.correct(), 3);
        assert_eq!(summary.outcome(), SessionOutcome::Pass);
    }

    #[test]
    fn is_passing_is_none_without_threshold() {
        let session = session(five_questions());
        assert_eq!(session.is_passing(), None);
    }

    #[test]
    fn multiple_correct_options_each_score() {
        let draft = QuizDraft::new(vec![QuestionDraft::new(
            "forest",
            "Someone is breaking branches. What do you do?",
            vec![
                OptionDraft::correct("tell-adult", "Tell an adult"),
                OptionDraft::correct("stop-them", "Ask them to stop"),
                OptionDraft::wrong("join", "Join in"),
            ],
        )]);

        for (option, expected) in [("tell-adult", 1), ("stop-them", 1), ("join", 0)] {
            let mut session = session(draft.clone());
            session.start(fixed_now()).unwrap();
            answer_and_advance(&mut session, &OptionId::new(option));
            assert_eq!(session.score(), expected, "option {option}");
        }
    }

    #[test]
    fn progress_reports_counts() {
        let mut session = session(five_questions());
        session.start(fixed_now()).unwrap();
        answer_and_advance(&mut session, &correct());
        session.submit_answer(&wrong(), fixed_now()).unwrap();

        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 5,
                answered: 2,
                remaining: 3,
                score: 1,
                is_complete: false,
            }
        );
    }

    #[test]
    fn events_are_emitted_in_order() {
        let log = EventLog::new();
        let mut session = session(
            QuizDraft::new(five_questions().questions.into_iter().take(2).collect())
                .with_round_time_secs(10),
        );
        session.subscribe(Arc::new(log.clone()));

        session.start(fixed_now()).unwrap();
        answer_and_advance(&mut session, &correct());
        session.expire_deadline(fixed_now()).unwrap();
        session.reset();

        assert_eq!(
            log.kinds(),
            vec![
                "started",
                "answered",
                "advanced",
                "timed_out",
                "answered",
                "completed",
                "reset"
            ]
        );

        let events = log.snapshot();
        match &events[5] {
            SessionEvent::Completed {
                score,
                total,
                choices,
            } => {
                assert_eq!(*score, 1);
                assert_eq!(*total, 2);
                assert_eq!(choices.len(), 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn rejected_operations_emit_nothing() {
        let log = EventLog::new();
        let mut session = session(five_questions());
        session.subscribe(Arc::new(log.clone()));
        session.start(fixed_now()).unwrap();
        log.drain();

        let _ = session.submit_answer(&OptionId::new("bogus-id"), fixed_now());
        let _ = session.advance(fixed_now());
        assert!(log.is_empty());
    }
}

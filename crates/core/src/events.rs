use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::model::{ChoiceRecord, QuestionId, SessionId};

/// Lifecycle notifications emitted by `QuizSession`.
///
/// Hosts use these to drive animations and sounds; reward collaborators
/// listen for `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        session_id: SessionId,
        total: usize,
        deadline: Option<DateTime<Utc>>,
    },
    Answered {
        question_index: usize,
        choice: ChoiceRecord,
    },
    TimedOut {
        question_index: usize,
        question_id: QuestionId,
    },
    Advanced {
        question_index: usize,
        deadline: Option<DateTime<Utc>>,
    },
    Completed {
        score: usize,
        total: usize,
        choices: Vec<ChoiceRecord>,
    },
    Reset,
}

impl SessionEvent {
    /// Short stable name, handy for logs and assertions.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "started",
            SessionEvent::Answered { .. } => "answered",
            SessionEvent::TimedOut { .. } => "timed_out",
            SessionEvent::Advanced { .. } => "advanced",
            SessionEvent::Completed { .. } => "completed",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Receives session events synchronously, in emission order.
pub trait SessionObserver: Send + Sync {
    fn notify(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn notify(&self, event: &SessionEvent) {
        self(event);
    }
}

/// Observer that records every event it sees.
///
/// Clones share the same buffer, so a host can keep one handle and
/// subscribe the other.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<SessionEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SessionEvent> {
        self.guard().clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.guard().iter().map(SessionEvent::kind).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.guard())
    }
}

impl SessionObserver for EventLog {
    fn notify(&self, event: &SessionEvent) {
        self.guard().push(event.clone());
    }
}

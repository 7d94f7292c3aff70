use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use quiz_core::{Clock, Deadline};

/// Sent when an armed deadline's wall time has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineElapsed {
    pub deadline: Deadline,
}

/// Host-owned countdown that turns a session `Deadline` into a channel message.
///
/// The timer never touches the session. The host task receives
/// `DeadlineElapsed` and hands it to
/// [`QuizLoopService::expire_current`](super::QuizLoopService::expire_current),
/// so the session keeps a single owner. At most one deadline is armed at a time;
/// re-arming aborts the previous countdown.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct DeadlineTimer {
    clock: Clock,
    tx: mpsc::Sender<DeadlineElapsed>,
    armed: Option<Deadline>,
    task: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    #[must_use]
    pub fn new(clock: Clock) -> (Self, mpsc::Receiver<DeadlineElapsed>) {
        let (tx, rx) = mpsc::channel(4);
        (
            Self {
                clock,
                tx,
                armed: None,
                task: None,
            },
            rx,
        )
    }

    #[must_use]
    pub fn armed(&self) -> Option<Deadline> {
        self.armed
    }

    /// Match the timer to the session's current deadline.
    ///
    /// Call after every session transition. An unchanged deadline keeps the
    /// running countdown; `None` cancels it.
    pub fn sync(&mut self, deadline: Option<Deadline>) {
        if self.armed == deadline {
            return;
        }
        self.cancel();

        let Some(deadline) = deadline else {
            return;
        };
        let delay = self.clock.until(deadline.expires_at());
        let tx = self.tx.clone();
        debug!(
            question_index = deadline.question_index(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "arming deadline timer"
        );
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(DeadlineElapsed { deadline }).await.is_err() {
                debug!("deadline receiver dropped");
            }
        }));
        self.armed = Some(deadline);
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.armed = None;
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

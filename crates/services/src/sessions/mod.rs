mod plan;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use plan::SessionPlanner;
pub use timer::{DeadlineElapsed, DeadlineTimer};
pub use workflow::{AnswerResult, QuizLoopService};

mod choice;
mod config;
mod ids;
mod question;
mod summary;

pub use ids::{OptionId, QuestionId, SessionId};

pub use choice::ChoiceRecord;
pub use config::{ConfigError, QuizDraft, SessionConfig};
pub use question::{AnswerOption, OptionDraft, Question, QuestionDraft};
pub use summary::{SessionOutcome, SessionProgress, SessionSummary, SessionSummaryError};

#![forbid(unsafe_code)]

pub mod error;
pub mod pack;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::ServiceError;
pub use pack::{QuizPack, Topic};

pub use sessions::{
    AnswerResult, DeadlineElapsed, DeadlineTimer, QuizLoopService, SessionPlanner,
};

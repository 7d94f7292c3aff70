#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod model;
pub mod session;
pub mod time;

pub use error::SessionError;
pub use events::{EventLog, SessionEvent, SessionObserver};
pub use session::{Deadline, QuizSession, Resolution, SessionStatus};
pub use time::Clock;

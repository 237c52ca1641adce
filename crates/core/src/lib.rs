#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod navigation;
pub mod normalize;
pub mod session;
pub mod snapshot;
pub mod time;
pub mod timer;

pub use error::{IntentError, SessionError};
pub use normalize::{RawAnswer, normalize};
pub use session::{ExamSession, SessionStatus, TickOutcome};
pub use snapshot::{AnswerRecord, QuestionView, SessionProgress, SessionSnapshot, Submission};
pub use time::Clock;

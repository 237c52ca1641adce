#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::ExamError;
pub use sessions::{AttemptUpdate, ExamAttempt, ExamLoopService};

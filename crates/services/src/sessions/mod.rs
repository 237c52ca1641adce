mod service;
mod workflow;

// Public API of the exam attempt subsystem.
pub use crate::error::ExamError;
pub use service::ExamAttempt;
pub use workflow::{AttemptUpdate, ExamLoopService};

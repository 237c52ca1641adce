//! File-backed adapters: exams read from a JSON document, submissions
//! appended to a JSON-lines log.

use std::path::PathBuf;
use std::sync::Arc;

use crate::repository::{InMemoryRepository, QuestionSource, Storage, SubmissionSink};

mod exam_file;
mod submission_log;

pub use exam_file::{ExamEntry, JsonExamFile};
pub use submission_log::JsonSubmissionLog;

impl Storage {
    /// Build a `Storage` that reads exams from `exam_path` and writes
    /// submissions to `submission_path`, or keeps them in memory when no log
    /// path is given.
    #[must_use]
    pub fn json(exam_path: impl Into<PathBuf>, submission_path: Option<PathBuf>) -> Self {
        let exams: Arc<dyn QuestionSource> = Arc::new(JsonExamFile::new(exam_path));
        let submissions: Arc<dyn SubmissionSink> = match submission_path {
            Some(path) => Arc::new(JsonSubmissionLog::new(path)),
            None => Arc::new(InMemoryRepository::new()),
        };
        Self { exams, submissions }
    }
}

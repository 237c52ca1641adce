//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::{IntentError, SessionError};
use storage::repository::StorageError;

/// Errors emitted by exam attempt orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    /// The exam has no questions; do not enter a test-taking view.
    #[error("no questions available for exam")]
    Empty,
    #[error("exam attempt has not finished")]
    NotFinished,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Intent(#[from] IntentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

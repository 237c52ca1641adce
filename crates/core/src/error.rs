use thiserror::Error;

use crate::model::{OptionId, QuestionError, QuestionId, QuestionKind};
use crate::session::SessionStatus;

/// Session construction and lifecycle failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// There is nothing to take; the caller must not enter a test-taking view.
    #[error("exam has no questions")]
    EmptyQuestionSet,

    #[error("question id {question} appears more than once")]
    DuplicateQuestion { question: QuestionId },

    #[error("session cannot start from status {status}")]
    AlreadyStarted { status: SessionStatus },

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// A rejected intent. The session is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntentError {
    #[error("question {question} is {kind} and cannot take a {given} answer")]
    ShapeMismatch {
        question: QuestionId,
        kind: QuestionKind,
        given: &'static str,
    },

    #[error("question {question} has no option {option}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question {question} is frozen")]
    Frozen { question: QuestionId },

    #[error("session is {status}, not in progress")]
    NotInProgress { status: SessionStatus },

    #[error("no question at index {index} (session has {len})")]
    NoSuchQuestion { index: usize, len: usize },

    #[error("cannot navigate to index {index} (session has {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("already at the first question")]
    AtFirst,

    #[error("already at the last question")]
    AtLast,
}

impl IntentError {
    /// Stable reason code for presentation layers and logs.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            IntentError::ShapeMismatch { .. } => "shape_mismatch",
            IntentError::UnknownOption { .. } => "unknown_option",
            IntentError::Frozen { .. } => "frozen",
            IntentError::NotInProgress { .. } => "not_in_progress",
            IntentError::NoSuchQuestion { .. } => "no_such_question",
            IntentError::OutOfRange { .. } => "out_of_range",
            IntentError::AtFirst => "at_first",
            IntentError::AtLast => "at_last",
        }
    }
}

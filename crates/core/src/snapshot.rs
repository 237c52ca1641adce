use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Answer, ChoiceOption, QuestionId, QuestionKind};
use crate::session::SessionStatus;

/// Read-only render state. An owned copy, so nothing written to it reaches
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub exam_name: String,
    pub module_name: String,
    /// `None` only when the exam has no questions.
    pub current_index: Option<usize>,
    pub remaining_seconds: u64,
    pub status: SessionStatus,
    pub questions: Vec<QuestionView>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn current(&self) -> Option<&QuestionView> {
        self.current_index.and_then(|i| self.questions.get(i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    pub selected: Option<Answer>,
    pub bookmarked: bool,
    pub visited: bool,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub bookmarked: usize,
    pub visited: usize,
}

/// Final answer set handed to the submission sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub exam_name: String,
    pub module_name: String,
    /// `Submitted` or `Expired`.
    pub status: SessionStatus,
    pub answers: Vec<AnswerRecord>,
    pub elapsed_seconds: u64,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.selected.is_some()).count()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected: Option<Answer>,
    pub bookmarked: bool,
    pub correct: bool,
}

use crate::error::IntentError;
use crate::model::QuestionRecord;

/// Current-question pointer over a fixed, ordered question list.
///
/// Status gating is the session's job; the navigator only enforces bounds
/// and marks whatever becomes current as visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigator {
    current: usize,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Jump to `index`.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::OutOfRange` when `index` is not a valid position;
    /// the pointer does not move.
    pub fn go_to(
        &mut self,
        questions: &mut [QuestionRecord],
        index: usize,
    ) -> Result<usize, IntentError> {
        let len = questions.len();
        let Some(record) = questions.get_mut(index) else {
            return Err(IntentError::OutOfRange { index, len });
        };
        record.mark_visited();
        self.current = index;
        Ok(index)
    }

    /// Step forward. No wraparound.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::AtLast` when already on the last question.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self, questions: &mut [QuestionRecord]) -> Result<usize, IntentError> {
        let target = self.current.saturating_add(1);
        if target >= questions.len() {
            return Err(IntentError::AtLast);
        }
        self.go_to(questions, target)
    }

    /// Step back. No wraparound.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::AtFirst` when already on the first question.
    pub fn previous(&mut self, questions: &mut [QuestionRecord]) -> Result<usize, IntentError> {
        match self.current.checked_sub(1) {
            Some(target) => self.go_to(questions, target),
            None => Err(IntentError::AtFirst),
        }
    }
}

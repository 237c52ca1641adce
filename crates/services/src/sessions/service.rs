use std::fmt;

use exam_core::model::{AnswerValue, ExamId};
use exam_core::{
    Clock, ExamSession, IntentError, SessionProgress, SessionSnapshot, SessionStatus, Submission,
    TickOutcome,
};

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One user's attempt at an exam: the session plus the clock that drives it
/// and the ID of the persisted submission, once delivered.
///
/// Presentation code calls the intent methods directly; ticking and
/// submitting go through `ExamLoopService` so the result reaches the sink.
pub struct ExamAttempt {
    exam_id: ExamId,
    session: ExamSession,
    clock: Clock,
    submission_id: Option<i64>,
}

impl ExamAttempt {
    pub(crate) fn new(exam_id: ExamId, session: ExamSession, clock: Clock) -> Self {
        Self {
            exam_id,
            session,
            clock,
            submission_id: None,
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.status().is_terminal()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn submission_id(&self) -> Option<i64> {
        self.submission_id
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Mutable access to the clock, for driving a fixed clock in tests.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// # Errors
    ///
    /// Returns `IntentError` when the answer is rejected.
    pub fn select_answer(&mut self, index: usize, value: AnswerValue) -> Result<(), IntentError> {
        self.session.select_answer(index, value)
    }

    /// # Errors
    ///
    /// Returns `IntentError` when the bookmark cannot be toggled.
    pub fn toggle_bookmark(&mut self, index: usize) -> Result<bool, IntentError> {
        self.session.toggle_bookmark(index)
    }

    /// # Errors
    ///
    /// Returns `IntentError` when navigation is rejected.
    pub fn go_to(&mut self, index: usize) -> Result<usize, IntentError> {
        self.session.go_to(index)
    }

    /// # Errors
    ///
    /// Returns `IntentError` when navigation is rejected.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<usize, IntentError> {
        self.session.next()
    }

    /// # Errors
    ///
    /// Returns `IntentError` when navigation is rejected.
    pub fn previous(&mut self) -> Result<usize, IntentError> {
        self.session.previous()
    }

    pub(crate) fn tick(&mut self) -> TickOutcome {
        self.session.tick(&self.clock)
    }

    pub(crate) fn submit(&mut self) -> Result<Submission, IntentError> {
        self.session.submit(&self.clock)
    }

    pub(crate) fn set_submission_id(&mut self, id: i64) {
        self.submission_id = Some(id);
    }
}

impl fmt::Debug for ExamAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamAttempt")
            .field("exam_id", &self.exam_id)
            .field("status", &self.session.status())
            .field("questions_len", &self.session.questions().len())
            .field("current", &self.session.current_index())
            .field("remaining_seconds", &self.session.remaining_seconds())
            .field("submission_id", &self.submission_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamSeed, QuestionId, QuestionKind, QuestionSeed};
    use exam_core::time::fixed_clock;

    fn attempt() -> ExamAttempt {
        let seed = ExamSeed {
            exam_name: "Chemistry".into(),
            module_name: "Stoichiometry".into(),
            time_budget_seconds: 90,
            questions: (1..=2)
                .map(|i| QuestionSeed {
                    id: QuestionId::new(format!("c{i}")),
                    kind: QuestionKind::FreeResponse,
                    prompt: format!("Moles in sample {i}?"),
                    options: None,
                    accepted_answers: vec![i.to_string()],
                })
                .collect(),
        };
        let clock = fixed_clock();
        let mut session = ExamSession::new(seed).unwrap();
        session.start(&clock).unwrap();
        ExamAttempt::new(ExamId::new(3), session, clock)
    }

    #[test]
    fn intents_pass_through_to_session() {
        let mut attempt = attempt();
        attempt.select_answer(0, AnswerValue::text("1")).unwrap();
        assert!(attempt.toggle_bookmark(0).unwrap());
        assert_eq!(attempt.next(), Ok(1));
        assert_eq!(attempt.previous(), Ok(0));
        assert_eq!(attempt.go_to(1), Ok(1));

        let progress = attempt.progress();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.visited, 2);
        assert!(!attempt.is_complete());
    }

    #[test]
    fn tick_uses_attempt_clock() {
        let mut attempt = attempt();
        attempt.clock_mut().advance_secs(30);
        assert_eq!(attempt.tick(), TickOutcome::Running { remaining: 60 });
        assert_eq!(attempt.snapshot().remaining_seconds, 60);
    }

    #[test]
    fn debug_output_skips_question_bodies() {
        let rendered = format!("{:?}", attempt());
        assert!(rendered.contains("ExamAttempt"));
        assert!(!rendered.contains("Moles in sample"));
    }
}

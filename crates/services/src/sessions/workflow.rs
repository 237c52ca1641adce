use std::sync::Arc;

use exam_core::model::ExamId;
use exam_core::{ExamSession, SessionError, SessionStatus, TickOutcome};
use storage::repository::{QuestionSource, Storage, SubmissionSink};
use tracing::{info, warn};

use super::service::ExamAttempt;
use crate::Clock;
use crate::error::ExamError;

/// State of an attempt after a tick or submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptUpdate {
    pub status: SessionStatus,
    pub remaining_seconds: u64,
    /// Set once the final submission has reached the sink.
    pub submission_id: Option<i64>,
}

impl AttemptUpdate {
    fn of(attempt: &ExamAttempt) -> Self {
        Self {
            status: attempt.status(),
            remaining_seconds: attempt.session().remaining_seconds(),
            submission_id: attempt.submission_id(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Orchestrates attempt start, the countdown, and delivery of the final
/// submission.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    exams: Arc<dyn QuestionSource>,
    submissions: Arc<dyn SubmissionSink>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        exams: Arc<dyn QuestionSource>,
        submissions: Arc<dyn SubmissionSink>,
    ) -> Self {
        Self {
            clock,
            exams,
            submissions,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.exams),
            Arc::clone(&storage.submissions),
        )
    }

    /// Load an exam and start the countdown.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Empty` when the exam has no questions, and
    /// `ExamError` for storage or seed validation failures.
    pub async fn start_exam(&self, exam_id: ExamId) -> Result<ExamAttempt, ExamError> {
        let seed = self.exams.load_exam(exam_id).await?;
        let mut session = ExamSession::new(seed)?;
        match session.start(&self.clock) {
            Ok(()) => {}
            Err(SessionError::EmptyQuestionSet) => return Err(ExamError::Empty),
            Err(err) => return Err(err.into()),
        }
        info!(
            %exam_id,
            exam = session.exam_name(),
            questions = session.questions().len(),
            budget_secs = session.time_budget_seconds(),
            "exam attempt started"
        );
        Ok(ExamAttempt::new(exam_id, session, self.clock))
    }

    /// Feed one scheduler tick to the attempt. When the tick expires the
    /// session, the automatic submission is delivered to the sink.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Storage` if delivery fails; the attempt stays
    /// expired and `finalize_submission` can retry.
    pub async fn tick(&self, attempt: &mut ExamAttempt) -> Result<AttemptUpdate, ExamError> {
        if let TickOutcome::Expired(_) = attempt.tick() {
            info!(exam_id = %attempt.exam_id(), "exam time expired");
            self.finalize_submission(attempt).await?;
        }
        Ok(AttemptUpdate::of(attempt))
    }

    /// Submit on the user's request and deliver the payload.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Intent` if the attempt is not in progress, or
    /// `ExamError::Storage` if delivery fails (retry with
    /// `finalize_submission`).
    pub async fn submit(&self, attempt: &mut ExamAttempt) -> Result<AttemptUpdate, ExamError> {
        attempt.submit()?;
        self.finalize_submission(attempt).await?;
        Ok(AttemptUpdate::of(attempt))
    }

    /// Deliver the final submission if it has not reached the sink yet.
    ///
    /// Idempotent: once delivered, returns the stored ID without writing
    /// again. Useful when the first delivery failed on a transient storage
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotFinished` if the attempt has no final
    /// submission, or `ExamError::Storage` if persistence fails.
    pub async fn finalize_submission(&self, attempt: &mut ExamAttempt) -> Result<i64, ExamError> {
        if let Some(id) = attempt.submission_id() {
            return Ok(id);
        }

        let submission = attempt
            .session()
            .submission()
            .ok_or(ExamError::NotFinished)?;
        let id = self
            .submissions
            .append_submission(submission)
            .await
            .inspect_err(|err| {
                warn!(exam_id = %attempt.exam_id(), %err, "submission delivery failed");
            })?;
        info!(
            exam_id = %attempt.exam_id(),
            submission_id = id,
            status = %submission.status,
            correct = submission.correct_count(),
            total = submission.answers.len(),
            "submission delivered"
        );
        attempt.set_submission_id(id);
        Ok(id)
    }
}

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntentError, SessionError};
use crate::model::{AnswerValue, ExamSeed, QuestionRecord};
use crate::navigation::Navigator;
use crate::snapshot::{AnswerRecord, QuestionView, SessionProgress, SessionSnapshot, Submission};
use crate::time::Clock;
use crate::timer::{CountdownTimer, TimerState, TimerTick};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
    Expired,
    /// `start` was called on an exam without questions. Terminal.
    Empty,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Expired | Self::Empty)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Submitted => "submitted",
            Self::Expired => "expired",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of feeding one scheduler tick to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; the tick was absorbed.
    Ignored,
    Running { remaining: u64 },
    /// Time ran out on this tick and the session was submitted automatically.
    Expired(Submission),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at an ordered set of questions.
///
/// All mutation goes through the intent methods, which only act while the
/// session is `InProgress`. Rejected intents return an `IntentError` and leave
/// the session untouched.
#[derive(Debug, Clone)]
pub struct ExamSession {
    exam_name: String,
    module_name: String,
    time_budget: u64,
    questions: Vec<QuestionRecord>,
    navigator: Navigator,
    timer: CountdownTimer,
    status: SessionStatus,
    submission: Option<Submission>,
}

impl ExamSession {
    /// Build a session from seed data. An empty question list is accepted
    /// here and reported by `start`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Question` for invalid question seeds and
    /// `SessionError::DuplicateQuestion` when two questions share an id.
    pub fn new(seed: ExamSeed) -> Result<Self, SessionError> {
        let ExamSeed {
            exam_name,
            module_name,
            time_budget_seconds,
            questions,
        } = seed;

        let mut seen = HashSet::with_capacity(questions.len());
        let mut records = Vec::with_capacity(questions.len());
        for question in questions {
            if !seen.insert(question.id.clone()) {
                return Err(SessionError::DuplicateQuestion {
                    question: question.id,
                });
            }
            records.push(QuestionRecord::new(question)?);
        }

        Ok(Self {
            exam_name,
            module_name,
            time_budget: time_budget_seconds,
            questions: records,
            navigator: Navigator::new(),
            timer: CountdownTimer::new(),
            status: SessionStatus::NotStarted,
            submission: None,
        })
    }

    #[must_use]
    pub fn exam_name(&self) -> &str {
        &self.exam_name
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    #[must_use]
    pub fn time_budget_seconds(&self) -> u64 {
        self.time_budget
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    /// `None` when the exam has no questions.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        (!self.questions.is_empty()).then(|| self.navigator.current())
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    /// Full budget before the session starts, otherwise the value settled by
    /// the most recent tick or by the final stop.
    #[must_use]
    pub fn remaining_seconds(&self) -> u64 {
        match self.timer.state() {
            TimerState::Idle => self.time_budget,
            _ => self.timer.remaining(),
        }
    }

    /// The finalized payload, once the session is `Submitted` or `Expired`.
    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.questions.iter().filter(|q| q.is_answered()).count(),
            bookmarked: self.questions.iter().filter(|q| q.is_bookmarked()).count(),
            visited: self.questions.iter().filter(|q| q.is_visited()).count(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exam_name: self.exam_name.clone(),
            module_name: self.module_name.clone(),
            current_index: self.current_index(),
            remaining_seconds: self.remaining_seconds(),
            status: self.status,
            questions: self
                .questions
                .iter()
                .map(|q| QuestionView {
                    id: q.id().clone(),
                    kind: q.kind(),
                    prompt: q.prompt().to_owned(),
                    options: q.options().map(<[_]>::to_vec),
                    selected: q.selected().cloned(),
                    bookmarked: q.is_bookmarked(),
                    visited: q.is_visited(),
                })
                .collect(),
        }
    }

    //
    // ─── INTENTS ───────────────────────────────────────────────────────────────
    //

    /// Start the countdown and show the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is
    /// `NotStarted`. Returns `SessionError::EmptyQuestionSet` when there is
    /// nothing to take; the session then stays in the terminal `Empty` status
    /// and no timer runs.
    pub fn start(&mut self, clock: &Clock) -> Result<(), SessionError> {
        if self.status != SessionStatus::NotStarted {
            return Err(SessionError::AlreadyStarted {
                status: self.status,
            });
        }
        if self.questions.is_empty() {
            self.status = SessionStatus::Empty;
            debug!(exam = %self.exam_name, "session has no questions");
            return Err(SessionError::EmptyQuestionSet);
        }

        self.navigator
            .go_to(&mut self.questions, 0)
            .map_err(|_| SessionError::EmptyQuestionSet)?;
        self.timer.start(self.time_budget, clock.now());
        self.status = SessionStatus::InProgress;
        debug!(
            exam = %self.exam_name,
            questions = self.questions.len(),
            budget_secs = self.time_budget,
            "session started"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `IntentError` if the session is not in progress, `index` is not
    /// a question, or the value does not fit the question.
    pub fn select_answer(&mut self, index: usize, value: AnswerValue) -> Result<(), IntentError> {
        let result = self
            .record_mut(index)
            .and_then(|record| record.select(value));
        log_rejection("select_answer", result)
    }

    /// Flip the bookmark on question `index` and return the new flag.
    ///
    /// # Errors
    ///
    /// Returns `IntentError` if the session is not in progress or `index` is
    /// not a question.
    pub fn toggle_bookmark(&mut self, index: usize) -> Result<bool, IntentError> {
        let result = self
            .record_mut(index)
            .and_then(QuestionRecord::toggle_bookmark);
        log_rejection("toggle_bookmark", result)
    }

    /// # Errors
    ///
    /// Returns `IntentError` if the session is not in progress or `index` is
    /// out of range.
    pub fn go_to(&mut self, index: usize) -> Result<usize, IntentError> {
        let result = self
            .ensure_in_progress()
            .and_then(|()| self.navigator.go_to(&mut self.questions, index));
        log_rejection("go_to", result)
    }

    /// # Errors
    ///
    /// Returns `IntentError` if the session is not in progress or already on
    /// the last question.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<usize, IntentError> {
        let result = self
            .ensure_in_progress()
            .and_then(|()| self.navigator.next(&mut self.questions));
        log_rejection("next", result)
    }

    /// # Errors
    ///
    /// Returns `IntentError` if the session is not in progress or already on
    /// the first question.
    pub fn previous(&mut self) -> Result<usize, IntentError> {
        let result = self
            .ensure_in_progress()
            .and_then(|()| self.navigator.previous(&mut self.questions));
        log_rejection("previous", result)
    }

    /// Reconcile the countdown with `clock`. Ticks that arrive after the
    /// session has ended are absorbed.
    pub fn tick(&mut self, clock: &Clock) -> TickOutcome {
        if self.status != SessionStatus::InProgress {
            return TickOutcome::Ignored;
        }
        match self.timer.tick(clock.now()) {
            TimerTick::Inactive => TickOutcome::Ignored,
            TimerTick::Running { remaining } => TickOutcome::Running { remaining },
            TimerTick::Expired => {
                TickOutcome::Expired(self.finalize(SessionStatus::Expired, clock))
            }
        }
    }

    /// End the session on the user's request.
    ///
    /// The timer is reconciled with `clock` first. If the budget ran out
    /// before any tick noticed, the session ends as `Expired`.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::NotInProgress` outside `InProgress`; nothing
    /// changes in that case.
    pub fn submit(&mut self, clock: &Clock) -> Result<Submission, IntentError> {
        let result = self.ensure_in_progress().map(|()| {
            let status = match self.timer.tick(clock.now()) {
                TimerTick::Expired => SessionStatus::Expired,
                TimerTick::Inactive | TimerTick::Running { .. } => SessionStatus::Submitted,
            };
            self.finalize(status, clock)
        });
        log_rejection("submit", result)
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    /// Single commit path for both explicit submission and expiry.
    fn finalize(&mut self, status: SessionStatus, clock: &Clock) -> Submission {
        let now = clock.now();
        self.timer.cancel(now);
        self.status = status;
        for record in &mut self.questions {
            record.freeze();
        }

        let submission = Submission {
            exam_name: self.exam_name.clone(),
            module_name: self.module_name.clone(),
            status,
            answers: self
                .questions
                .iter()
                .map(|q| AnswerRecord {
                    question_id: q.id().clone(),
                    selected: q.selected().cloned(),
                    bookmarked: q.is_bookmarked(),
                    correct: q.is_correct(),
                })
                .collect(),
            elapsed_seconds: self.timer.elapsed_secs(now),
            submitted_at: clock.wall_now(),
        };
        debug!(
            exam = %self.exam_name,
            %status,
            answered = submission.answered_count(),
            elapsed_secs = submission.elapsed_seconds,
            "session finalized"
        );
        self.submission = Some(submission.clone());
        submission
    }

    fn ensure_in_progress(&self) -> Result<(), IntentError> {
        if self.status == SessionStatus::InProgress {
            Ok(())
        } else {
            Err(IntentError::NotInProgress {
                status: self.status,
            })
        }
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut QuestionRecord, IntentError> {
        self.ensure_in_progress()?;
        let len = self.questions.len();
        self.questions
            .get_mut(index)
            .ok_or(IntentError::NoSuchQuestion { index, len })
    }
}

fn log_rejection<T>(
    intent: &'static str,
    result: Result<T, IntentError>,
) -> Result<T, IntentError> {
    result.inspect_err(|err| debug!(intent, reason = err.reason(), %err, "intent rejected"))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, ChoiceOption, OptionId, QuestionId, QuestionKind, QuestionSeed};
    use crate::time::{fixed_clock, fixed_now};

    fn single_choice(id: &str) -> QuestionSeed {
        QuestionSeed {
            id: QuestionId::new(id),
            kind: QuestionKind::SingleChoice,
            prompt: format!("Prompt for {id}"),
            options: Some(vec![
                ChoiceOption::new("optA", "A"),
                ChoiceOption::new("optB", "B"),
            ]),
            accepted_answers: vec!["optA".into()],
        }
    }

    fn exam(questions: Vec<QuestionSeed>, budget: u64) -> ExamSeed {
        ExamSeed {
            exam_name: "SAT Practice".into(),
            module_name: "Math 1".into(),
            time_budget_seconds: budget,
            questions,
        }
    }

    fn three_question_session() -> ExamSession {
        ExamSession::new(exam(
            vec![single_choice("q0"), single_choice("q1"), single_choice("q2")],
            10,
        ))
        .unwrap()
    }

    #[test]
    fn start_shows_first_question() {
        let clock = fixed_clock();
        let mut session = three_question_session();
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.remaining_seconds(), 10);

        session.start(&clock).unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.remaining_seconds(), 10);
        assert!(session.questions()[0].is_visited());
        assert!(!session.questions()[1].is_visited());
    }

    #[test]
    fn start_twice_is_rejected() {
        let clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        let err = session.start(&clock).unwrap_err();
        assert_eq!(
            err,
            SessionError::AlreadyStarted {
                status: SessionStatus::InProgress
            }
        );
    }

    #[test]
    fn empty_exam_does_not_start() {
        let clock = fixed_clock();
        let mut session = ExamSession::new(exam(Vec::new(), 60)).unwrap();
        assert_eq!(session.start(&clock), Err(SessionError::EmptyQuestionSet));
        assert_eq!(session.status(), SessionStatus::Empty);
        assert!(session.status().is_terminal());
        assert_eq!(session.current_index(), None);
        assert_eq!(session.tick(&clock), TickOutcome::Ignored);
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let err = ExamSession::new(exam(vec![single_choice("q"), single_choice("q")], 5))
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateQuestion { .. }));
    }

    #[test]
    fn invalid_question_seed_is_rejected() {
        let mut bad = single_choice("q");
        bad.accepted_answers.clear();
        let err = ExamSession::new(exam(vec![bad], 5)).unwrap_err();
        assert!(matches!(err, SessionError::Question(_)));
    }

    #[test]
    fn intents_before_start_are_rejected() {
        let mut session = three_question_session();
        let err = session
            .select_answer(0, AnswerValue::option("optA"))
            .unwrap_err();
        assert_eq!(err.reason(), "not_in_progress");
        assert!(session.next().is_err());
        assert!(session.toggle_bookmark(0).is_err());
        assert!(session.submit(&fixed_clock()).is_err());
        assert_eq!(session.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn expiry_scenario_submits_recorded_answers() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();

        session.select_answer(0, AnswerValue::option("optA")).unwrap();
        assert_eq!(
            session.questions()[0].selected(),
            Some(&Answer::Single(OptionId::from("optA")))
        );
        assert_eq!(session.next(), Ok(1));

        let mut expired = None;
        for _ in 0..10 {
            clock.advance_secs(1);
            if let TickOutcome::Expired(submission) = session.tick(&clock) {
                expired = Some(submission);
            }
        }

        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.status(), SessionStatus::Expired);
        let submission = expired.expect("expiry should submit");
        assert_eq!(submission.status, SessionStatus::Expired);
        assert_eq!(submission.elapsed_seconds, 10);
        assert_eq!(submission.answers.len(), 3);
        assert!(submission.answers[0].selected.is_some());
        assert!(submission.answers[0].correct);
        assert!(submission.answers[1].selected.is_none());
        assert!(submission.answers[2].selected.is_none());
        assert_eq!(session.submission(), Some(&submission));
    }

    #[test]
    fn remaining_is_monotonic_and_non_negative() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();

        let mut last = session.remaining_seconds();
        for step in [0, 1, 3, 0, 2, 7, 5] {
            clock.advance_secs(step);
            session.tick(&clock);
            let now = session.remaining_seconds();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);
        assert_eq!(session.status(), SessionStatus::Expired);
    }

    #[test]
    fn expiry_fires_once() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        clock.advance_secs(30);
        assert!(matches!(session.tick(&clock), TickOutcome::Expired(_)));
        clock.advance_secs(1);
        assert_eq!(session.tick(&clock), TickOutcome::Ignored);
    }

    #[test]
    fn submit_freezes_everything() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        session.toggle_bookmark(2).unwrap();
        clock.advance_secs(4);

        let submission = session.submit(&clock).unwrap();
        assert_eq!(submission.status, SessionStatus::Submitted);
        assert_eq!(submission.elapsed_seconds, 4);
        assert_eq!(submission.submitted_at, fixed_now() + chrono::Duration::seconds(4));
        assert!(submission.answers[2].bookmarked);

        let before = session.snapshot();
        assert!(session.select_answer(1, AnswerValue::option("optB")).is_err());
        assert!(session.toggle_bookmark(0).is_err());
        assert!(session.go_to(2).is_err());
        assert!(session.next().is_err());
        assert!(session.previous().is_err());
        assert!(session.submit(&clock).is_err());
        clock.advance_secs(100);
        assert_eq!(session.tick(&clock), TickOutcome::Ignored);
        assert_eq!(session.snapshot(), before);
        assert!(session.questions().iter().all(QuestionRecord::is_frozen));
    }

    #[test]
    fn late_submit_ends_as_expired() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        session.select_answer(0, AnswerValue::option("optA")).unwrap();
        clock.advance_secs(15);

        let submission = session.submit(&clock).unwrap();
        assert_eq!(submission.status, SessionStatus::Expired);
        assert_eq!(submission.elapsed_seconds, 10);
        assert_eq!(session.status(), SessionStatus::Expired);
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.snapshot().remaining_seconds, 0);
        assert_eq!(session.tick(&clock), TickOutcome::Ignored);
    }

    #[test]
    fn submit_reports_remaining_at_submission_time() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        clock.advance_secs(1);
        session.tick(&clock);
        clock.advance_secs(5);

        let submission = session.submit(&clock).unwrap();
        assert_eq!(submission.status, SessionStatus::Submitted);
        assert_eq!(submission.elapsed_seconds, 6);
        assert_eq!(session.snapshot().remaining_seconds, 4);
    }

    #[test]
    fn expired_session_rejects_every_intent() {
        let mut clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        session.select_answer(0, AnswerValue::option("optA")).unwrap();
        session.go_to(1).unwrap();
        clock.advance_secs(10);
        assert!(matches!(session.tick(&clock), TickOutcome::Expired(_)));

        let before = session.snapshot();
        let expected = IntentError::NotInProgress {
            status: SessionStatus::Expired,
        };
        assert_eq!(
            session.select_answer(0, AnswerValue::option("optB")),
            Err(expected.clone())
        );
        assert_eq!(
            session.select_answer(2, AnswerValue::option("optA")),
            Err(expected.clone())
        );
        assert_eq!(session.toggle_bookmark(1), Err(expected.clone()));
        assert_eq!(session.go_to(2), Err(expected.clone()));
        assert_eq!(session.next(), Err(expected.clone()));
        assert_eq!(session.previous(), Err(expected.clone()));
        assert_eq!(session.submit(&clock).map(|_| ()), Err(expected));

        assert_eq!(session.snapshot(), before);
        assert_eq!(session.current_index(), Some(1));
        assert!(session.questions().iter().all(QuestionRecord::is_frozen));
        assert_eq!(
            session.submission().map(|s| s.status),
            Some(SessionStatus::Expired)
        );
    }

    #[test]
    fn out_of_range_navigation_keeps_position() {
        let clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        session.go_to(2).unwrap();

        let err = session.go_to(3).unwrap_err();
        assert_eq!(err, IntentError::OutOfRange { index: 3, len: 3 });
        assert_eq!(session.current_index(), Some(2));
        assert_eq!(session.next(), Err(IntentError::AtLast));
        assert_eq!(session.current_index(), Some(2));
    }

    #[test]
    fn select_on_missing_question_is_rejected() {
        let clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        let err = session
            .select_answer(9, AnswerValue::option("optA"))
            .unwrap_err();
        assert_eq!(err, IntentError::NoSuchQuestion { index: 9, len: 3 });
    }

    #[test]
    fn snapshot_and_progress_reflect_state() {
        let clock = fixed_clock();
        let mut session = three_question_session();
        session.start(&clock).unwrap();
        session.select_answer(1, AnswerValue::option("optB")).unwrap();
        session.toggle_bookmark(1).unwrap();
        session.go_to(1).unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.exam_name, "SAT Practice");
        assert_eq!(snap.current_index, Some(1));
        assert_eq!(snap.status, SessionStatus::InProgress);
        let current = snap.current().unwrap();
        assert_eq!(current.id, QuestionId::new("q1"));
        assert!(current.bookmarked);
        assert!(current.visited);
        assert_eq!(current.options.as_ref().map(Vec::len), Some(2));

        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.bookmarked, 1);
        assert_eq!(progress.visited, 2);
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::IntentError;
use crate::model::ids::{OptionId, QuestionId};
use crate::normalize::normalize;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Seed data that cannot form a valid question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {question} is {kind} but has no options")]
    MissingOptions { question: QuestionId, kind: QuestionKind },

    #[error("question {question} is free-response but has options")]
    UnexpectedOptions { question: QuestionId },

    #[error("question {question} lists option {option} more than once")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question {question} has no accepted answers")]
    NoAcceptedAnswers { question: QuestionId },

    #[error("question {question} accepts unknown option {option}")]
    UnknownAcceptedOption {
        question: QuestionId,
        option: String,
    },
}

//
// ─── KIND & OPTIONS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultiSelect,
    FreeResponse,
}

impl QuestionKind {
    /// True for kinds answered by picking options.
    #[must_use]
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiSelect)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleChoice => "single-choice",
            Self::MultiSelect => "multi-select",
            Self::FreeResponse => "free-response",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: OptionId,
    pub label: String,
}

impl ChoiceOption {
    #[must_use]
    pub fn new(id: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Recorded answer. The variant always matches the owning question's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Single(OptionId),
    Multiple(BTreeSet<OptionId>),
    Text(String),
}

/// Value supplied with a select intent.
///
/// `Option` replaces a single-choice answer or toggles one multi-select
/// option; `Options` replaces a multi-select answer wholesale; `Text`
/// replaces a free-response answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Option(OptionId),
    Options(BTreeSet<OptionId>),
    Text(String),
}

impl AnswerValue {
    #[must_use]
    pub fn option(id: impl Into<OptionId>) -> Self {
        Self::Option(id.into())
    }

    #[must_use]
    pub fn options<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OptionId>,
    {
        Self::Options(ids.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Option(_) => "option",
            Self::Options(_) => "option set",
            Self::Text(_) => "text",
        }
    }
}

//
// ─── SEED ──────────────────────────────────────────────────────────────────────
//

/// Question data as supplied by a question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSeed {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    pub accepted_answers: Vec<String>,
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One question plus the user's state for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    options: Option<Vec<ChoiceOption>>,
    accepted: BTreeSet<String>,
    selected: Option<Answer>,
    bookmarked: bool,
    visited: bool,
    frozen: bool,
}

impl QuestionRecord {
    /// Validate seed data and build an unanswered record.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if options are missing for a choice kind,
    /// present for free-response, duplicated, or if the accepted answers are
    /// empty or reference options that do not exist.
    pub fn new(seed: QuestionSeed) -> Result<Self, QuestionError> {
        let QuestionSeed {
            id,
            kind,
            prompt,
            options,
            accepted_answers,
        } = seed;

        match (&options, kind.is_choice()) {
            (None, true) => return Err(QuestionError::MissingOptions { question: id, kind }),
            (Some(opts), true) if opts.is_empty() => {
                return Err(QuestionError::MissingOptions { question: id, kind });
            }
            (Some(_), false) => return Err(QuestionError::UnexpectedOptions { question: id }),
            _ => {}
        }

        if accepted_answers.is_empty() {
            return Err(QuestionError::NoAcceptedAnswers { question: id });
        }

        if let Some(opts) = &options {
            let mut seen = BTreeSet::new();
            for opt in opts {
                if !seen.insert(opt.id.as_str()) {
                    return Err(QuestionError::DuplicateOption {
                        question: id,
                        option: opt.id.clone(),
                    });
                }
            }
            if let Some(unknown) = accepted_answers
                .iter()
                .find(|answer| !seen.contains(answer.as_str()))
            {
                return Err(QuestionError::UnknownAcceptedOption {
                    question: id.clone(),
                    option: unknown.clone(),
                });
            }
        }

        Ok(Self {
            id,
            kind,
            prompt,
            options,
            accepted: accepted_answers.into_iter().collect(),
            selected: None,
            bookmarked: false,
            visited: false,
            frozen: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in display order; `None` for free-response.
    #[must_use]
    pub fn options(&self) -> Option<&[ChoiceOption]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn accepted_answers(&self) -> &BTreeSet<String> {
        &self.accepted
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Answer> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked
    }

    #[must_use]
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Apply a select intent according to this question's kind.
    ///
    /// Clearing the last multi-select option or entering empty text leaves the
    /// question unanswered.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::Frozen` once the record is frozen,
    /// `IntentError::ShapeMismatch` if `value` does not fit the kind, and
    /// `IntentError::UnknownOption` for option ids this question does not
    /// offer. The record is unchanged on error.
    pub fn select(&mut self, value: AnswerValue) -> Result<(), IntentError> {
        self.ensure_mutable()?;

        let next = match (self.kind, value) {
            (QuestionKind::SingleChoice, AnswerValue::Option(id)) => {
                self.ensure_option(&id)?;
                Some(Answer::Single(id))
            }
            (QuestionKind::MultiSelect, AnswerValue::Option(id)) => {
                self.ensure_option(&id)?;
                let mut set = match self.selected.take() {
                    Some(Answer::Multiple(set)) => set,
                    _ => BTreeSet::new(),
                };
                if !set.remove(&id) {
                    set.insert(id);
                }
                (!set.is_empty()).then_some(Answer::Multiple(set))
            }
            (QuestionKind::MultiSelect, AnswerValue::Options(ids)) => {
                for id in &ids {
                    self.ensure_option(id)?;
                }
                (!ids.is_empty()).then_some(Answer::Multiple(ids))
            }
            (QuestionKind::FreeResponse, AnswerValue::Text(text)) => {
                (!text.is_empty()).then_some(Answer::Text(text))
            }
            (kind, value) => {
                return Err(IntentError::ShapeMismatch {
                    question: self.id.clone(),
                    kind,
                    given: value.shape(),
                });
            }
        };

        self.selected = next;
        Ok(())
    }

    /// Flip the bookmark flag.
    ///
    /// # Errors
    ///
    /// Returns `IntentError::Frozen` once the record is frozen.
    pub fn toggle_bookmark(&mut self) -> Result<bool, IntentError> {
        self.ensure_mutable()?;
        self.bookmarked = !self.bookmarked;
        Ok(self.bookmarked)
    }

    pub fn mark_visited(&mut self) {
        self.visited = true;
    }

    /// Stop accepting answer and bookmark changes.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Compare the current answer against the accepted answers.
    ///
    /// Multi-select requires the exact accepted set. Free-response compares
    /// normalized forms; an answer that normalizes to nothing never matches.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        match &self.selected {
            None => false,
            Some(Answer::Single(id)) => self.accepted.contains(id.as_str()),
            Some(Answer::Multiple(ids)) => {
                ids.len() == self.accepted.len()
                    && ids.iter().all(|id| self.accepted.contains(id.as_str()))
            }
            Some(Answer::Text(text)) => {
                let given = normalize(text);
                !given.is_empty()
                    && self
                        .accepted
                        .iter()
                        .any(|accepted| normalize(accepted) == given)
            }
        }
    }

    fn ensure_mutable(&self) -> Result<(), IntentError> {
        if self.frozen {
            return Err(IntentError::Frozen {
                question: self.id.clone(),
            });
        }
        Ok(())
    }

    fn ensure_option(&self, id: &OptionId) -> Result<(), IntentError> {
        let known = self
            .options
            .as_deref()
            .is_some_and(|opts| opts.iter().any(|opt| &opt.id == id));
        if known {
            Ok(())
        } else {
            Err(IntentError::UnknownOption {
                question: self.id.clone(),
                option: id.clone(),
            })
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_seed(kind: QuestionKind, accepted: &[&str]) -> QuestionSeed {
        QuestionSeed {
            id: QuestionId::new("q1"),
            kind,
            prompt: "Pick".into(),
            options: Some(vec![
                ChoiceOption::new("A", "Alpha"),
                ChoiceOption::new("B", "Beta"),
                ChoiceOption::new("C", "Gamma"),
            ]),
            accepted_answers: accepted.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn free_seed(accepted: &[&str]) -> QuestionSeed {
        QuestionSeed {
            id: QuestionId::new("frq"),
            kind: QuestionKind::FreeResponse,
            prompt: "List the roots".into(),
            options: None,
            accepted_answers: accepted.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn choice_kind_requires_options() {
        let mut seed = choice_seed(QuestionKind::SingleChoice, &["A"]);
        seed.options = None;
        let err = QuestionRecord::new(seed).unwrap_err();
        assert!(matches!(err, QuestionError::MissingOptions { .. }));
    }

    #[test]
    fn free_response_rejects_options() {
        let mut seed = free_seed(&["1"]);
        seed.options = Some(vec![ChoiceOption::new("A", "Alpha")]);
        let err = QuestionRecord::new(seed).unwrap_err();
        assert!(matches!(err, QuestionError::UnexpectedOptions { .. }));
    }

    #[test]
    fn accepted_answers_must_be_present_and_known() {
        let err = QuestionRecord::new(free_seed(&[])).unwrap_err();
        assert!(matches!(err, QuestionError::NoAcceptedAnswers { .. }));

        let err = QuestionRecord::new(choice_seed(QuestionKind::SingleChoice, &["Z"])).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::UnknownAcceptedOption { option, .. } if option == "Z"
        ));
    }

    #[test]
    fn duplicate_option_ids_are_rejected() {
        let mut seed = choice_seed(QuestionKind::SingleChoice, &["A"]);
        if let Some(opts) = seed.options.as_mut() {
            opts.push(ChoiceOption::new("A", "Again"));
        }
        let err = QuestionRecord::new(seed).unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn single_choice_replaces_selection() {
        let mut q = QuestionRecord::new(choice_seed(QuestionKind::SingleChoice, &["B"])).unwrap();
        q.select(AnswerValue::option("A")).unwrap();
        assert!(!q.is_correct());
        q.select(AnswerValue::option("B")).unwrap();
        assert_eq!(q.selected(), Some(&Answer::Single(OptionId::from("B"))));
        assert!(q.is_correct());
    }

    #[test]
    fn multi_select_set_then_toggle() {
        let mut q =
            QuestionRecord::new(choice_seed(QuestionKind::MultiSelect, &["A", "C"])).unwrap();

        q.select(AnswerValue::options(["A"])).unwrap();
        assert!(!q.is_correct());

        q.select(AnswerValue::options(["A", "C"])).unwrap();
        assert!(q.is_correct());

        q.select(AnswerValue::option("A")).unwrap();
        assert!(!q.is_correct());
        assert_eq!(
            q.selected(),
            Some(&Answer::Multiple(BTreeSet::from([OptionId::from("C")])))
        );

        q.select(AnswerValue::option("C")).unwrap();
        assert!(!q.is_answered());
    }

    #[test]
    fn shape_mismatch_leaves_record_unchanged() {
        let mut q = QuestionRecord::new(choice_seed(QuestionKind::SingleChoice, &["A"])).unwrap();
        q.select(AnswerValue::option("A")).unwrap();
        let before = q.clone();

        let err = q.select(AnswerValue::text("A")).unwrap_err();
        assert!(matches!(
            err,
            IntentError::ShapeMismatch {
                kind: QuestionKind::SingleChoice,
                given: "text",
                ..
            }
        ));
        let err = q.select(AnswerValue::options(["A"])).unwrap_err();
        assert!(matches!(err, IntentError::ShapeMismatch { .. }));
        assert_eq!(q, before);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut q = QuestionRecord::new(choice_seed(QuestionKind::MultiSelect, &["A"])).unwrap();
        q.select(AnswerValue::option("A")).unwrap();
        let err = q.select(AnswerValue::options(["A", "Q"])).unwrap_err();
        assert!(matches!(err, IntentError::UnknownOption { .. }));
        assert!(q.is_answered());
    }

    #[test]
    fn free_response_compares_normalized() {
        let mut q = QuestionRecord::new(free_seed(&["1,2,3"])).unwrap();
        q.select(AnswerValue::text("3, 1, 2")).unwrap();
        assert!(q.is_correct());

        q.select(AnswerValue::text("3, 1")).unwrap();
        assert!(!q.is_correct());
    }

    #[test]
    fn non_numeric_free_response_never_matches() {
        let mut q = QuestionRecord::new(free_seed(&["Paris"])).unwrap();
        q.select(AnswerValue::text("Paris")).unwrap();
        assert!(!q.is_correct());
    }

    #[test]
    fn bookmark_is_independent_of_answer() {
        let mut q = QuestionRecord::new(free_seed(&["4"])).unwrap();
        assert!(q.toggle_bookmark().unwrap());
        assert!(!q.is_answered());
        q.select(AnswerValue::text("4")).unwrap();
        assert!(!q.toggle_bookmark().unwrap());
        assert!(q.is_correct());
    }

    #[test]
    fn frozen_record_rejects_mutation() {
        let mut q = QuestionRecord::new(free_seed(&["4"])).unwrap();
        q.mark_visited();
        q.mark_visited();
        q.freeze();
        assert!(matches!(
            q.select(AnswerValue::text("4")),
            Err(IntentError::Frozen { .. })
        ));
        assert!(q.toggle_bookmark().is_err());
        assert!(q.is_visited());
        assert!(!q.is_answered());
        assert!(!q.is_bookmarked());
    }

    #[test]
    fn seed_deserializes_from_json() {
        let json = r#"{
            "id": "q9",
            "kind": "multi-select",
            "prompt": "Which are prime?",
            "options": [{"id": "2", "label": "two"}, {"id": "4", "label": "four"}],
            "accepted_answers": ["2"]
        }"#;
        let seed: QuestionSeed = serde_json::from_str(json).unwrap();
        assert_eq!(seed.kind, QuestionKind::MultiSelect);
        assert!(QuestionRecord::new(seed).is_ok());
    }
}

use async_trait::async_trait;
use exam_core::Submission;
use exam_core::model::{ExamId, ExamSeed};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Supplies seed data for an attempt: questions plus the time budget.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the exam with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn load_exam(&self, id: ExamId) -> Result<ExamSeed, StorageError>;
}

/// Receives the final payload of every finished attempt.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Persist a submission and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be stored.
    async fn append_submission(&self, submission: &Submission) -> Result<i64, StorageError>;

    /// Fetch a submission by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_submission(&self, id: i64) -> Result<Submission, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exams: Arc<Mutex<HashMap<ExamId, ExamSeed>>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace an exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_exam(&self, id: ExamId, seed: ExamSeed) -> Result<(), StorageError> {
        let mut guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, seed);
        Ok(())
    }

    /// Number of stored submissions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn submission_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .submissions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn load_exam(&self, id: ExamId) -> Result<ExamSeed, StorageError> {
        let guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SubmissionSink for InMemoryRepository {
    async fn append_submission(&self, submission: &Submission) -> Result<i64, StorageError> {
        let mut guard = self
            .submissions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(submission.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)
    }

    async fn get_submission(&self, id: i64) -> Result<Submission, StorageError> {
        let guard = self
            .submissions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| guard.get(idx))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Aggregates the question source and submission sink behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exams: Arc<dyn QuestionSource>,
    pub submissions: Arc<dyn SubmissionSink>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let exams: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionSink> = Arc::new(repo);
        Self { exams, submissions }
    }
}

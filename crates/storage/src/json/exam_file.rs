use std::path::PathBuf;

use async_trait::async_trait;
use exam_core::model::{ExamId, ExamSeed};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::repository::{QuestionSource, StorageError};

fn default_exam_id() -> ExamId {
    ExamId::new(1)
}

/// One exam in a JSON exam document. `id` defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamEntry {
    #[serde(default = "default_exam_id")]
    pub id: ExamId,
    #[serde(flatten)]
    pub seed: ExamSeed,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExamDocument {
    Many(Vec<ExamEntry>),
    One(ExamEntry),
}

impl ExamDocument {
    fn into_entries(self) -> Vec<ExamEntry> {
        match self {
            ExamDocument::Many(entries) => entries,
            ExamDocument::One(entry) => vec![entry],
        }
    }
}

/// Question source reading a JSON document holding one exam object or an
/// array of them. The file is re-read on every load.
#[derive(Debug, Clone)]
pub struct JsonExamFile {
    path: PathBuf,
}

impl JsonExamFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse every exam in the document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file cannot be read and
    /// `StorageError::Serialization` if it is not a valid exam document.
    pub async fn load_all(&self) -> Result<Vec<ExamEntry>, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let document: ExamDocument = serde_json::from_str(&raw)?;
        let entries = document.into_entries();
        debug!(path = %self.path.display(), exams = entries.len(), "loaded exam document");
        Ok(entries)
    }
}

#[async_trait]
impl QuestionSource for JsonExamFile {
    async fn load_exam(&self, id: ExamId) -> Result<ExamSeed, StorageError> {
        self.load_all()
            .await?
            .into_iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.seed)
            .ok_or(StorageError::NotFound)
    }
}

use std::path::PathBuf;

use async_trait::async_trait;
use exam_core::Submission;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::repository::{StorageError, SubmissionSink};

/// Submission sink appending one JSON object per line. The ID of a
/// submission is its 1-based line number.
#[derive(Debug)]
pub struct JsonSubmissionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSubmissionLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_raw(&self) -> Result<String, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        Ok(records(&self.read_raw().await?).map(str::to_owned).collect())
    }
}

fn records(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().filter(|line| !line.trim().is_empty())
}

#[async_trait]
impl SubmissionSink for JsonSubmissionLog {
    async fn append_submission(&self, submission: &Submission) -> Result<i64, StorageError> {
        let _guard = self.write_lock.lock().await;
        // Counting means rereading the whole log on each append.
        let raw = self.read_raw().await?;
        let existing = records(&raw).count();

        let mut line = String::new();
        if !raw.is_empty() && !raw.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(submission)?);
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        i64::try_from(existing + 1).map_err(|_| StorageError::Conflict)
    }

    async fn get_submission(&self, id: i64) -> Result<Submission, StorageError> {
        let index = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .ok_or(StorageError::NotFound)?;
        let lines = self.read_lines().await?;
        let line = lines.get(index).ok_or(StorageError::NotFound)?;
        Ok(serde_json::from_str(line)?)
    }
}

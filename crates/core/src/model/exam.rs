use serde::{Deserialize, Serialize};

use crate::model::QuestionSeed;

/// Everything a question source supplies for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSeed {
    #[serde(default)]
    pub exam_name: String,
    #[serde(default)]
    pub module_name: String,
    pub time_budget_seconds: u64,
    pub questions: Vec<QuestionSeed>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authored assessment. Owned by test administration; the engine only
/// reads it. Edits never touch completed attempts, which keep the scores
/// computed against the definition as it stood at finalize time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestDefinition {
    pub id: String,
    pub title: String,
    pub duration_minutes: i64,
    /// Percentage (0-100) required to pass.
    pub pass_threshold: u32,
    /// Default attempt cap; a direct assignment may override it.
    pub max_attempts: u32,
    pub status: TestStatus,
    /// Question order is significant and fixed at authoring time.
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Draft,
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Ordered option texts; empty for `open` questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Index into `options`; `None` for `open` questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
    /// Reference answer for graders; never auto-scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_answer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    Open,
}

impl TestDefinition {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Number of questions that enter the scoring denominator.
    pub fn scorable_question_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.kind == QuestionKind::SingleChoice)
            .count()
    }

    pub fn is_published(&self) -> bool {
        self.status == TestStatus::Published
    }
}

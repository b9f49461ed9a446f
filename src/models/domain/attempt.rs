use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::assignment::AssignmentSource;

/// One timed run of a test by a learner. Created by a validated start
/// request, mutated only by answer upserts and exactly one completion
/// transition, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub test_id: String,
    pub user_id: String,
    pub source: AssignmentSource,
    /// Denormalized copy of `source.source_id()` so the store can index
    /// per-instance numbering with a flat key.
    pub source_id: String,
    /// 1-based, strictly increasing per `(source_id, user_id)`.
    pub attempt_number: u32,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    /// `started_at + duration`, stamped at insert. Still a pure derivation
    /// of stored data; no live timer holds it.
    pub deadline_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Percentage (0-100); null while in progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

impl Attempt {
    pub fn new(
        test_id: &str,
        user_id: &str,
        source: AssignmentSource,
        attempt_number: u32,
        started_at: DateTime<Utc>,
        deadline_at: DateTime<Utc>,
    ) -> Self {
        let source_id = source.source_id().to_string();
        Attempt {
            id: Uuid::new_v4().to_string(),
            test_id: test_id.to_string(),
            user_id: user_id.to_string(),
            source,
            source_id,
            attempt_number,
            status: AttemptStatus::InProgress,
            started_at,
            deadline_at,
            completed_at: None,
            score: None,
            passed: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }
}

/// The saved answer for one question of one attempt. A later save for the
/// same question replaces the record; immutable once the attempt completes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub selected_option: usize,
    /// Derived at save time; recomputed authoritatively at finalize.
    pub correct: bool,
    pub saved_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(attempt_id: &str, question_id: &str, selected_option: usize, correct: bool) -> Self {
        AnswerRecord {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt_id.to_string(),
            question_id: question_id.to_string(),
            selected_option,
            correct,
            saved_at: Utc::now(),
        }
    }
}

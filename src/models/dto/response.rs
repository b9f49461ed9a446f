use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    AnswerRecord, AssignmentSource, AttemptStatus, Question, QuestionKind, TestDefinition,
};
use crate::repositories::AssignmentUpsert;
use crate::services::attempt_service::{AttemptResult, AttemptState, ResultsRow, StartOutcome};
use crate::services::eligibility_service::{EligibilityStatus, EligibleTest};

#[derive(Debug, Clone, Serialize)]
pub struct EligibleTestDto {
    pub source_id: String,
    pub source_kind: &'static str,
    pub test_id: String,
    pub title: String,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub status: EligibilityStatus,
    pub attempt_count: u32,
    pub max_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u32>,
    pub passed: bool,
    pub prerequisites_met: bool,
}

impl From<EligibleTest> for EligibleTestDto {
    fn from(eligible: EligibleTest) -> Self {
        let source_kind = match eligible.source {
            AssignmentSource::Direct { .. } => "direct",
            AssignmentSource::CourseLinked { .. } => "course_linked",
        };

        EligibleTestDto {
            source_id: eligible.source.source_id().to_string(),
            source_kind,
            test_id: eligible.test_id,
            title: eligible.title,
            duration_minutes: eligible.duration_minutes,
            deadline: eligible.deadline,
            status: eligible.status,
            attempt_count: eligible.attempt_count,
            max_attempts: eligible.max_attempts,
            best_score: eligible.best_score,
            passed: eligible.passed,
            prerequisites_met: eligible.prerequisites_met,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDto {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_answer: Option<String>,
}

impl QuestionDto {
    /// Learner-facing view: the answer key never leaves the server.
    fn for_learner(question: &Question) -> Self {
        QuestionDto {
            id: question.id.clone(),
            kind: question.kind,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            correct_option: None,
            reference_answer: None,
        }
    }

    fn for_admin(question: &Question) -> Self {
        QuestionDto {
            id: question.id.clone(),
            kind: question.kind,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            correct_option: question.correct_option,
            reference_answer: question.reference_answer.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestContentDto {
    pub id: String,
    pub title: String,
    pub pass_threshold: u32,
    pub duration_minutes: i64,
    pub questions: Vec<QuestionDto>,
}

impl TestContentDto {
    pub fn for_learner(test: &TestDefinition) -> Self {
        Self::build(test, QuestionDto::for_learner)
    }

    pub fn for_admin(test: &TestDefinition) -> Self {
        Self::build(test, QuestionDto::for_admin)
    }

    fn build(test: &TestDefinition, view: fn(&Question) -> QuestionDto) -> Self {
        TestContentDto {
            id: test.id.clone(),
            title: test.title.clone(),
            pass_threshold: test.pass_threshold,
            duration_minutes: test.duration_minutes,
            questions: test.questions.iter().map(view).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: String,
    pub test_id: String,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub deadline_at: DateTime<Utc>,
}

impl From<&StartOutcome> for StartAttemptResponse {
    fn from(outcome: &StartOutcome) -> Self {
        StartAttemptResponse {
            attempt_id: outcome.attempt.id.clone(),
            test_id: outcome.attempt.test_id.clone(),
            attempt_number: outcome.attempt.attempt_number,
            started_at: outcome.attempt.started_at,
            deadline_at: outcome.attempt.deadline_at,
        }
    }
}

/// A saved answer as echoed back to the learner. The derived correctness
/// flag stays server-side.
#[derive(Debug, Clone, Serialize)]
pub struct SavedAnswerDto {
    pub question_id: String,
    pub selected_option: usize,
    pub saved_at: DateTime<Utc>,
}

impl From<&AnswerRecord> for SavedAnswerDto {
    fn from(record: &AnswerRecord) -> Self {
        SavedAnswerDto {
            question_id: record.question_id.clone(),
            selected_option: record.selected_option,
            saved_at: record.saved_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptStateDto {
    pub attempt_id: String,
    pub test_id: String,
    pub status: AttemptStatus,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub deadline_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub answers: Vec<SavedAnswerDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

impl From<AttemptState> for AttemptStateDto {
    fn from(state: AttemptState) -> Self {
        AttemptStateDto {
            attempt_id: state.attempt.id.clone(),
            test_id: state.attempt.test_id.clone(),
            status: state.attempt.status,
            attempt_number: state.attempt.attempt_number,
            started_at: state.attempt.started_at,
            deadline_at: state.attempt.deadline_at,
            remaining_seconds: state.remaining_seconds,
            answers: state.answers.iter().map(SavedAnswerDto::from).collect(),
            score: state.attempt.score,
            passed: state.attempt.passed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResultDto {
    pub score: u32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<AttemptResult> for AttemptResultDto {
    fn from(result: AttemptResult) -> Self {
        AttemptResultDto {
            score: result.score,
            passed: result.passed,
            completed_at: result.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcomeDto {
    pub user_id: String,
    pub outcome: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSummaryResponse {
    pub test_id: String,
    pub results: Vec<AssignmentOutcomeDto>,
}

impl AssignmentSummaryResponse {
    pub fn new(
        test_id: &str,
        outcomes: Vec<crate::services::assignment_service::AssignmentOutcome>,
    ) -> Self {
        AssignmentSummaryResponse {
            test_id: test_id.to_string(),
            results: outcomes
                .into_iter()
                .map(|o| AssignmentOutcomeDto {
                    user_id: o.user_id,
                    outcome: match o.outcome {
                        AssignmentUpsert::Created => "created",
                        AssignmentUpsert::Updated => "updated",
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsRowDto {
    pub user_id: String,
    pub test_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    pub attempt_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
}

impl From<ResultsRow> for ResultsRowDto {
    fn from(row: ResultsRow) -> Self {
        ResultsRowDto {
            user_id: row.user_id,
            test_name: row.test_title,
            score: row.score,
            passed: row.passed,
            attempt_number: row.attempt_number,
            completed_at: row.completed_at,
            status: row.status,
        }
    }
}

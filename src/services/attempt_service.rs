use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerRecord, Attempt, AttemptStatus, QuestionKind},
    repositories::{AnswerRepository, AttemptRepository, TestRepository},
    services::{deadline, eligibility_service::EligibilityService, scoring},
};

pub struct StartOutcome {
    pub attempt: Attempt,
    /// False when an already-open attempt was returned instead.
    pub created: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptResult {
    pub score: u32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

pub struct AttemptState {
    pub attempt: Attempt,
    pub remaining_seconds: i64,
    pub answers: Vec<AnswerRecord>,
}

#[derive(Clone, Debug)]
pub struct ResultsRow {
    pub user_id: String,
    pub test_title: String,
    pub score: Option<u32>,
    pub passed: Option<bool>,
    pub attempt_number: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
}

/// The attempt lifecycle: start, incremental answer saves, and the one
/// completion transition. Scores come from persisted records only; the
/// deadline is re-derived from stored timestamps on every call.
pub struct AttemptService {
    tests: Arc<dyn TestRepository>,
    attempts: Arc<dyn AttemptRepository>,
    answers: Arc<dyn AnswerRepository>,
    eligibility: Arc<EligibilityService>,
}

impl AttemptService {
    pub fn new(
        tests: Arc<dyn TestRepository>,
        attempts: Arc<dyn AttemptRepository>,
        answers: Arc<dyn AnswerRepository>,
        eligibility: Arc<EligibilityService>,
    ) -> Self {
        Self {
            tests,
            attempts,
            answers,
            eligibility,
        }
    }

    pub async fn start(&self, source_id: &str, user_id: &str) -> AppResult<StartOutcome> {
        let context = self.eligibility.check_startable(source_id, user_id).await?;

        // A second start while one attempt is open returns the open attempt
        // instead of erroring.
        if let Some(open) = self
            .attempts
            .find_in_progress(&context.test.id, user_id)
            .await?
        {
            return Ok(StartOutcome {
                attempt: open,
                created: false,
            });
        }

        let now = Utc::now();
        let attempt = Attempt::new(
            &context.test.id,
            user_id,
            context.resolved.source.clone(),
            context.attempt_count as u32 + 1,
            now,
            deadline::deadline_for(now, context.test.duration_minutes),
        );

        match self.attempts.insert(attempt).await {
            Ok(attempt) => {
                log::info!(
                    "Started attempt {} (#{}) on test {} for user {}",
                    attempt.id,
                    attempt.attempt_number,
                    attempt.test_id,
                    user_id
                );
                Ok(StartOutcome {
                    attempt,
                    created: true,
                })
            }
            Err(AppError::Conflict(_)) => {
                // Lost a concurrent start race; surface the attempt that won.
                let open = self
                    .attempts
                    .find_in_progress(&context.test.id, user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict("Another attempt is already open".to_string())
                    })?;
                Ok(StartOutcome {
                    attempt: open,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Idempotent upsert of one answer. Called on every answer change as a
    /// best-effort save; a post-deadline call force-finalizes the attempt
    /// over what was persisted in time and rejects the new answer.
    pub async fn save_answer(
        &self,
        attempt_id: &str,
        user_id: &str,
        question_id: &str,
        selected_option: usize,
    ) -> AppResult<AnswerRecord> {
        let attempt = self.owned_attempt(attempt_id, user_id).await?;

        if !attempt.is_in_progress() {
            return Err(AppError::Conflict(
                "Attempt is already completed".to_string(),
            ));
        }

        if deadline::is_expired(attempt.deadline_at, Utc::now()) {
            self.complete_from_records(&attempt).await?;
            return Err(AppError::DeadlineExceeded(
                "Attempt deadline has passed".to_string(),
            ));
        }

        let test = self.tests.find_by_id(&attempt.test_id).await?.ok_or_else(|| {
            AppError::InternalError(format!(
                "Test '{}' missing for attempt '{}'",
                attempt.test_id, attempt.id
            ))
        })?;
        let question = test
            .question(question_id)
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

        if question.kind != QuestionKind::SingleChoice {
            return Err(AppError::ValidationError(
                "Only single-choice questions accept an option index".to_string(),
            ));
        }
        if selected_option >= question.options.len() {
            return Err(AppError::ValidationError(format!(
                "Option index {} is out of range",
                selected_option
            )));
        }

        let record = AnswerRecord::new(
            attempt_id,
            question_id,
            selected_option,
            scoring::is_correct_answer(question, selected_option),
        );
        self.answers.upsert(record).await
    }

    /// Exactly-once completion. Finalizing an already-completed attempt is a
    /// no-op that returns the stored result.
    pub async fn finalize(&self, attempt_id: &str, user_id: &str) -> AppResult<AttemptResult> {
        let attempt = self.owned_attempt(attempt_id, user_id).await?;

        if attempt.status == AttemptStatus::Completed {
            return Ok(stored_result(&attempt));
        }

        self.complete_from_records(&attempt).await
    }

    /// Attempt status for the client countdown and resume-after-reload.
    pub async fn state(&self, attempt_id: &str, user_id: &str) -> AppResult<AttemptState> {
        let attempt = self.owned_attempt(attempt_id, user_id).await?;
        let answers = self.answers.find_for_attempt(attempt_id).await?;

        let remaining_seconds = if attempt.is_in_progress() {
            deadline::seconds_left(attempt.deadline_at, Utc::now())
        } else {
            0
        };

        Ok(AttemptState {
            attempt,
            remaining_seconds,
            answers,
        })
    }

    /// Force-finalize every open attempt whose deadline (plus grace) has
    /// passed, independent of any client action. Returns how many closed.
    pub async fn sweep_expired(&self, grace_seconds: i64) -> AppResult<usize> {
        let now = Utc::now();
        let open = self.attempts.find_all_in_progress().await?;

        let mut closed = 0;
        for attempt in open {
            let cutoff = attempt.deadline_at + Duration::seconds(grace_seconds);
            if !deadline::is_expired(cutoff, now) {
                continue;
            }

            match self.complete_from_records(&attempt).await {
                Ok(result) => {
                    closed += 1;
                    log::info!(
                        "Swept expired attempt {} for user {} (score {})",
                        attempt.id,
                        attempt.user_id,
                        result.score
                    );
                }
                Err(e) => {
                    log::warn!("Failed to sweep attempt {}: {}", attempt.id, e);
                }
            }
        }

        Ok(closed)
    }

    pub async fn results_report(&self) -> AppResult<Vec<ResultsRow>> {
        let attempts = self.attempts.find_all().await?;

        let mut test_ids: Vec<String> = attempts.iter().map(|a| a.test_id.clone()).collect();
        test_ids.sort();
        test_ids.dedup();

        let tests = self.tests.find_by_ids(&test_ids).await?;
        let titles: HashMap<&str, &str> = tests
            .iter()
            .map(|t| (t.id.as_str(), t.title.as_str()))
            .collect();

        Ok(attempts
            .into_iter()
            .map(|attempt| ResultsRow {
                test_title: titles
                    .get(attempt.test_id.as_str())
                    .map(|title| title.to_string())
                    .unwrap_or_else(|| attempt.test_id.clone()),
                user_id: attempt.user_id,
                score: attempt.score,
                passed: attempt.passed,
                attempt_number: attempt.attempt_number,
                completed_at: attempt.completed_at,
                status: attempt.status,
            })
            .collect())
    }

    async fn owned_attempt(&self, attempt_id: &str, user_id: &str) -> AppResult<Attempt> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt '{}' not found", attempt_id)))?;

        if attempt.user_id != user_id {
            return Err(AppError::Unauthorized(
                "You can only access your own attempts".to_string(),
            ));
        }

        Ok(attempt)
    }

    async fn complete_from_records(&self, attempt: &Attempt) -> AppResult<AttemptResult> {
        let test = self.tests.find_by_id(&attempt.test_id).await?.ok_or_else(|| {
            AppError::InternalError(format!(
                "Test '{}' missing for attempt '{}'",
                attempt.test_id, attempt.id
            ))
        })?;

        let mut records = self.answers.find_for_attempt(&attempt.id).await?;
        // Only answers persisted before the deadline count toward the score.
        records.retain(|record| record.saved_at < attempt.deadline_at);

        let outcome = scoring::score_attempt(&test, &records);

        match self
            .attempts
            .complete(&attempt.id, outcome.score, outcome.passed, Utc::now())
            .await?
        {
            Some(completed) => Ok(stored_result(&completed)),
            None => {
                // A concurrent finalize won the transition; report what it
                // stored.
                let existing = self
                    .attempts
                    .find_by_id(&attempt.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Attempt '{}' not found", attempt.id))
                    })?;
                Ok(stored_result(&existing))
            }
        }
    }
}

fn stored_result(attempt: &Attempt) -> AttemptResult {
    AttemptResult {
        score: attempt.score.unwrap_or(0),
        passed: attempt.passed.unwrap_or(false),
        completed_at: attempt.completed_at.unwrap_or(attempt.deadline_at),
    }
}

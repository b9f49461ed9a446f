use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AssignmentSource, Attempt, ResolvedAssignment, TestDefinition},
    repositories::{AssignmentRepository, AttemptRepository, TestRepository},
    services::prerequisite_service::PrerequisiteChecker,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

/// One assignment instance as the learner sees it: effective deadline and
/// cap, attempt history summary, and whether a start would be admitted.
#[derive(Clone, Debug)]
pub struct EligibleTest {
    pub source: AssignmentSource,
    pub test_id: String,
    pub title: String,
    pub duration_minutes: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub max_attempts: u32,
    pub attempt_count: u32,
    pub best_score: Option<u32>,
    pub passed: bool,
    pub prerequisites_met: bool,
    pub status: EligibilityStatus,
}

/// Everything a validated start needs, returned by `check_startable`.
#[derive(Clone, Debug)]
pub struct StartContext {
    pub resolved: ResolvedAssignment,
    pub test: TestDefinition,
    pub attempt_count: u64,
}

/// Merges the two assignment sources into one eligibility view. Read-only;
/// a learner with no assignments gets an empty list, never an error.
pub struct EligibilityService {
    tests: Arc<dyn TestRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    prerequisites: Arc<dyn PrerequisiteChecker>,
}

impl EligibilityService {
    pub fn new(
        tests: Arc<dyn TestRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
        prerequisites: Arc<dyn PrerequisiteChecker>,
    ) -> Self {
        Self {
            tests,
            assignments,
            attempts,
            prerequisites,
        }
    }

    pub async fn resolve_for_user(&self, user_id: &str) -> AppResult<Vec<EligibleTest>> {
        let now = Utc::now();

        let directs = self.assignments.find_direct_for_user(user_id).await?;
        let links = self.assignments.find_course_links_for_user(user_id).await?;

        let mut resolved: Vec<ResolvedAssignment> =
            directs.iter().map(ResolvedAssignment::from_direct).collect();
        resolved.extend(
            links
                .iter()
                .map(|link| ResolvedAssignment::from_course_link(link, user_id)),
        );

        let mut test_ids: Vec<String> = resolved.iter().map(|r| r.test_id.clone()).collect();
        test_ids.sort();
        test_ids.dedup();

        let tests = self.tests.find_by_ids(&test_ids).await?;
        let tests_by_id: HashMap<&str, &TestDefinition> =
            tests.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut eligible = Vec::new();
        for assignment in &resolved {
            let Some(test) = tests_by_id.get(assignment.test_id.as_str()) else {
                continue;
            };
            if !test.is_published() {
                continue;
            }

            let history = self
                .attempts
                .find_for_source(assignment.source_id(), user_id)
                .await?;
            let prerequisites_met = self.prerequisites_met(assignment).await;

            eligible.push(build_eligible_test(
                assignment,
                test,
                &history,
                prerequisites_met,
                now,
            ));
        }

        Ok(eligible)
    }

    /// Re-run the full eligibility decision for one instance at start time.
    /// A client-cached snapshot of the listing is never trusted.
    pub async fn check_startable(&self, source_id: &str, user_id: &str) -> AppResult<StartContext> {
        let resolved = self
            .assignments
            .resolve_source(source_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No assignment '{}' for this user", source_id))
            })?;

        let test = self
            .tests
            .find_by_id(&resolved.test_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", resolved.test_id)))?;

        if !test.is_published() {
            return Err(AppError::NotEligible("Test is not published".to_string()));
        }

        if !self.prerequisites_met(&resolved).await {
            return Err(AppError::NotEligible("Prerequisites are not met".to_string()));
        }

        if let Some(deadline) = resolved.deadline {
            if Utc::now() > deadline {
                return Err(AppError::NotEligible(
                    "Assignment deadline has passed".to_string(),
                ));
            }
        }

        let attempt_count = self.attempts.count_for_source(source_id, user_id).await?;
        let max_attempts = resolved.effective_max_attempts(test.max_attempts);
        if attempt_count >= max_attempts as u64 {
            return Err(AppError::NotEligible(format!(
                "Attempt limit ({}) reached",
                max_attempts
            )));
        }

        Ok(StartContext {
            resolved,
            test,
            attempt_count,
        })
    }

    /// Catalog read for the content endpoint; the handler picks the learner
    /// or admin view.
    pub async fn test_content(&self, test_id: &str) -> AppResult<TestDefinition> {
        self.tests
            .find_by_id(test_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", test_id)))
    }

    async fn prerequisites_met(&self, assignment: &ResolvedAssignment) -> bool {
        match &assignment.source {
            AssignmentSource::Direct { .. } => true,
            AssignmentSource::CourseLinked { course_id, .. } => self
                .prerequisites
                .has_met_prerequisites(&assignment.user_id, course_id)
                .await
                .unwrap_or_else(|e| {
                    // A broken collaborator must not unlock gated tests.
                    log::warn!("Prerequisite check failed for course {}: {}", course_id, e);
                    false
                }),
        }
    }
}

fn build_eligible_test(
    assignment: &ResolvedAssignment,
    test: &TestDefinition,
    history: &[Attempt],
    prerequisites_met: bool,
    now: DateTime<Utc>,
) -> EligibleTest {
    let latest = history.first();
    let best_score = history.iter().filter_map(|a| a.score).max();
    let passed = history.iter().any(|a| a.passed == Some(true));

    EligibleTest {
        source: assignment.source.clone(),
        test_id: test.id.clone(),
        title: test.title.clone(),
        duration_minutes: test.duration_minutes,
        deadline: assignment.deadline,
        max_attempts: assignment.effective_max_attempts(test.max_attempts),
        attempt_count: history.len() as u32,
        best_score,
        passed,
        prerequisites_met,
        status: derive_status(latest, assignment.deadline, now),
    }
}

/// Priority order: completed, then overdue, then in-progress, then
/// not-started.
pub fn derive_status(
    latest: Option<&Attempt>,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EligibilityStatus {
    if let Some(attempt) = latest {
        if !attempt.is_in_progress() {
            return EligibilityStatus::Completed;
        }
    }

    if deadline.map(|d| now > d).unwrap_or(false) {
        return EligibilityStatus::Overdue;
    }

    if latest.is_some() {
        EligibilityStatus::InProgress
    } else {
        EligibilityStatus::NotStarted
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::DirectAssignment,
    repositories::{AssignmentRepository, AssignmentUpsert, TestRepository},
};

#[derive(Clone, Debug)]
pub struct AssignmentOutcome {
    pub user_id: String,
    pub outcome: AssignmentUpsert,
}

/// Admin-side management of direct test grants.
pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    tests: Arc<dyn TestRepository>,
}

impl AssignmentService {
    pub fn new(assignments: Arc<dyn AssignmentRepository>, tests: Arc<dyn TestRepository>) -> Self {
        Self { assignments, tests }
    }

    /// Grant a test to a list of users, upserting per user. Re-assigning an
    /// existing grant updates its deadline and cap override in place.
    pub async fn assign(
        &self,
        test_id: &str,
        user_ids: &[String],
        deadline: Option<DateTime<Utc>>,
        max_attempts_override: Option<u32>,
    ) -> AppResult<Vec<AssignmentOutcome>> {
        let test = self
            .tests
            .find_by_id(test_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", test_id)))?;

        if !test.is_published() {
            return Err(AppError::ValidationError(
                "Cannot assign an unpublished test".to_string(),
            ));
        }

        let mut outcomes = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let assignment =
                DirectAssignment::new(test_id, user_id, deadline, max_attempts_override);
            let outcome = self.assignments.upsert_direct(assignment).await?;
            outcomes.push(AssignmentOutcome {
                user_id: user_id.clone(),
                outcome,
            });
        }

        log::info!("Assigned test {} to {} user(s)", test_id, outcomes.len());
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{TestDefinition, TestStatus};
    use crate::repositories::assignment_repository::MockAssignmentRepository;
    use crate::repositories::test_repository::MockTestRepository;
    use crate::test_utils::fixtures;

    fn make_test_definition(status: TestStatus) -> TestDefinition {
        let mut test = fixtures::published_test("test-1", 70, vec![]);
        test.status = status;
        test
    }

    #[tokio::test]
    async fn assigning_unpublished_test_is_rejected() {
        let tests = {
            let mut m = MockTestRepository::new();
            m.expect_find_by_id()
                .returning(|_| Ok(Some(make_test_definition(TestStatus::Draft))));
            m
        };
        let assignments = MockAssignmentRepository::new();

        let service = AssignmentService::new(Arc::new(assignments), Arc::new(tests));
        let result = service
            .assign("test-1", &["user-1".to_string()], None, None)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn assign_reports_created_and_updated_per_user() {
        let tests = {
            let mut m = MockTestRepository::new();
            m.expect_find_by_id()
                .returning(|_| Ok(Some(make_test_definition(TestStatus::Published))));
            m
        };
        let assignments = {
            let mut m = MockAssignmentRepository::new();
            m.expect_upsert_direct()
                .returning(|assignment| match assignment.user_id.as_str() {
                    "new-user" => Ok(AssignmentUpsert::Created),
                    _ => Ok(AssignmentUpsert::Updated),
                });
            m
        };

        let service = AssignmentService::new(Arc::new(assignments), Arc::new(tests));
        let outcomes = service
            .assign(
                "test-1",
                &["new-user".to_string(), "old-user".to_string()],
                None,
                Some(5),
            )
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].outcome, AssignmentUpsert::Created);
        assert_eq!(outcomes[1].outcome, AssignmentUpsert::Updated);
    }
}

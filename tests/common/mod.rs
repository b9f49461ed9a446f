#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use prova_server::{
    errors::{AppError, AppResult},
    models::domain::{
        AnswerRecord, Attempt, AttemptStatus, CourseTestLink, DirectAssignment, Enrollment,
        Question, QuestionKind, ResolvedAssignment, TestDefinition, TestStatus,
    },
    repositories::{
        AnswerRepository, AssignmentRepository, AssignmentUpsert, AttemptRepository,
        TestRepository,
    },
    services::{
        AlwaysMetPrerequisites, AttemptService, EligibilityService, PrerequisiteChecker,
    },
};

pub struct InMemoryTestRepository {
    tests: RwLock<HashMap<String, TestDefinition>>,
}

impl InMemoryTestRepository {
    pub fn new(tests: Vec<TestDefinition>) -> Self {
        Self {
            tests: RwLock::new(tests.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }
}

#[async_trait]
impl TestRepository for InMemoryTestRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestDefinition>> {
        let tests = self.tests.read().await;
        Ok(tests.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<TestDefinition>> {
        let tests = self.tests.read().await;
        Ok(ids.iter().filter_map(|id| tests.get(id).cloned()).collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct InMemoryAssignmentRepository {
    assignments: RwLock<Vec<DirectAssignment>>,
    enrollments: RwLock<Vec<Enrollment>>,
    course_test_links: RwLock<Vec<CourseTestLink>>,
}

impl InMemoryAssignmentRepository {
    pub fn new(
        assignments: Vec<DirectAssignment>,
        enrollments: Vec<Enrollment>,
        course_test_links: Vec<CourseTestLink>,
    ) -> Self {
        Self {
            assignments: RwLock::new(assignments),
            enrollments: RwLock::new(enrollments),
            course_test_links: RwLock::new(course_test_links),
        }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn find_direct_for_user(&self, user_id: &str) -> AppResult<Vec<DirectAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_course_links_for_user(&self, user_id: &str) -> AppResult<Vec<CourseTestLink>> {
        let enrollments = self.enrollments.read().await;
        let course_ids: Vec<&str> = enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.course_id.as_str())
            .collect();

        let links = self.course_test_links.read().await;
        Ok(links
            .iter()
            .filter(|l| course_ids.contains(&l.course_id.as_str()))
            .cloned()
            .collect())
    }

    async fn resolve_source(
        &self,
        source_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ResolvedAssignment>> {
        let assignments = self.assignments.read().await;
        if let Some(assignment) = assignments
            .iter()
            .find(|a| a.id == source_id && a.user_id == user_id)
        {
            return Ok(Some(ResolvedAssignment::from_direct(assignment)));
        }
        drop(assignments);

        let links = self.course_test_links.read().await;
        let Some(link) = links.iter().find(|l| l.id == source_id) else {
            return Ok(None);
        };

        let enrollments = self.enrollments.read().await;
        let enrolled = enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == link.course_id);
        if !enrolled {
            return Ok(None);
        }

        Ok(Some(ResolvedAssignment::from_course_link(link, user_id)))
    }

    async fn upsert_direct(&self, assignment: DirectAssignment) -> AppResult<AssignmentUpsert> {
        let mut assignments = self.assignments.write().await;

        if let Some(existing) = assignments
            .iter_mut()
            .find(|a| a.test_id == assignment.test_id && a.user_id == assignment.user_id)
        {
            existing.deadline = assignment.deadline;
            existing.max_attempts_override = assignment.max_attempts_override;
            return Ok(AssignmentUpsert::Updated);
        }

        assignments.push(assignment);
        Ok(AssignmentUpsert::Created)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Mirrors the store's uniqueness guarantees: one open attempt per
/// `(test, user)` and one row per `(source, user, attempt_number)`.
pub struct InMemoryAttemptRepository {
    attempts: RwLock<HashMap<String, Attempt>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;

        let open_duplicate = attempts.values().any(|a| {
            a.test_id == attempt.test_id
                && a.user_id == attempt.user_id
                && a.status == AttemptStatus::InProgress
        });
        if attempt.status == AttemptStatus::InProgress && open_duplicate {
            return Err(AppError::Conflict(format!(
                "An attempt is already open for test '{}' and user '{}'",
                attempt.test_id, attempt.user_id
            )));
        }

        let number_duplicate = attempts.values().any(|a| {
            a.source_id == attempt.source_id
                && a.user_id == attempt.user_id
                && a.attempt_number == attempt.attempt_number
        });
        if number_duplicate {
            return Err(AppError::Conflict(format!(
                "Attempt number {} already exists for source '{}'",
                attempt.attempt_number, attempt.source_id
            )));
        }

        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn find_in_progress(&self, test_id: &str, user_id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .find(|a| {
                a.test_id == test_id
                    && a.user_id == user_id
                    && a.status == AttemptStatus::InProgress
            })
            .cloned())
    }

    async fn find_for_source(&self, source_id: &str, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.source_id == source_id && a.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.attempt_number.cmp(&a.attempt_number));
        Ok(items)
    }

    async fn count_for_source(&self, source_id: &str, user_id: &str) -> AppResult<u64> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.source_id == source_id && a.user_id == user_id)
            .count() as u64)
    }

    async fn complete(
        &self,
        attempt_id: &str,
        score: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let mut attempts = self.attempts.write().await;
        let Some(attempt) = attempts.get_mut(attempt_id) else {
            return Ok(None);
        };
        if attempt.status != AttemptStatus::InProgress {
            return Ok(None);
        }

        attempt.status = AttemptStatus::Completed;
        attempt.score = Some(score);
        attempt.passed = Some(passed);
        attempt.completed_at = Some(completed_at);
        Ok(Some(attempt.clone()))
    }

    async fn find_all_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.status == AttemptStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts.values().cloned().collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct InMemoryAnswerRepository {
    records: RwLock<HashMap<(String, String), AnswerRecord>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn upsert(&self, record: AnswerRecord) -> AppResult<AnswerRecord> {
        let mut records = self.records.write().await;
        records.insert(
            (record.attempt_id.clone(), record.question_id.clone()),
            record.clone(),
        );
        Ok(record)
    }

    async fn find_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Everything a lifecycle test needs, wired over the in-memory store.
pub struct TestHarness {
    pub tests: Arc<InMemoryTestRepository>,
    pub assignments: Arc<InMemoryAssignmentRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub answers: Arc<InMemoryAnswerRepository>,
    pub eligibility_service: Arc<EligibilityService>,
    pub attempt_service: AttemptService,
}

impl TestHarness {
    pub fn new(
        tests: Vec<TestDefinition>,
        assignments: Vec<DirectAssignment>,
        enrollments: Vec<Enrollment>,
        course_test_links: Vec<CourseTestLink>,
    ) -> Self {
        Self::with_prerequisites(
            tests,
            assignments,
            enrollments,
            course_test_links,
            Arc::new(AlwaysMetPrerequisites),
        )
    }

    pub fn with_prerequisites(
        tests: Vec<TestDefinition>,
        assignments: Vec<DirectAssignment>,
        enrollments: Vec<Enrollment>,
        course_test_links: Vec<CourseTestLink>,
        prerequisites: Arc<dyn PrerequisiteChecker>,
    ) -> Self {
        let tests = Arc::new(InMemoryTestRepository::new(tests));
        let assignments = Arc::new(InMemoryAssignmentRepository::new(
            assignments,
            enrollments,
            course_test_links,
        ));
        let attempts = Arc::new(InMemoryAttemptRepository::new());
        let answers = Arc::new(InMemoryAnswerRepository::new());

        let eligibility_service = Arc::new(EligibilityService::new(
            tests.clone(),
            assignments.clone(),
            attempts.clone(),
            prerequisites,
        ));
        let attempt_service = AttemptService::new(
            tests.clone(),
            attempts.clone(),
            answers.clone(),
            eligibility_service.clone(),
        );

        Self {
            tests,
            assignments,
            attempts,
            answers,
            eligibility_service,
            attempt_service,
        }
    }
}

pub fn single_choice(id: &str, correct: usize) -> Question {
    Question {
        id: id.to_string(),
        kind: QuestionKind::SingleChoice,
        prompt: format!("Question {}", id),
        options: vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ],
        correct_option: Some(correct),
        reference_answer: None,
    }
}

pub fn open_question(id: &str) -> Question {
    Question {
        id: id.to_string(),
        kind: QuestionKind::Open,
        prompt: format!("Question {}", id),
        options: vec![],
        correct_option: None,
        reference_answer: None,
    }
}

pub fn make_test(
    id: &str,
    pass_threshold: u32,
    duration_minutes: i64,
    max_attempts: u32,
    questions: Vec<Question>,
) -> TestDefinition {
    TestDefinition {
        id: id.to_string(),
        title: format!("Test {}", id),
        duration_minutes,
        pass_threshold,
        max_attempts,
        status: TestStatus::Published,
        questions,
        created_at: Some(Utc::now()),
        modified_at: Some(Utc::now()),
    }
}

pub fn direct_assignment(id: &str, test_id: &str, user_id: &str) -> DirectAssignment {
    DirectAssignment {
        id: id.to_string(),
        test_id: test_id.to_string(),
        user_id: user_id.to_string(),
        deadline: None,
        max_attempts_override: None,
        assigned_at: Utc::now(),
    }
}

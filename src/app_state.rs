use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AnswerRepository, AssignmentRepository, AttemptRepository, MongoAnswerRepository,
        MongoAssignmentRepository, MongoAttemptRepository, MongoTestRepository, TestRepository,
    },
    services::{
        AlwaysMetPrerequisites, AssignmentService, AttemptService, EligibilityService,
        HttpPrerequisiteChecker, PrerequisiteChecker,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub eligibility_service: Arc<EligibilityService>,
    pub attempt_service: Arc<AttemptService>,
    pub assignment_service: Arc<AssignmentService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let tests = Arc::new(MongoTestRepository::new(&db));
        tests.ensure_indexes().await?;

        let assignments = Arc::new(MongoAssignmentRepository::new(&db));
        assignments.ensure_indexes().await?;

        let attempts = Arc::new(MongoAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;

        let answers = Arc::new(MongoAnswerRepository::new(&db));
        answers.ensure_indexes().await?;

        let prerequisites: Arc<dyn PrerequisiteChecker> = match &config.course_api_url {
            Some(url) => Arc::new(HttpPrerequisiteChecker::new(url)),
            None => Arc::new(AlwaysMetPrerequisites),
        };

        let eligibility_service = Arc::new(EligibilityService::new(
            tests.clone(),
            assignments.clone(),
            attempts.clone(),
            prerequisites,
        ));
        let attempt_service = Arc::new(AttemptService::new(
            tests.clone(),
            attempts,
            answers,
            eligibility_service.clone(),
        ));
        let assignment_service = Arc::new(AssignmentService::new(assignments, tests));

        Ok(Self {
            db,
            eligibility_service,
            attempt_service,
            assignment_service,
            config: Arc::new(config),
        })
    }
}

pub mod answer_repository;
pub mod assignment_repository;
pub mod attempt_repository;
pub mod test_repository;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use assignment_repository::{AssignmentRepository, AssignmentUpsert, MongoAssignmentRepository};
pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use test_repository::{MongoTestRepository, TestRepository};

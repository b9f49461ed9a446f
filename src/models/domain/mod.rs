pub mod assignment;
pub mod attempt;
pub mod test_definition;
pub mod user;

pub use assignment::{
    AssignmentSource, CourseTestLink, DirectAssignment, Enrollment, ResolvedAssignment,
};
pub use attempt::{AnswerRecord, Attempt, AttemptStatus};
pub use test_definition::{Question, QuestionKind, TestDefinition, TestStatus};
pub use user::UserRole;

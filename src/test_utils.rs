use crate::models::domain::{Question, QuestionKind, TestDefinition, TestStatus};

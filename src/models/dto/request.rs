use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

/// Body of the answer upsert; the attempt and question ids travel in the
/// path. Sent on every answer change as a best-effort save.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub selected_option: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignTestRequest {
    #[validate(length(min = 1))]
    pub test_id: String,

    #[validate(length(min = 1, max = 500))]
    pub user_ids: Vec<String>,

    pub deadline: Option<DateTime<Utc>>,

    pub max_attempts_override: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_assign_request() {
        let request = AssignTestRequest {
            test_id: "test-1".to_string(),
            user_ids: vec!["user-1".to_string(), "user-2".to_string()],
            deadline: None,
            max_attempts_override: Some(5),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_assign_request_requires_users() {
        let request = AssignTestRequest {
            test_id: "test-1".to_string(),
            user_ids: vec![],
            deadline: None,
            max_attempts_override: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_submit_answer_deserializes_from_json() {
        let request: SubmitAnswerRequest =
            serde_json::from_str("{\"selected_option\": 2}").expect("body should deserialize");
        assert_eq!(request.selected_option, 2);
    }
}

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};

/// The course collaborator's sequential-unlock rule, consumed as a boolean
/// capability so the real rule can be swapped in without touching the
/// engine. Direct assignments never consult it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrerequisiteChecker: Send + Sync {
    async fn has_met_prerequisites(&self, user_id: &str, course_id: &str) -> AppResult<bool>;
}

/// Used when no course collaborator is configured; every course-linked test
/// is treated as unlocked.
pub struct AlwaysMetPrerequisites;

#[async_trait]
impl PrerequisiteChecker for AlwaysMetPrerequisites {
    async fn has_met_prerequisites(&self, _user_id: &str, _course_id: &str) -> AppResult<bool> {
        Ok(true)
    }
}

#[derive(Debug, Deserialize)]
struct PrerequisiteResponse {
    met: bool,
}

pub struct HttpPrerequisiteChecker {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPrerequisiteChecker {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PrerequisiteChecker for HttpPrerequisiteChecker {
    async fn has_met_prerequisites(&self, user_id: &str, course_id: &str) -> AppResult<bool> {
        let url = format!(
            "{}/internal/prerequisites/{}/{}",
            self.base_url, course_id, user_id
        );

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Prerequisite check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::InternalError(format!(
                "Prerequisite check returned status {}",
                response.status()
            )));
        }

        let body: PrerequisiteResponse = response.json().await.map_err(|e| {
            AppError::InternalError(format!("Failed to parse prerequisite response: {}", e))
        })?;

        Ok(body.met)
    }
}

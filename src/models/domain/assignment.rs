use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A direct grant of a test to a learner, with its own deadline and
/// attempt-cap override. Upserted by the admin assignment operation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectAssignment {
    pub id: String,
    pub test_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts_override: Option<u32>,
    pub assigned_at: DateTime<Utc>,
}

impl DirectAssignment {
    pub fn new(
        test_id: &str,
        user_id: &str,
        deadline: Option<DateTime<Utc>>,
        max_attempts_override: Option<u32>,
    ) -> Self {
        DirectAssignment {
            id: Uuid::new_v4().to_string(),
            test_id: test_id.to_string(),
            user_id: user_id.to_string(),
            deadline,
            max_attempts_override,
            assigned_at: Utc::now(),
        }
    }
}

/// A test attached to a course by course administration. Combined with an
/// enrollment it yields the implicit assignment source.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CourseTestLink {
    pub id: String,
    pub course_id: String,
    pub test_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
}

/// Where an assignment instance came from. The two sources are merged into
/// one normalized record instead of two parallel code paths.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentSource {
    Direct { assignment_id: String },
    CourseLinked { link_id: String, course_id: String },
}

impl AssignmentSource {
    /// The instance key attempts are scoped by.
    pub fn source_id(&self) -> &str {
        match self {
            AssignmentSource::Direct { assignment_id } => assignment_id,
            AssignmentSource::CourseLinked { link_id, .. } => link_id,
        }
    }

    pub fn is_course_linked(&self) -> bool {
        matches!(self, AssignmentSource::CourseLinked { .. })
    }
}

/// One assignment instance resolved for a `(test, user)` pair: one effective
/// deadline and one effective attempt cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAssignment {
    pub source: AssignmentSource,
    pub test_id: String,
    pub user_id: String,
    pub deadline: Option<DateTime<Utc>>,
    pub max_attempts_override: Option<u32>,
}

impl ResolvedAssignment {
    pub fn from_direct(assignment: &DirectAssignment) -> Self {
        ResolvedAssignment {
            source: AssignmentSource::Direct {
                assignment_id: assignment.id.clone(),
            },
            test_id: assignment.test_id.clone(),
            user_id: assignment.user_id.clone(),
            deadline: assignment.deadline,
            max_attempts_override: assignment.max_attempts_override,
        }
    }

    pub fn from_course_link(link: &CourseTestLink, user_id: &str) -> Self {
        ResolvedAssignment {
            source: AssignmentSource::CourseLinked {
                link_id: link.id.clone(),
                course_id: link.course_id.clone(),
            },
            test_id: link.test_id.clone(),
            user_id: user_id.to_string(),
            deadline: link.deadline,
            max_attempts_override: None,
        }
    }

    /// The override takes precedence over the test's default cap.
    pub fn effective_max_attempts(&self, default_cap: u32) -> u32 {
        self.max_attempts_override.unwrap_or(default_cap)
    }

    pub fn source_id(&self) -> &str {
        self.source.source_id()
    }
}

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    options::{IndexOptions, UpdateOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{CourseTestLink, DirectAssignment, Enrollment, ResolvedAssignment},
};

/// Outcome of the admin assignment upsert, reported per user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentUpsert {
    Created,
    Updated,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn find_direct_for_user(&self, user_id: &str) -> AppResult<Vec<DirectAssignment>>;
    /// Course-linked tests the user reaches through an enrollment.
    async fn find_course_links_for_user(&self, user_id: &str) -> AppResult<Vec<CourseTestLink>>;
    /// Resolve one assignment instance for the user, whichever source it
    /// came from. `None` when the id is unknown or not granted to the user.
    async fn resolve_source(
        &self,
        source_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ResolvedAssignment>>;
    /// Upsert keyed by `(test_id, user_id)`. An existing grant keeps its id
    /// (attempts reference it) and only the deadline and cap override move.
    async fn upsert_direct(&self, assignment: DirectAssignment) -> AppResult<AssignmentUpsert>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAssignmentRepository {
    assignments: Collection<DirectAssignment>,
    enrollments: Collection<Enrollment>,
    course_test_links: Collection<CourseTestLink>,
}

impl MongoAssignmentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            assignments: db.get_collection("assignments"),
            enrollments: db.get_collection("enrollments"),
            course_test_links: db.get_collection("course_test_links"),
        }
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn find_direct_for_user(&self, user_id: &str) -> AppResult<Vec<DirectAssignment>> {
        let assignments = self
            .assignments
            .find(doc! { "user_id": user_id })
            .sort(doc! { "assigned_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(assignments)
    }

    async fn find_course_links_for_user(&self, user_id: &str) -> AppResult<Vec<CourseTestLink>> {
        let enrollments: Vec<Enrollment> = self
            .enrollments
            .find(doc! { "user_id": user_id })
            .await?
            .try_collect()
            .await?;

        let course_ids: Vec<String> = enrollments.into_iter().map(|e| e.course_id).collect();
        if course_ids.is_empty() {
            return Ok(vec![]);
        }

        let links = self
            .course_test_links
            .find(doc! { "course_id": { "$in": course_ids } })
            .await?
            .try_collect()
            .await?;
        Ok(links)
    }

    async fn resolve_source(
        &self,
        source_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ResolvedAssignment>> {
        if let Some(assignment) = self
            .assignments
            .find_one(doc! { "id": source_id, "user_id": user_id })
            .await?
        {
            return Ok(Some(ResolvedAssignment::from_direct(&assignment)));
        }

        let Some(link) = self
            .course_test_links
            .find_one(doc! { "id": source_id })
            .await?
        else {
            return Ok(None);
        };

        let enrolled = self
            .enrollments
            .find_one(doc! { "user_id": user_id, "course_id": &link.course_id })
            .await?;
        if enrolled.is_none() {
            return Ok(None);
        }

        Ok(Some(ResolvedAssignment::from_course_link(&link, user_id)))
    }

    async fn upsert_direct(&self, assignment: DirectAssignment) -> AppResult<AssignmentUpsert> {
        let filter = doc! {
            "test_id": &assignment.test_id,
            "user_id": &assignment.user_id
        };

        let deadline = assignment
            .deadline
            .map(|d| Bson::String(d.to_rfc3339()))
            .unwrap_or(Bson::Null);
        let cap = assignment
            .max_attempts_override
            .map(|v| Bson::Int64(v as i64))
            .unwrap_or(Bson::Null);

        let update = doc! {
            "$set": { "deadline": deadline, "max_attempts_override": cap },
            "$setOnInsert": {
                "id": &assignment.id,
                "test_id": &assignment.test_id,
                "user_id": &assignment.user_id,
                "assigned_at": assignment.assigned_at.to_rfc3339(),
            }
        };

        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .assignments
            .update_one(filter, update)
            .with_options(options)
            .await?;

        if result.upserted_id.is_some() {
            Ok(AssignmentUpsert::Created)
        } else {
            Ok(AssignmentUpsert::Updated)
        }
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for assignment collections");

        let assignment_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // One direct grant per (test, user); the admin operation upserts
        // into it.
        let grant_index = IndexModel::builder()
            .keys(doc! { "test_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("one_grant_per_test_user".to_string())
                    .build(),
            )
            .build();

        self.assignments.create_index(assignment_id_index).await?;
        self.assignments.create_index(grant_index).await?;

        let enrollment_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("one_enrollment_per_user_course".to_string())
                    .build(),
            )
            .build();

        self.enrollments.create_index(enrollment_index).await?;

        let link_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let link_course_index = IndexModel::builder()
            .keys(doc! { "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_id".to_string())
                    .build(),
            )
            .build();

        self.course_test_links.create_index(link_id_index).await?;
        self.course_test_links
            .create_index(link_course_index)
            .await?;

        log::info!("Successfully created indexes for assignment collections");
        Ok(())
    }
}

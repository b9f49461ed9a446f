use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Attempt,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn find_in_progress(&self, test_id: &str, user_id: &str) -> AppResult<Option<Attempt>>;
    /// All attempts for one assignment instance, newest attempt number first.
    async fn find_for_source(&self, source_id: &str, user_id: &str) -> AppResult<Vec<Attempt>>;
    async fn count_for_source(&self, source_id: &str, user_id: &str) -> AppResult<u64>;
    /// Atomically transition an in-progress attempt to completed. Returns
    /// `None` when the attempt was not in progress (already completed or
    /// unknown), which makes racing finalize calls safe.
    async fn complete(
        &self,
        attempt_id: &str,
        score: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>>;
    async fn find_all_in_progress(&self) -> AppResult<Vec<Attempt>>;
    async fn find_all(&self) -> AppResult<Vec<Attempt>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("attempts");
        Self { collection }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn insert(&self, attempt: Attempt) -> AppResult<Attempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(format!(
                "An attempt is already open for test '{}' and user '{}'",
                attempt.test_id, attempt.user_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_in_progress(&self, test_id: &str, user_id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self
            .collection
            .find_one(doc! {
                "test_id": test_id,
                "user_id": user_id,
                "status": "in_progress"
            })
            .await?;
        Ok(attempt)
    }

    async fn find_for_source(&self, source_id: &str, user_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "source_id": source_id,
                "user_id": user_id
            })
            .sort(doc! { "attempt_number": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn count_for_source(&self, source_id: &str, user_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "source_id": source_id,
                "user_id": user_id
            })
            .await?;
        Ok(count)
    }

    async fn complete(
        &self,
        attempt_id: &str,
        score: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "id": attempt_id, "status": "in_progress" },
                doc! { "$set": {
                    "status": "completed",
                    "score": score as i64,
                    "passed": passed,
                    "completed_at": completed_at.to_rfc3339()
                } },
            )
            .with_options(options)
            .await?;

        Ok(updated)
    }

    async fn find_all_in_progress(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "status": "in_progress" })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_all(&self) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! {})
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // At most one open attempt per (test, user) pair; concurrent start
        // calls race on this index instead of creating duplicates.
        let open_attempt_index = IndexModel::builder()
            .keys(doc! { "test_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "status": "in_progress" })
                    .name("one_open_attempt_per_test_user".to_string())
                    .build(),
            )
            .build();

        // Attempt numbers are scoped to the assignment instance and never
        // reused.
        let numbering_index = IndexModel::builder()
            .keys(doc! { "source_id": 1, "user_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("source_attempt_number_unique".to_string())
                    .build(),
            )
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("status".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(open_attempt_index).await?;
        self.collection.create_index(numbering_index).await?;
        self.collection.create_index(status_index).await?;

        log::info!("Successfully created indexes for attempts collection");
        Ok(())
    }
}

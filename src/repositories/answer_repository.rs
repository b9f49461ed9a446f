use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::AnswerRecord};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Full replace keyed by `(attempt_id, question_id)`; repeat saves for
    /// the same question are last-write-wins.
    async fn upsert(&self, record: AnswerRecord) -> AppResult<AnswerRecord>;
    async fn find_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerRecord>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAnswerRepository {
    collection: Collection<AnswerRecord>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("answer_records");
        Self { collection }
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    async fn upsert(&self, record: AnswerRecord) -> AppResult<AnswerRecord> {
        let filter = doc! {
            "attempt_id": &record.attempt_id,
            "question_id": &record.question_id
        };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, &record)
            .with_options(options)
            .await?;

        Ok(record)
    }

    async fn find_for_attempt(&self, attempt_id: &str) -> AppResult<Vec<AnswerRecord>> {
        let records = self
            .collection
            .find(doc! { "attempt_id": attempt_id })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for answer_records collection");

        // One record per (attempt, question); the upsert replaces rather
        // than appends.
        let answer_key_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("one_record_per_attempt_question".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(answer_key_index).await?;

        log::info!("Successfully created indexes for answer_records collection");
        Ok(())
    }
}

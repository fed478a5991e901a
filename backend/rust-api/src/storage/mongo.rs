use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection, Database,
};

use crate::metrics::track_db_operation;
use crate::models::assessment::Assessment;
use crate::models::attempt::{Attempt, AttemptState, TerminalOutcome};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

use super::{AssessmentCatalog, AttemptStore};

/// Production attempt store over the `attempts` collection. Both lifecycle
/// primitives are single `findOneAndUpdate` calls, so MongoDB's per-document
/// atomicity is the mutual exclusion: two racing finalize calls cannot both
/// match `state: "in_progress"`.
pub struct MongoAttemptStore {
    db: Database,
    collection: Collection<Attempt>,
}

impl MongoAttemptStore {
    pub fn new(db: Database) -> Self {
        let collection = db.collection("attempts");
        Self { db, collection }
    }
}

#[async_trait]
impl AttemptStore for MongoAttemptStore {
    async fn find_or_create_open(&self, fresh: Attempt) -> Result<(Attempt, bool)> {
        let filter = doc! {
            "student_id": &fresh.student_id,
            "assessment_id": &fresh.assessment_id,
            "state": AttemptState::InProgress.as_str(),
        };
        let mut insert =
            mongodb::bson::to_document(&fresh).context("Failed to serialize attempt")?;
        // The upsert copies the filter's equality fields into the inserted
        // document; repeating them in $setOnInsert is a write conflict.
        insert.remove("student_id");
        insert.remove("assessment_id");
        insert.remove("state");
        let update = doc! { "$setOnInsert": insert };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let stored = retry_async_with_config(RetryConfig::default(), || async {
            track_db_operation("find_one_and_update", "attempts", async {
                self.collection
                    .find_one_and_update(filter.clone(), update.clone())
                    .with_options(options.clone())
                    .await
                    .context("Failed to find-or-create open attempt")
            })
            .await
        })
        .await?
        .ok_or_else(|| anyhow!("Attempt upsert returned no document"))?;

        let created = stored.id == fresh.id;
        Ok((stored, created))
    }

    async fn find_by_id(&self, attempt_id: &str) -> Result<Option<Attempt>> {
        retry_async_with_config(RetryConfig::default(), || async {
            track_db_operation("find_one", "attempts", async {
                self.collection
                    .find_one(doc! { "_id": attempt_id })
                    .await
                    .context("Failed to query attempt")
            })
            .await
        })
        .await
    }

    async fn find_latest(
        &self,
        student_id: &str,
        assessment_id: &str,
    ) -> Result<Option<Attempt>> {
        let attempts: Vec<Attempt> = retry_async_with_config(RetryConfig::default(), || async {
            track_db_operation("find", "attempts", async {
                let cursor = self
                    .collection
                    .find(doc! { "student_id": student_id, "assessment_id": assessment_id })
                    .await
                    .context("Failed to query attempts for pair")?;
                cursor
                    .try_collect()
                    .await
                    .context("Failed to read attempts cursor")
            })
            .await
        })
        .await?;

        // A pair accumulates at most a handful of records; pick in process
        // rather than relying on the encoding order of stored timestamps.
        Ok(attempts.into_iter().max_by_key(|a| a.started_at))
    }

    async fn finalize_if_in_progress(
        &self,
        attempt_id: &str,
        outcome: TerminalOutcome,
    ) -> Result<Option<Attempt>> {
        let filter = doc! { "_id": attempt_id, "state": AttemptState::InProgress.as_str() };
        let terminal =
            mongodb::bson::to_document(&outcome).context("Failed to serialize outcome")?;
        let update = doc! { "$set": terminal };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        // Safe to retry: if a prior try committed, the rerun matches nothing
        // and the caller re-reads the stored terminal attempt.
        retry_async_with_config(RetryConfig::aggressive(), || async {
            track_db_operation("find_one_and_update", "attempts", async {
                self.collection
                    .find_one_and_update(filter.clone(), update.clone())
                    .with_options(options.clone())
                    .await
                    .context("Failed to finalize attempt")
            })
            .await
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongo"
    }
}

/// Read-only view over the `assessments` collection maintained by the
/// authoring side of the portal.
pub struct MongoAssessmentCatalog {
    db: Database,
    collection: Collection<Assessment>,
}

impl MongoAssessmentCatalog {
    pub fn new(db: Database) -> Self {
        let collection = db.collection("assessments");
        Self { db, collection }
    }
}

#[async_trait]
impl AssessmentCatalog for MongoAssessmentCatalog {
    async fn fetch(&self, assessment_id: &str) -> Result<Option<Assessment>> {
        retry_async_with_config(RetryConfig::default(), || async {
            track_db_operation("find_one", "assessments", async {
                self.collection
                    .find_one(doc! { "_id": assessment_id })
                    .await
                    .context("Failed to query assessment")
            })
            .await
        })
        .await
    }

    async fn list_for_classes(&self, class_ids: &[String]) -> Result<Vec<Assessment>> {
        let filter = doc! { "active": true, "class_ids": { "$in": class_ids.to_vec() } };
        retry_async_with_config(RetryConfig::default(), || async {
            track_db_operation("find", "assessments", async {
                let cursor = self
                    .collection
                    .find(filter.clone())
                    .await
                    .context("Failed to query assessments")?;
                cursor
                    .try_collect()
                    .await
                    .context("Failed to read assessments cursor")
            })
            .await
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::Utc;
use lesson_core::model::ProgressRecord;

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row};
use crate::repository::{ProgressKey, ProgressPayload, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM progress_records
            WHERE storage_key = ?1
            ",
        )
        .bind(key.storage_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save_progress(
        &self,
        key: &ProgressKey,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let payload = ProgressPayload::from_record(record).to_json()?;

        sqlx::query(
            r"
            INSERT INTO progress_records (storage_key, learner_id, course_id, lesson_id, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.storage_key())
        .bind(key.learner.value())
        .bind(key.course.as_str())
        .bind(i64::from(key.lesson.value()))
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        tracing::debug!(key = %key.storage_key(), "saved progress record");
        Ok(())
    }
}

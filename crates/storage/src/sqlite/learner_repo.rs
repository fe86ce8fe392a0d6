use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::LearnerId;

use super::SqliteRepository;
use super::mapping::{conn, map_learner_row};
use crate::repository::{LearnerRepository, StorageError};

#[async_trait]
impl LearnerRepository for SqliteRepository {
    async fn current_learner(&self) -> Result<Option<LearnerId>, StorageError> {
        let row = sqlx::query("SELECT learner_id FROM device_learner WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_learner_row).transpose()
    }

    async fn register_learner(
        &self,
        learner: LearnerId,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO device_learner (id, learner_id, registered_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                learner_id = excluded.learner_id,
                registered_at = excluded.registered_at
            ",
        )
        .bind(learner.value())
        .bind(registered_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}

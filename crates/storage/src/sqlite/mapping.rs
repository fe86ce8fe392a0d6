use lesson_core::model::{LearnerId, ProgressRecord};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Uuid;

use crate::repository::{ProgressPayload, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    ProgressPayload::from_json(&payload).map(ProgressPayload::into_record)
}

pub(crate) fn map_learner_row(row: &SqliteRow) -> Result<LearnerId, StorageError> {
    let id: Uuid = row.try_get("learner_id").map_err(ser)?;
    Ok(LearnerId::new(id))
}

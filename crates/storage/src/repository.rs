use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{CourseId, LearnerId, LessonId, ProgressRecord, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Address of one progress record: one learner, one lesson of one course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub learner: LearnerId,
    pub course: CourseId,
    pub lesson: LessonId,
}

impl ProgressKey {
    #[must_use]
    pub fn new(learner: LearnerId, course: CourseId, lesson: LessonId) -> Self {
        Self {
            learner,
            course,
            lesson,
        }
    }

    /// Stable string key, e.g. `progress:minicourse:1:<uuid>`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("progress:{}:{}:{}", self.course, self.lesson, self.learner)
    }
}

/// Persisted shape for a progress record.
///
/// Field names match the JSON the lesson pages have always written, so a
/// payload exported from the browser loads unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    #[serde(default)]
    pub completed_sections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_text: Option<String>,
    #[serde(default)]
    pub quiz_answers: BTreeMap<u32, bool>,
}

impl ProgressPayload {
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        Self {
            completed_sections: record
                .completed_sections()
                .iter()
                .map(|s| s.as_str().to_owned())
                .collect(),
            exercise_text: record.exercise_text().map(str::to_owned),
            quiz_answers: record.quiz_answers().clone(),
        }
    }

    #[must_use]
    pub fn into_record(self) -> ProgressRecord {
        ProgressRecord::from_persisted(
            self.completed_sections.into_iter().map(SectionId::from),
            self.exercise_text,
            self.quiz_answers,
        )
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `raw` is not a valid payload.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Load/save contract for progress records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the payload is corrupt.
    async fn load_progress(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, key: &ProgressKey, record: &ProgressRecord)
    -> Result<(), StorageError>;
}

/// The learner identity bound to this device.
#[async_trait]
pub trait LearnerRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn current_learner(&self) -> Result<Option<LearnerId>, StorageError>;

    /// Bind `learner` to this device, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn register_learner(
        &self,
        learner: LearnerId,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Records are kept in their serialized form so round-trips go through the
/// same payload encoding as the SQLite backend.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<String, String>>>,
    learner: Arc<Mutex<Option<LearnerId>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw payload stored under `key`, for inspection in tests.
    #[must_use]
    pub fn raw_payload(&self, key: &ProgressKey) -> Option<String> {
        self.progress
            .lock()
            .ok()
            .and_then(|guard| guard.get(&key.storage_key()).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&key.storage_key())
            .map(|raw| ProgressPayload::from_json(raw).map(ProgressPayload::into_record))
            .transpose()
    }

    async fn save_progress(
        &self,
        key: &ProgressKey,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let raw = ProgressPayload::from_record(record).to_json()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.storage_key(), raw);
        Ok(())
    }
}

#[async_trait]
impl LearnerRepository for InMemoryRepository {
    async fn current_learner(&self) -> Result<Option<LearnerId>, StorageError> {
        let guard = self
            .learner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn register_learner(
        &self,
        learner: LearnerId,
        _registered_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .learner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(learner);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub learners: Arc<dyn LearnerRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let learners: Arc<dyn LearnerRepository> = Arc::new(repo);
        Self { progress, learners }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::time::fixed_now;

    fn key(lesson: u32) -> ProgressKey {
        ProgressKey::new(
            LearnerId::generate(),
            CourseId::new("minicourse"),
            LessonId::new(lesson),
        )
    }

    fn sample_record() -> ProgressRecord {
        let mut record = ProgressRecord::new();
        record.complete_section(SectionId::new("intro"));
        record.complete_section(SectionId::new("ex_analise"));
        record.save_exercise("Observei tensão nos ombros.");
        record.save_quiz_answer(0, true);
        record.save_quiz_answer(2, false);
        record
    }

    #[test]
    fn storage_key_is_stable() {
        let learner: LearnerId = "6f1c2a4e-0000-4000-8000-000000000001".parse().unwrap();
        let key = ProgressKey::new(learner, CourseId::new("minicourse"), LessonId::new(2));
        assert_eq!(
            key.storage_key(),
            "progress:minicourse:2:6f1c2a4e-0000-4000-8000-000000000001"
        );
    }

    #[test]
    fn payload_uses_camel_case_fields() {
        let json = ProgressPayload::from_record(&sample_record()).to_json().unwrap();
        assert!(json.contains("\"completedSections\""));
        assert!(json.contains("\"exerciseText\""));
        assert!(json.contains("\"quizAnswers\":{\"0\":true,\"2\":false}"));
    }

    #[test]
    fn payload_tolerates_missing_fields_and_order() {
        let payload =
            ProgressPayload::from_json(r#"{ "completedSections": ["quiz_1", "intro", "intro"] }"#)
                .unwrap();
        let record = payload.into_record();
        assert_eq!(record.completed_sections().len(), 2);
        assert!(record.is_section_completed(&SectionId::new("intro")));
        assert!(record.exercise_text().is_none());
        assert!(record.quiz_answers().is_empty());
    }

    #[test]
    fn corrupt_payload_is_a_serialization_error() {
        let err = ProgressPayload::from_json("{ nope").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn round_trips_progress_record() {
        let repo = InMemoryRepository::new();
        let key = key(1);
        let record = sample_record();
        repo.save_progress(&key, &record).await.unwrap();

        let loaded = repo.load_progress(&key).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(repo.load_progress(&self::key(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remembers_registered_learner() {
        let repo = InMemoryRepository::new();
        assert!(repo.current_learner().await.unwrap().is_none());
        let learner = LearnerId::generate();
        repo.register_learner(learner, fixed_now()).await.unwrap();
        assert_eq!(repo.current_learner().await.unwrap(), Some(learner));
    }
}

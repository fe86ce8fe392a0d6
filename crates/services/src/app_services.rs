use std::sync::Arc;

use lesson_core::model::{CourseId, LearnerId, LessonCatalog, LessonDocument, LessonId};
use storage::repository::{LearnerRepository, ProgressKey, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_tracker::ProgressTracker;
use crate::schedule_service::LessonScheduleService;
use crate::sections::SectionRegistry;

/// Assembles app-facing services and resolves the device learner.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    learner: LearnerId,
    schedule: Arc<LessonScheduleService>,
    sections: Arc<SectionRegistry>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or learner setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: LessonCatalog,
        learner: Option<LearnerId>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(storage, clock, catalog, learner).await
    }

    /// Build services backed by in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if learner setup fails.
    pub async fn in_memory(
        clock: Clock,
        catalog: LessonCatalog,
        learner: Option<LearnerId>,
    ) -> Result<Self, AppServicesError> {
        Self::with_storage(Storage::in_memory(), clock, catalog, learner).await
    }

    async fn with_storage(
        storage: Storage,
        clock: Clock,
        catalog: LessonCatalog,
        learner: Option<LearnerId>,
    ) -> Result<Self, AppServicesError> {
        let learner = ensure_learner(storage.learners.as_ref(), clock, learner).await;
        let schedule = Arc::new(LessonScheduleService::new(clock, Arc::new(catalog)));

        Ok(Self {
            clock,
            storage,
            learner,
            schedule,
            sections: Arc::new(SectionRegistry::with_defaults()),
        })
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn learner(&self) -> LearnerId {
        self.learner
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn schedule(&self) -> Arc<LessonScheduleService> {
        Arc::clone(&self.schedule)
    }

    #[must_use]
    pub fn sections(&self) -> Arc<SectionRegistry> {
        Arc::clone(&self.sections)
    }

    /// Open the progress tracker for one lesson of the device learner, using
    /// the lesson's badge ladder when the document declares one.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Schedule` if the lesson is not in the catalog.
    pub async fn open_lesson(
        &self,
        course: &CourseId,
        lesson: LessonId,
        document: &LessonDocument,
    ) -> Result<ProgressTracker, AppServicesError> {
        self.schedule.resolve(course, lesson)?;
        let key = ProgressKey::new(self.learner, course.clone(), lesson);
        Ok(
            ProgressTracker::for_document(key, document, Arc::clone(&self.storage.progress))
                .await,
        )
    }
}

/// Resolve the learner for this device.
///
/// Storage failures fall back to a learner kept for this session only.
async fn ensure_learner(
    learners: &dyn LearnerRepository,
    clock: Clock,
    requested: Option<LearnerId>,
) -> LearnerId {
    let current = match learners.current_learner().await {
        Ok(current) => current,
        Err(err) => {
            let learner = requested.unwrap_or_else(LearnerId::generate);
            tracing::warn!(
                error = %err,
                %learner,
                "cannot read device learner, using a session-only learner"
            );
            return learner;
        }
    };

    if let Some(existing) = current.filter(|c| requested.is_none_or(|r| r == *c)) {
        return existing;
    }

    let learner = requested.unwrap_or_else(LearnerId::generate);
    match learners.register_learner(learner, clock.now()).await {
        Ok(()) => tracing::info!(%learner, "registered device learner"),
        Err(err) => tracing::warn!(
            error = %err,
            %learner,
            "cannot store device learner, it will not survive a restart"
        ),
    }
    learner
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use lesson_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StorageError};

    const CATALOG: &str = r#"{
        "courses": [ { "id": "minicourse", "title": "Minicurso" } ],
        "lessons": [ { "id": 1, "title": "Fundamentos", "course_id": "minicourse" } ]
    }"#;

    fn catalog() -> LessonCatalog {
        LessonCatalog::from_json(CATALOG).unwrap()
    }

    struct UnreachableLearners;

    #[async_trait]
    impl LearnerRepository for UnreachableLearners {
        async fn current_learner(&self) -> Result<Option<LearnerId>, StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }

        async fn register_learner(
            &self,
            _learner: LearnerId,
            _registered_at: DateTime<Utc>,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }
    }

    struct ReadOnlyLearners;

    #[async_trait]
    impl LearnerRepository for ReadOnlyLearners {
        async fn current_learner(&self) -> Result<Option<LearnerId>, StorageError> {
            Ok(None)
        }

        async fn register_learner(
            &self,
            _learner: LearnerId,
            _registered_at: DateTime<Utc>,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("readonly database".into()))
        }
    }

    fn storage_with(learners: Arc<dyn LearnerRepository>) -> Storage {
        Storage {
            progress: Arc::new(InMemoryRepository::new()),
            learners,
        }
    }

    #[tokio::test]
    async fn reuses_registered_learner() {
        let storage = Storage::in_memory();
        let first = AppServices::with_storage(storage.clone(), fixed_clock(), catalog(), None)
            .await
            .unwrap();
        let second = AppServices::with_storage(storage, fixed_clock(), catalog(), None)
            .await
            .unwrap();
        assert_eq!(first.learner(), second.learner());
    }

    #[tokio::test]
    async fn explicit_learner_replaces_device_learner() {
        let storage = Storage::in_memory();
        let requested = LearnerId::generate();
        let services =
            AppServices::with_storage(storage.clone(), fixed_clock(), catalog(), Some(requested))
                .await
                .unwrap();
        assert_eq!(services.learner(), requested);
        assert_eq!(
            storage.learners.current_learner().await.unwrap(),
            Some(requested)
        );
    }

    #[tokio::test]
    async fn unreadable_learner_store_uses_session_learner() {
        let storage = storage_with(Arc::new(UnreachableLearners));
        let first = AppServices::with_storage(storage.clone(), fixed_clock(), catalog(), None)
            .await
            .unwrap();
        let second = AppServices::with_storage(storage.clone(), fixed_clock(), catalog(), None)
            .await
            .unwrap();
        assert_ne!(first.learner(), second.learner());

        let requested = LearnerId::generate();
        let services = AppServices::with_storage(storage, fixed_clock(), catalog(), Some(requested))
            .await
            .unwrap();
        assert_eq!(services.learner(), requested);
    }

    #[tokio::test]
    async fn unwritable_learner_store_still_opens_lessons() {
        let storage = storage_with(Arc::new(ReadOnlyLearners));
        let services = AppServices::with_storage(storage, fixed_clock(), catalog(), None)
            .await
            .unwrap();
        let doc = LessonDocument::from_json(r#"{ "sections": [ { "type": "intro" } ] }"#).unwrap();
        let mut tracker = services
            .open_lesson(&CourseId::new("minicourse"), LessonId::new(1), &doc)
            .await
            .unwrap();
        assert!(tracker.start_study().await);
        assert_eq!(tracker.progress_percentage(), 100);
    }

    #[tokio::test]
    async fn open_lesson_rejects_unknown_lesson() {
        let services = AppServices::in_memory(fixed_clock(), catalog(), None)
            .await
            .unwrap();
        let doc = LessonDocument::from_json(r#"{ "sections": [] }"#).unwrap();
        let err = services
            .open_lesson(&CourseId::new("minicourse"), LessonId::new(7), &doc)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppServicesError::Schedule(_)));
    }

    #[tokio::test]
    async fn open_lesson_uses_lesson_badges() {
        let services = AppServices::in_memory(fixed_clock(), catalog(), None)
            .await
            .unwrap();
        let doc = LessonDocument::from_json(
            r#"{
                "sections": [
                    { "type": "intro" },
                    { "type": "text_block", "id": "s2", "title": "Leitura" }
                ],
                "badges": [
                    { "name": "iniciante", "min_percentage": 0, "label": "Observador" },
                    { "name": "detetive", "min_percentage": 50, "label": "Leitor de Rostos" }
                ]
            }"#,
        )
        .unwrap();
        let mut tracker = services
            .open_lesson(&CourseId::new("minicourse"), LessonId::new(1), &doc)
            .await
            .unwrap();
        tracker.start_study().await;
        assert_eq!(tracker.current_badge().display_label(), "Leitor de Rostos");
    }
}

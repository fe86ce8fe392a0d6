use lesson_core::model::{CourseId, LearnerId, LessonId, ProgressRecord, SectionId};
use lesson_core::time::fixed_now;
use storage::repository::{ProgressKey, ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;

fn key(learner: LearnerId, lesson: u32) -> ProgressKey {
    ProgressKey::new(learner, CourseId::new("minicourse"), LessonId::new(lesson))
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::generate();
    let key = key(learner, 1);
    assert!(repo.load_progress(&key).await.unwrap().is_none());

    let mut record = ProgressRecord::new();
    record.complete_section(SectionId::new("intro"));
    record.complete_section(SectionId::new("quiz_1"));
    record.save_exercise("Postura fechada, ombros elevados.");
    record.save_quiz_answer(0, true);
    repo.save_progress(&key, &record).await.unwrap();

    let fetched = repo.load_progress(&key).await.unwrap().expect("record");
    assert_eq!(fetched, record);

    // Overwrite keeps a single row per key.
    record.save_quiz_answer(0, false);
    repo.save_progress(&key, &record).await.unwrap();
    let fetched = repo.load_progress(&key).await.unwrap().expect("record");
    assert_eq!(fetched.quiz_answer(0), Some(false));

    let other_lesson = repo.load_progress(&self::key(learner, 2)).await.unwrap();
    assert!(other_lesson.is_none());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate_twice?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn sqlite_storage_remembers_device_learner() {
    let storage = Storage::sqlite("sqlite:file:memdb_learner?mode=memory&cache=shared")
        .await
        .expect("storage");

    assert!(storage.learners.current_learner().await.unwrap().is_none());

    let learner = LearnerId::generate();
    storage
        .learners
        .register_learner(learner, fixed_now())
        .await
        .unwrap();
    assert_eq!(storage.learners.current_learner().await.unwrap(), Some(learner));

    let replacement = LearnerId::generate();
    storage
        .learners
        .register_learner(replacement, fixed_now())
        .await
        .unwrap();
    assert_eq!(
        storage.learners.current_learner().await.unwrap(),
        Some(replacement)
    );
}

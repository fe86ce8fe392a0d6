use std::path::PathBuf;

use lesson_core::model::{CourseId, LessonId};
use lesson_core::time::fixed_clock;
use services::{AppServices, CatalogLoadError, load_catalog, load_lesson_document};

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[tokio::test]
async fn loads_demo_catalog_and_lesson() {
    let catalog = load_catalog(demos().join("catalog.json")).await.unwrap();
    assert_eq!(catalog.courses().len(), 2);
    assert_eq!(
        catalog.course_lessons(&CourseId::new("minicourse")).count(),
        3
    );

    let doc = load_lesson_document(demos().join("aula_1.json")).await.unwrap();
    assert_eq!(doc.metadata.title, "Fundamentos da Leitura Corporal");
    assert_eq!(doc.required_section_ids().len(), 7);

    let services = AppServices::in_memory(fixed_clock(), catalog, None)
        .await
        .unwrap();
    let schedule = services.schedule();
    assert!(schedule
        .is_available(&CourseId::new("minicourse"), LessonId::new(1))
        .unwrap());
    assert_eq!(
        schedule
            .release_label(&CourseId::new("minicourse"), LessonId::new(2))
            .unwrap(),
        "03/12/2025 às 20:00"
    );
}

#[tokio::test]
async fn missing_file_reports_path() {
    let err = load_catalog(demos().join("missing.json")).await.unwrap_err();
    match err {
        CatalogLoadError::Io { path, .. } => assert!(path.ends_with("missing.json")),
        other => panic!("unexpected error: {other}"),
    }
}

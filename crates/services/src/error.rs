//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use lesson_core::model::{CatalogParseError, ContentError, CourseId, LessonId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while reading catalog or lesson files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogParseError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors emitted by `LessonScheduleService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleError {
    #[error("unknown course {0}")]
    UnknownCourse(CourseId),
    #[error("lesson {lesson} does not exist in course {course}")]
    UnknownLesson { course: CourseId, lesson: LessonId },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_loader;
pub mod countdown;
pub mod error;
pub mod progress_tracker;
pub mod schedule_service;
pub mod sections;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use catalog_loader::{load_catalog, load_lesson_document};
pub use countdown::{CountdownHandle, CountdownTicker};
pub use error::{AppServicesError, CatalogLoadError, ScheduleError};
pub use progress_tracker::{PersistenceNotice, ProgressSnapshot, ProgressTracker};
pub use schedule_service::LessonScheduleService;
pub use sections::{OutlineItem, SectionHandler, SectionOutline, SectionRegistry};

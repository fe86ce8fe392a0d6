mod badge;
mod catalog;
pub mod content;
mod ids;
mod progress;

pub use badge::{BadgeError, BadgeLadder, BadgeTier};
pub use catalog::{
    CatalogError, CatalogParseError, Course, CourseAccess, LessonCatalog, LessonDescriptor,
    Module, parse_release_date,
};
pub use content::{ContentError, LessonDocument, Section, SectionKind};
pub use ids::{CourseId, LearnerId, LessonId, ModuleId, ParseIdError, SectionId};
pub use progress::ProgressRecord;

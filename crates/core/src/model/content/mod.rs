pub mod document;
pub mod section;

pub use document::{ContentError, LessonDocument, LessonMetadata};
pub use section::{MediaItem, QuizQuestion, Section, SectionKind, Tab, TabCard};

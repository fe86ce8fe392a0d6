use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::availability::ReleaseDateFormat;
use crate::model::ids::{CourseId, LessonId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid UTC offset: {0}")]
    InvalidOffset(String),

    #[error("invalid release date format pattern: {0}")]
    InvalidReleaseFormat(String),

    #[error("lesson {lesson} has an unparsable release date: {raw}")]
    InvalidReleaseDate { lesson: LessonId, raw: String },

    #[error("lesson {lesson} appears twice in course {course}")]
    DuplicateLesson { course: CourseId, lesson: LessonId },

    #[error("course {0} is declared twice")]
    DuplicateCourse(CourseId),

    #[error("{owner} references unknown course {course}")]
    UnknownCourse { owner: String, course: CourseId },

    #[error("lesson {lesson} references unknown module {module}")]
    UnknownModule { lesson: LessonId, module: ModuleId },
}

//
// ─── DOMAIN TYPES ──────────────────────────────────────────────────────────────
//

/// Static metadata for one lesson. Never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDescriptor {
    pub id: LessonId,
    pub title: String,
    pub duration: String,
    pub release_at: Option<DateTime<Utc>>,
    pub course_id: CourseId,
    pub module_id: Option<ModuleId>,
}

impl LessonDescriptor {
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        duration: impl Into<String>,
        course_id: CourseId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            duration: duration.into(),
            release_at: None,
            course_id,
            module_id: None,
        }
    }

    #[must_use]
    pub fn with_release(mut self, release_at: DateTime<Utc>) -> Self {
        self.release_at = Some(release_at);
        self
    }

    #[must_use]
    pub fn with_module(mut self, module_id: ModuleId) -> Self {
        self.module_id = Some(module_id);
        self
    }
}

/// How a course decides whether lesson content may be shown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CourseAccess {
    /// Lessons open on their release date; preview lessons are always open.
    Scheduled {
        #[serde(default)]
        preview_lessons: Vec<LessonId>,
    },
    /// Content requires an enrollment and stays locked in preview mode.
    Enrollment,
}

impl Default for CourseAccess {
    fn default() -> Self {
        Self::Scheduled {
            preview_lessons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub access: CourseAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
}

/// All courses, modules and lessons known to the viewer, in authoring order.
#[derive(Debug, Clone)]
pub struct LessonCatalog {
    courses: Vec<Course>,
    modules: Vec<Module>,
    lessons: Vec<LessonDescriptor>,
    release_format: ReleaseDateFormat,
}

impl LessonCatalog {
    /// Assemble a catalog from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when courses repeat, lessons repeat within a
    /// course, or a lesson or module points at a course or module that does
    /// not exist. A lesson's module must belong to the lesson's course.
    pub fn new(
        courses: Vec<Course>,
        modules: Vec<Module>,
        lessons: Vec<LessonDescriptor>,
        release_format: ReleaseDateFormat,
    ) -> Result<Self, CatalogError> {
        for (i, course) in courses.iter().enumerate() {
            if courses[..i].iter().any(|c| c.id == course.id) {
                return Err(CatalogError::DuplicateCourse(course.id.clone()));
            }
        }

        let known_course = |id: &CourseId| courses.iter().any(|c| &c.id == id);

        for module in &modules {
            if !known_course(&module.course_id) {
                return Err(CatalogError::UnknownCourse {
                    owner: format!("module {}", module.id),
                    course: module.course_id.clone(),
                });
            }
        }

        for (i, lesson) in lessons.iter().enumerate() {
            if !known_course(&lesson.course_id) {
                return Err(CatalogError::UnknownCourse {
                    owner: format!("lesson {}", lesson.id),
                    course: lesson.course_id.clone(),
                });
            }
            if let Some(module) = lesson.module_id {
                if !modules
                    .iter()
                    .any(|m| m.id == module && m.course_id == lesson.course_id)
                {
                    return Err(CatalogError::UnknownModule {
                        lesson: lesson.id,
                        module,
                    });
                }
            }
            if lessons[..i]
                .iter()
                .any(|l| l.id == lesson.id && l.course_id == lesson.course_id)
            {
                return Err(CatalogError::DuplicateLesson {
                    course: lesson.course_id.clone(),
                    lesson: lesson.id,
                });
            }
        }

        Ok(Self {
            courses,
            modules,
            lessons,
            release_format,
        })
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `CatalogParseError` for malformed JSON or invalid catalog contents.
    pub fn from_json(raw: &str) -> Result<Self, CatalogParseError> {
        let doc: CatalogDocument = serde_json::from_str(raw)?;
        Ok(doc.into_catalog()?)
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn lessons(&self) -> &[LessonDescriptor] {
        &self.lessons
    }

    #[must_use]
    pub fn release_format(&self) -> &ReleaseDateFormat {
        &self.release_format
    }

    #[must_use]
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn lesson_in_course(&self, course: &CourseId, id: LessonId) -> Option<&LessonDescriptor> {
        self.lessons
            .iter()
            .find(|l| l.id == id && &l.course_id == course)
    }

    pub fn course_lessons<'a>(
        &'a self,
        course: &'a CourseId,
    ) -> impl Iterator<Item = &'a LessonDescriptor> + 'a {
        self.lessons.iter().filter(move |l| &l.course_id == course)
    }

    pub fn course_modules<'a>(
        &'a self,
        course: &'a CourseId,
    ) -> impl Iterator<Item = &'a Module> + 'a {
        self.modules.iter().filter(move |m| &m.course_id == course)
    }
}

//
// ─── JSON SHAPE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogParseError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default = "default_offset")]
    utc_offset: String,
    #[serde(default)]
    release_format: Option<String>,
    courses: Vec<CourseEntry>,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
    lessons: Vec<LessonEntry>,
}

#[derive(Debug, Deserialize)]
struct CourseEntry {
    id: CourseId,
    title: String,
    #[serde(default)]
    access: CourseAccess,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    id: ModuleId,
    course_id: CourseId,
    title: String,
}

#[derive(Debug, Deserialize)]
struct LessonEntry {
    id: LessonId,
    title: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    release_date: Option<String>,
    course_id: CourseId,
    #[serde(default)]
    module_id: Option<ModuleId>,
}

fn default_offset() -> String {
    "+00:00".to_owned()
}

impl CatalogDocument {
    fn into_catalog(self) -> Result<LessonCatalog, CatalogError> {
        let offset: FixedOffset = self
            .utc_offset
            .parse()
            .map_err(|_| CatalogError::InvalidOffset(self.utc_offset.clone()))?;
        let release_format = match self.release_format {
            Some(pattern) => ReleaseDateFormat::new(offset, pattern)?,
            None => ReleaseDateFormat::with_offset(offset),
        };

        let courses = self
            .courses
            .into_iter()
            .map(|c| Course {
                id: c.id,
                title: c.title,
                access: c.access,
            })
            .collect();
        let modules = self
            .modules
            .into_iter()
            .map(|m| Module {
                id: m.id,
                course_id: m.course_id,
                title: m.title,
            })
            .collect();
        let lessons = self
            .lessons
            .into_iter()
            .map(|l| {
                let release_at = l
                    .release_date
                    .as_deref()
                    .filter(|raw| !raw.trim().is_empty())
                    .map(|raw| {
                        parse_release_date(raw, offset).ok_or_else(|| {
                            CatalogError::InvalidReleaseDate {
                                lesson: l.id,
                                raw: raw.to_owned(),
                            }
                        })
                    })
                    .transpose()?;
                Ok(LessonDescriptor {
                    id: l.id,
                    title: l.title,
                    duration: l.duration,
                    release_at,
                    course_id: l.course_id,
                    module_id: l.module_id,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        LessonCatalog::new(courses, modules, lessons, release_format)
    }
}

/// Parse a release timestamp.
///
/// RFC 3339 values carry their own offset; naive `YYYY-MM-DDTHH:MM[:SS]`
/// values are read as wall-clock time at `local`.
#[must_use]
pub fn parse_release_date(raw: &str, local: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| naive.and_local_timezone(local).single())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CATALOG: &str = r#"{
        "utc_offset": "-03:00",
        "courses": [
            { "id": "minicourse", "title": "Minicurso", "access": { "kind": "scheduled", "preview_lessons": [1] } },
            { "id": "formation", "title": "Formação", "access": { "kind": "enrollment" } }
        ],
        "modules": [ { "id": 1, "course_id": "minicourse", "title": "Módulo 1" } ],
        "lessons": [
            { "id": 1, "title": "Fundamentos", "duration": "45 min", "release_date": "2025-12-01T20:00:00", "course_id": "minicourse", "module_id": 1 },
            { "id": 2, "title": "Lateralidade", "duration": "50 min", "release_date": "2025-12-03T20:00:00-03:00", "course_id": "minicourse", "module_id": 1 },
            { "id": 1, "title": "Aula Formação", "course_id": "formation" }
        ]
    }"#;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn naive_release_dates_use_catalog_offset() {
        let catalog = LessonCatalog::from_json(CATALOG).unwrap();
        let lesson = catalog
            .lesson_in_course(&CourseId::new("minicourse"), LessonId::new(1))
            .unwrap();
        assert_eq!(
            lesson.release_at,
            Some(Utc.with_ymd_and_hms(2025, 12, 1, 23, 0, 0).unwrap())
        );
    }

    #[test]
    fn lesson_ids_are_scoped_to_course() {
        let catalog = LessonCatalog::from_json(CATALOG).unwrap();
        let formation = CourseId::new("formation");
        assert_eq!(catalog.course_lessons(&formation).count(), 1);
        let lesson = catalog.lesson_in_course(&formation, LessonId::new(1)).unwrap();
        assert!(lesson.release_at.is_none());
        assert!(matches!(
            catalog.course(&formation).unwrap().access,
            CourseAccess::Enrollment
        ));
    }

    #[test]
    fn rejects_unparsable_release_date() {
        let raw = CATALOG.replace("2025-12-03T20:00:00-03:00", "next tuesday");
        let err = LessonCatalog::from_json(&raw).unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::Catalog(CatalogError::InvalidReleaseDate { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_lesson_in_course() {
        let minicourse = CourseId::new("minicourse");
        let course = Course {
            id: minicourse.clone(),
            title: "Minicurso".into(),
            access: CourseAccess::default(),
        };
        let lesson = LessonDescriptor::new(LessonId::new(1), "A", "", minicourse.clone());
        let err = LessonCatalog::new(
            vec![course],
            Vec::new(),
            vec![lesson.clone(), lesson],
            ReleaseDateFormat::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateLesson {
                course: minicourse,
                lesson: LessonId::new(1)
            }
        );
    }

    #[test]
    fn rejects_unknown_course() {
        let lesson = LessonDescriptor::new(LessonId::new(1), "A", "", CourseId::new("ghost"));
        let format = ReleaseDateFormat::default();
        let err = LessonCatalog::new(Vec::new(), Vec::new(), vec![lesson], format).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCourse { .. }));
    }

    #[test]
    fn rejects_module_of_another_course() {
        let raw = CATALOG.replace(
            r#""title": "Aula Formação", "course_id": "formation""#,
            r#""title": "Aula Formação", "course_id": "formation", "module_id": 1"#,
        );
        let err = LessonCatalog::from_json(&raw).unwrap_err();
        assert!(matches!(
            err,
            CatalogParseError::Catalog(CatalogError::UnknownModule { lesson, .. })
                if lesson == LessonId::new(1)
        ));
    }

    #[test]
    fn modules_are_listed_per_course() {
        let catalog = LessonCatalog::from_json(CATALOG).unwrap();
        let mini = CourseId::new("minicourse");
        let titles: Vec<_> = catalog.course_modules(&mini).map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Módulo 1"]);
        assert_eq!(catalog.course_modules(&CourseId::new("formation")).count(), 0);
    }

    #[test]
    fn parses_minute_precision_dates() {
        let parsed = parse_release_date("2025-12-03T20:00", offset()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 12, 3, 23, 0, 0).unwrap());
    }
}

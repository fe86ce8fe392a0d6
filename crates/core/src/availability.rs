//! Release-date gating for lessons.
//!
//! Everything here is a pure function of the lesson and an instant. Callers
//! must pass a fresh `now` on every render or tick; results are never cached.
//! `now` comes from the device clock, so a learner who moves their clock
//! forward sees lessons early. No server confirms the time.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::model::{CatalogError, Course, CourseAccess, LessonDescriptor};

const DEFAULT_PATTERN: &str = "%d/%m/%Y às %H:%M";

/// How release timestamps are shown to learners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDateFormat {
    offset: FixedOffset,
    pattern: String,
}

impl ReleaseDateFormat {
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidReleaseFormat` if `pattern` contains an
    /// unknown strftime specifier.
    pub fn new(offset: FixedOffset, pattern: impl Into<String>) -> Result<Self, CatalogError> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(CatalogError::InvalidReleaseFormat(pattern));
        }
        Ok(Self { offset, pattern })
    }

    /// Default pattern shown at the given offset.
    #[must_use]
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset,
            pattern: DEFAULT_PATTERN.to_owned(),
        }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[must_use]
    pub fn format(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(&self.pattern)
            .to_string()
    }
}

impl Default for ReleaseDateFormat {
    fn default() -> Self {
        Self::with_offset(Utc.fix())
    }
}

/// A lesson is available once its release instant has been reached.
///
/// Lessons without a release timestamp are always available.
#[must_use]
pub fn is_available(lesson: &LessonDescriptor, now: DateTime<Utc>) -> bool {
    lesson.release_at.is_none_or(|release| now >= release)
}

/// Human-readable release date for locked-lesson messages.
#[must_use]
pub fn format_release_date(at: DateTime<Utc>, format: &ReleaseDateFormat) -> String {
    format.format(at)
}

/// Release label for a lesson, empty when it has no release date.
#[must_use]
pub fn release_label(lesson: &LessonDescriptor, format: &ReleaseDateFormat) -> String {
    lesson
        .release_at
        .map(|at| format.format(at))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Active,
    Locked,
}

impl LessonStatus {
    #[must_use]
    pub fn of(lesson: &LessonDescriptor, now: DateTime<Utc>) -> Self {
        if is_available(lesson, now) {
            Self::Active
        } else {
            Self::Locked
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Active => "active",
            LessonStatus::Locked => "locked",
        }
    }
}

/// Whether the lesson body (video, tabs, exercises) may be shown.
///
/// Scheduled courses open preview lessons immediately and everything else on
/// release. Enrollment courses stay locked in preview mode.
#[must_use]
pub fn content_unlocked(course: &Course, lesson: &LessonDescriptor, now: DateTime<Utc>) -> bool {
    match &course.access {
        CourseAccess::Scheduled { preview_lessons } => {
            preview_lessons.contains(&lesson.id) || is_available(lesson, now)
        }
        CourseAccess::Enrollment => false,
    }
}

/// What happens when the learner picks a lesson from the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Open { path: String },
    Locked { release_label: String },
    RequiresEnrollment,
}

#[must_use]
pub fn lesson_path(lesson: &LessonDescriptor) -> String {
    format!("/aula/{}", lesson.id)
}

#[must_use]
pub fn navigate_to(
    course: &Course,
    lesson: &LessonDescriptor,
    now: DateTime<Utc>,
    format: &ReleaseDateFormat,
) -> NavigationDecision {
    match course.access {
        CourseAccess::Enrollment => NavigationDecision::RequiresEnrollment,
        CourseAccess::Scheduled { .. } if !is_available(lesson, now) => NavigationDecision::Locked {
            release_label: release_label(lesson, format),
        },
        CourseAccess::Scheduled { .. } => NavigationDecision::Open {
            path: lesson_path(lesson),
        },
    }
}

//! Derived, read-only views over the catalog: the lesson schedule and the
//! "what's next" prompt shown at the end of a lesson.

use chrono::{DateTime, Utc};

use crate::availability::{
    LessonStatus, ReleaseDateFormat, is_available, lesson_path, release_label,
};
use crate::model::{LessonDescriptor, LessonId, ModuleId};

/// What the learner should do about the lesson after the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLessonAdvisory {
    /// The next lesson is open.
    GoNow { lesson: LessonId, title: String, path: String },
    /// The next lesson is still locked; remind the learner of its release.
    Reminder {
        lesson: LessonId,
        title: String,
        release_at: Option<DateTime<Utc>>,
        release_label: String,
    },
}

impl NextLessonAdvisory {
    #[must_use]
    pub fn lesson(&self) -> LessonId {
        match self {
            Self::GoNow { lesson, .. } | Self::Reminder { lesson, .. } => *lesson,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::GoNow { .. })
    }
}

/// Advisory for the lesson with id `current + 1` in the current lesson's course.
///
/// Returns `None` when the current lesson is unknown or is the last one.
#[must_use]
pub fn next_lesson_advisory(
    lessons: &[LessonDescriptor],
    current: &LessonDescriptor,
    now: DateTime<Utc>,
    format: &ReleaseDateFormat,
) -> Option<NextLessonAdvisory> {
    let next_id = current.id.next()?;
    let next = lessons
        .iter()
        .find(|l| l.id == next_id && l.course_id == current.course_id)?;

    Some(if is_available(next, now) {
        NextLessonAdvisory::GoNow {
            lesson: next.id,
            title: next.title.clone(),
            path: lesson_path(next),
        }
    } else {
        NextLessonAdvisory::Reminder {
            lesson: next.id,
            title: next.title.clone(),
            release_at: next.release_at,
            release_label: release_label(next, format),
        }
    })
}

/// One row of the lesson schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: LessonId,
    pub title: String,
    pub duration: String,
    pub status: LessonStatus,
    /// Entry path, present only for active lessons.
    pub link: Option<String>,
    pub release_label: String,
    pub module: Option<ModuleId>,
    pub is_current: bool,
    /// Lessons before the current one are shown as done.
    pub is_past: bool,
}

/// Schedule rows for `lessons` (already filtered to one course), in order.
#[must_use]
pub fn lesson_schedule<'a>(
    lessons: impl IntoIterator<Item = &'a LessonDescriptor>,
    current: Option<LessonId>,
    now: DateTime<Utc>,
    format: &ReleaseDateFormat,
) -> Vec<ScheduleEntry> {
    lessons
        .into_iter()
        .map(|lesson| {
            let status = LessonStatus::of(lesson, now);
            ScheduleEntry {
                id: lesson.id,
                title: lesson.title.clone(),
                duration: lesson.duration.clone(),
                status,
                link: (status == LessonStatus::Active).then(|| lesson_path(lesson)),
                release_label: release_label(lesson, format),
                module: lesson.module_id,
                is_current: current == Some(lesson.id),
                is_past: current.is_some_and(|c| lesson.id < c),
            }
        })
        .collect()
}

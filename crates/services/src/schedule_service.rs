use std::sync::Arc;

use lesson_core::advisory::{
    NextLessonAdvisory, ScheduleEntry, lesson_schedule, next_lesson_advisory,
};
use lesson_core::availability::{self, NavigationDecision};
use lesson_core::countdown::{CalendarReminder, Countdown};
use lesson_core::model::{Course, CourseId, LessonCatalog, LessonDescriptor, LessonId, Module};

use crate::Clock;
use crate::error::ScheduleError;

/// Answers availability questions about catalog lessons at the clock's "now".
///
/// Nothing is cached: each call reads the clock again, so a view that polls
/// once per second sees a lesson unlock on the second it is released.
#[derive(Clone)]
pub struct LessonScheduleService {
    clock: Clock,
    catalog: Arc<LessonCatalog>,
}

impl LessonScheduleService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<LessonCatalog>) -> Self {
        Self { clock, catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &LessonCatalog {
        &self.catalog
    }

    /// Look up a course and one of its lessons.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` when either does not exist.
    pub fn resolve(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<(&Course, &LessonDescriptor), ScheduleError> {
        let course_entry = self
            .catalog
            .course(course)
            .ok_or_else(|| ScheduleError::UnknownCourse(course.clone()))?;
        let lesson_entry = self
            .catalog
            .lesson_in_course(course, lesson)
            .ok_or_else(|| ScheduleError::UnknownLesson {
                course: course.clone(),
                lesson,
            })?;
        Ok((course_entry, lesson_entry))
    }

    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn is_available(&self, course: &CourseId, lesson: LessonId) -> Result<bool, ScheduleError> {
        let (_, lesson) = self.resolve(course, lesson)?;
        Ok(availability::is_available(lesson, self.clock.now()))
    }

    /// Whether the lesson body and video may be shown.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn content_unlocked(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<bool, ScheduleError> {
        let (course, lesson) = self.resolve(course, lesson)?;
        Ok(availability::content_unlocked(course, lesson, self.clock.now()))
    }

    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn navigate(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<NavigationDecision, ScheduleError> {
        let (course, lesson) = self.resolve(course, lesson)?;
        Ok(availability::navigate_to(
            course,
            lesson,
            self.clock.now(),
            self.catalog.release_format(),
        ))
    }

    /// Modules of `course`, in authoring order.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::UnknownCourse` if the course does not exist.
    pub fn modules<'a>(&'a self, course: &'a CourseId) -> Result<Vec<&'a Module>, ScheduleError> {
        if self.catalog.course(course).is_none() {
            return Err(ScheduleError::UnknownCourse(course.clone()));
        }
        Ok(self.catalog.course_modules(course).collect())
    }

    /// Schedule rows for every lesson of `course`.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::UnknownCourse` if the course does not exist.
    pub fn schedule(
        &self,
        course: &CourseId,
        current: Option<LessonId>,
    ) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        if self.catalog.course(course).is_none() {
            return Err(ScheduleError::UnknownCourse(course.clone()));
        }
        Ok(lesson_schedule(
            self.catalog.course_lessons(course),
            current,
            self.clock.now(),
            self.catalog.release_format(),
        ))
    }

    /// # Errors
    ///
    /// Returns `ScheduleError` if the current lesson does not exist.
    pub fn next_lesson(
        &self,
        course: &CourseId,
        current: LessonId,
    ) -> Result<Option<NextLessonAdvisory>, ScheduleError> {
        let (_, lesson) = self.resolve(course, current)?;
        Ok(next_lesson_advisory(
            self.catalog.lessons(),
            lesson,
            self.clock.now(),
            self.catalog.release_format(),
        ))
    }

    /// Time left until the lesson unlocks; `None` when it has no release date.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn countdown(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<Option<Countdown>, ScheduleError> {
        let (_, lesson) = self.resolve(course, lesson)?;
        Ok(lesson
            .release_at
            .map(|release| Countdown::between(self.clock.now(), release)))
    }

    /// Calendar reminder for the lesson's release; `None` when it has no release date.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn reminder(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<Option<CalendarReminder>, ScheduleError> {
        let (course, lesson) = self.resolve(course, lesson)?;
        Ok(lesson.release_at.map(|release| {
            CalendarReminder::new(
                format!("{} - {}", lesson.title, course.title),
                format!("Aula {}: {}", lesson.id, lesson.title),
                release,
            )
        }))
    }

    /// # Errors
    ///
    /// Returns `ScheduleError` for unknown courses or lessons.
    pub fn release_label(
        &self,
        course: &CourseId,
        lesson: LessonId,
    ) -> Result<String, ScheduleError> {
        let (_, lesson) = self.resolve(course, lesson)?;
        Ok(availability::release_label(lesson, self.catalog.release_format()))
    }
}

use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::SectionId;

/// One learner's interaction with one lesson.
///
/// `completed_sections` only grows. Percentage and badge are derived on read
/// and never stored, so they cannot drift from the completed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    completed_sections: BTreeSet<SectionId>,
    exercise_text: Option<String>,
    quiz_answers: BTreeMap<u32, bool>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a record from persisted storage.
    #[must_use]
    pub fn from_persisted(
        completed_sections: impl IntoIterator<Item = SectionId>,
        exercise_text: Option<String>,
        quiz_answers: impl IntoIterator<Item = (u32, bool)>,
    ) -> Self {
        Self {
            completed_sections: completed_sections.into_iter().collect(),
            exercise_text,
            quiz_answers: quiz_answers.into_iter().collect(),
        }
    }

    /// Mark a section complete. Returns `false` when it already was.
    pub fn complete_section(&mut self, section: SectionId) -> bool {
        self.completed_sections.insert(section)
    }

    pub fn save_exercise(&mut self, text: impl Into<String>) {
        self.exercise_text = Some(text.into());
    }

    /// Record the verdict for a quiz question, replacing any earlier one.
    pub fn save_quiz_answer(&mut self, question_index: u32, is_correct: bool) {
        self.quiz_answers.insert(question_index, is_correct);
    }

    #[must_use]
    pub fn is_section_completed(&self, section: &SectionId) -> bool {
        self.completed_sections.contains(section)
    }

    #[must_use]
    pub fn completed_sections(&self) -> &BTreeSet<SectionId> {
        &self.completed_sections
    }

    #[must_use]
    pub fn exercise_text(&self) -> Option<&str> {
        self.exercise_text.as_deref()
    }

    #[must_use]
    pub fn quiz_answers(&self) -> &BTreeMap<u32, bool> {
        &self.quiz_answers
    }

    #[must_use]
    pub fn quiz_answer(&self, question_index: u32) -> Option<bool> {
        self.quiz_answers.get(&question_index).copied()
    }

    #[must_use]
    pub fn correct_answers(&self) -> usize {
        self.quiz_answers.values().filter(|ok| **ok).count()
    }

    /// Fold a previously stored record under this one.
    ///
    /// Completed sections are unioned. Answers recorded in `self` win over
    /// the stored ones, which fill in whatever `self` has not touched.
    pub fn merge_stored(&mut self, stored: ProgressRecord) {
        self.completed_sections.extend(stored.completed_sections);
        if self.exercise_text.is_none() {
            self.exercise_text = stored.exercise_text;
        }
        for (question, verdict) in stored.quiz_answers {
            self.quiz_answers.entry(question).or_insert(verdict);
        }
    }

    /// Completion percentage against `required`, rounded half up.
    ///
    /// Sections outside `required` do not count. An empty `required` list
    /// yields 0.
    #[must_use]
    pub fn percentage(&self, required: &BTreeSet<SectionId>) -> u8 {
        let total = required.len();
        if total == 0 {
            return 0;
        }
        let done = required
            .iter()
            .filter(|id| self.completed_sections.contains(*id))
            .count();
        let rounded = (200 * done + total) / (2 * total);
        u8::try_from(rounded.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(n: usize) -> BTreeSet<SectionId> {
        (1..=n).map(|i| SectionId::new(format!("s{i}"))).collect()
    }

    #[test]
    fn empty_required_is_zero() {
        let mut record = ProgressRecord::new();
        record.complete_section(SectionId::new("s1"));
        assert_eq!(record.percentage(&BTreeSet::new()), 0);
    }

    #[test]
    fn completion_is_idempotent() {
        let req = required(5);
        let mut record = ProgressRecord::new();
        assert!(record.complete_section(SectionId::new("s1")));
        assert!(record.complete_section(SectionId::new("s2")));
        let before = record.clone();
        assert!(!record.complete_section(SectionId::new("s1")));
        assert_eq!(record, before);
        assert_eq!(record.percentage(&req), 40);
        record.complete_section(SectionId::new("s3"));
        assert_eq!(record.percentage(&req), 60);
    }

    #[test]
    fn sections_outside_required_do_not_count() {
        let req = required(2);
        let mut record = ProgressRecord::new();
        record.complete_section(SectionId::new("bonus"));
        assert_eq!(record.percentage(&req), 0);
        record.complete_section(SectionId::new("s2"));
        assert_eq!(record.percentage(&req), 50);
    }

    #[test]
    fn rounds_to_nearest_percent() {
        let req = required(3);
        let mut record = ProgressRecord::new();
        record.complete_section(SectionId::new("s1"));
        assert_eq!(record.percentage(&req), 33);
        record.complete_section(SectionId::new("s2"));
        assert_eq!(record.percentage(&req), 67);
        record.complete_section(SectionId::new("s3"));
        assert_eq!(record.percentage(&req), 100);
    }

    #[test]
    fn percentage_never_decreases_while_completing() {
        let req = required(7);
        let mut record = ProgressRecord::new();
        let mut last = 0;
        for id in ["s3", "s3", "x", "s1", "s7", "s1", "s2", "s4", "s5", "s6"] {
            record.complete_section(SectionId::new(id));
            let pct = record.percentage(&req);
            assert!(pct >= last);
            last = pct;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn quiz_answers_are_overwritten_on_retry() {
        let mut record = ProgressRecord::new();
        record.save_quiz_answer(0, true);
        record.save_quiz_answer(0, false);
        assert_eq!(record.quiz_answer(0), Some(false));
        assert_eq!(record.correct_answers(), 0);
    }

    #[test]
    fn merging_stored_record_keeps_both_sides() {
        let stored = ProgressRecord::from_persisted(
            [SectionId::new("s1"), SectionId::new("s2")],
            Some("antiga".into()),
            [(0, false), (1, true)],
        );
        let mut record = ProgressRecord::new();
        record.complete_section(SectionId::new("s3"));
        record.save_quiz_answer(0, true);

        record.merge_stored(stored);
        assert_eq!(record.percentage(&required(3)), 100);
        assert_eq!(record.exercise_text(), Some("antiga"));
        assert_eq!(record.quiz_answer(0), Some(true));
        assert_eq!(record.quiz_answer(1), Some(true));
    }

    #[test]
    fn exercise_text_last_write_wins() {
        let mut record = ProgressRecord::new();
        record.save_exercise("primeira");
        record.save_exercise("segunda");
        assert_eq!(record.exercise_text(), Some("segunda"));
    }
}

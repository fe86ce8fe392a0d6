use std::collections::BTreeSet;
use std::sync::Arc;

use lesson_core::model::{BadgeLadder, BadgeTier, LessonDocument, ProgressRecord, SectionId};
use storage::repository::{ProgressKey, ProgressRepository, StorageError};

/// A storage failure the tracker absorbed instead of returning.
///
/// The in-memory record stays authoritative for the session; views may show
/// this as a non-blocking "progress not saved" hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceNotice {
    pub operation: &'static str,
    pub message: String,
}

/// Derived values shown in the lesson header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub percentage: u8,
    pub badge: BadgeTier,
    pub completed_required: usize,
    pub total_required: usize,
}

/// Tracks one learner's progress through one lesson.
///
/// Every mutation is written through to the repository before the call
/// returns. Write failures are logged and kept as a [`PersistenceNotice`];
/// they never fail the mutation.
///
/// After a failed load nothing is written until the stored record can be
/// read again and merged, so an unreadable record is never overwritten.
pub struct ProgressTracker {
    key: ProgressKey,
    required: BTreeSet<SectionId>,
    entry: Option<SectionId>,
    badges: BadgeLadder,
    record: ProgressRecord,
    repo: Arc<dyn ProgressRepository>,
    notice: Option<PersistenceNotice>,
    load_pending: bool,
}

impl ProgressTracker {
    /// Load the saved record for `key`, or start an empty one.
    ///
    /// A failed or corrupt load starts empty and is reported through
    /// [`ProgressTracker::persistence_notice`].
    pub async fn open(
        key: ProgressKey,
        required: impl IntoIterator<Item = SectionId>,
        badges: BadgeLadder,
        repo: Arc<dyn ProgressRepository>,
    ) -> Self {
        let (record, notice) = match repo.load_progress(&key).await {
            Ok(Some(record)) => {
                tracing::debug!(key = %key.storage_key(), "loaded saved progress");
                (record, None)
            }
            Ok(None) => (ProgressRecord::new(), None),
            Err(err) => {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "could not load progress, starting empty"
                );
                (ProgressRecord::new(), Some(notice("load", &err)))
            }
        };

        Self {
            key,
            required: required.into_iter().collect(),
            entry: None,
            badges,
            record,
            repo,
            load_pending: notice.is_some(),
            notice,
        }
    }

    /// Open a tracker for a lesson document: its required sections, its
    /// entry section and its badge ladder (or the minicourse one).
    pub async fn for_document(
        key: ProgressKey,
        document: &LessonDocument,
        repo: Arc<dyn ProgressRepository>,
    ) -> Self {
        let mut tracker = Self::open(
            key,
            document.required_section_ids(),
            document.badge_ladder(),
            repo,
        )
        .await;
        tracker.entry = document.entry_section_id();
        tracker
    }

    /// Mark `section` complete.
    ///
    /// Returns `false` without touching storage when it was already complete.
    pub async fn complete_section(&mut self, section: impl Into<SectionId>) -> bool {
        let section = section.into();
        if !self.record.complete_section(section.clone()) {
            return false;
        }
        tracing::debug!(key = %self.key.storage_key(), %section, "section completed");
        self.persist("complete_section").await;
        true
    }

    /// Replace the saved exercise answer. Does not complete any section.
    pub async fn save_exercise(&mut self, text: impl Into<String>) {
        self.record.save_exercise(text);
        self.persist("save_exercise").await;
    }

    /// Record whether the answer to `question_index` was correct, replacing
    /// any earlier verdict for that question.
    pub async fn save_quiz_answer(&mut self, question_index: u32, is_correct: bool) {
        self.record.save_quiz_answer(question_index, is_correct);
        self.persist("save_quiz_answer").await;
    }

    #[must_use]
    pub fn is_section_completed(&self, section: &SectionId) -> bool {
        self.record.is_section_completed(section)
    }

    /// Complete the lesson's entry section when the learner starts studying.
    ///
    /// Returns `false` if there is no entry section or it was already done.
    pub async fn start_study(&mut self) -> bool {
        match self.entry.clone() {
            Some(entry) => self.complete_section(entry).await,
            None => false,
        }
    }

    /// Save an exercise answer and count the exercise toward progress.
    pub async fn submit_exercise(
        &mut self,
        section: impl Into<SectionId>,
        text: impl Into<String>,
    ) {
        self.save_exercise(text).await;
        self.complete_section(section).await;
    }

    /// Save a quiz verdict and complete the matching `quiz_{n}` section.
    pub async fn answer_quiz(&mut self, question_index: u32, is_correct: bool) {
        self.save_quiz_answer(question_index, is_correct).await;
        self.complete_section(SectionId::quiz_question(question_index))
            .await;
    }

    /// Grade `choice` against the document's quiz and record the result.
    ///
    /// Returns the verdict, or `None` if the document has no such question.
    pub async fn answer_quiz_choice(
        &mut self,
        document: &LessonDocument,
        question_index: u32,
        choice: usize,
    ) -> Option<bool> {
        let question = document.quiz_question(usize::try_from(question_index).ok()?)?;
        let is_correct = question.is_correct(choice);
        self.answer_quiz(question_index, is_correct).await;
        Some(is_correct)
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.record.percentage(&self.required)
    }

    #[must_use]
    pub fn current_badge(&self) -> &BadgeTier {
        self.badges.select(self.progress_percentage())
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            percentage: self.progress_percentage(),
            badge: self.current_badge().clone(),
            completed_required: self
                .required
                .iter()
                .filter(|id| self.record.is_section_completed(id))
                .count(),
            total_required: self.required.len(),
        }
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    #[must_use]
    pub fn required_sections(&self) -> &BTreeSet<SectionId> {
        &self.required
    }

    /// Most recent unresolved storage failure, if any.
    #[must_use]
    pub fn persistence_notice(&self) -> Option<&PersistenceNotice> {
        self.notice.as_ref()
    }

    async fn persist(&mut self, operation: &'static str) {
        if self.load_pending && !self.reload_stored(operation).await {
            return;
        }
        match self.repo.save_progress(&self.key, &self.record).await {
            Ok(()) => self.notice = None,
            Err(err) => {
                tracing::warn!(
                    key = %self.key.storage_key(),
                    operation,
                    error = %err,
                    "progress not persisted, keeping in-memory state"
                );
                self.notice = Some(notice(operation, &err));
            }
        }
    }

    /// Merge the stored record into memory after an earlier failed load.
    /// Returns `false` while it is still unreadable.
    async fn reload_stored(&mut self, operation: &'static str) -> bool {
        match self.repo.load_progress(&self.key).await {
            Ok(stored) => {
                if let Some(stored) = stored {
                    self.record.merge_stored(stored);
                }
                self.load_pending = false;
                tracing::debug!(key = %self.key.storage_key(), "saved progress recovered");
                true
            }
            Err(err) => {
                tracing::warn!(
                    key = %self.key.storage_key(),
                    operation,
                    error = %err,
                    "saved progress still unreadable, not overwriting it"
                );
                self.notice = Some(notice(operation, &err));
                false
            }
        }
    }
}

fn notice(operation: &'static str, err: &StorageError) -> PersistenceNotice {
    PersistenceNotice {
        operation,
        message: err.to_string(),
    }
}

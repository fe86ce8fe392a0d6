use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;

use crate::model::badge::BadgeLadder;
use crate::model::content::section::{QuizQuestion, Section, SectionKind, deserialize_sections};
use crate::model::ids::SectionId;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("lesson document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LessonMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
}

/// Static content of a single lesson.
///
/// The shape is trusted: section ids are assumed unique within the lesson
/// and missing sections simply render nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LessonDocument {
    #[serde(default)]
    pub metadata: LessonMetadata,
    #[serde(default, deserialize_with = "deserialize_sections")]
    pub sections: Vec<Section>,
    #[serde(default)]
    required_sections: Option<Vec<SectionId>>,
    /// Badge vocabulary of this lesson, validated on load.
    #[serde(default)]
    badges: Option<BadgeLadder>,
}

impl LessonDocument {
    #[must_use]
    pub fn new(metadata: LessonMetadata, sections: Vec<Section>) -> Self {
        Self {
            metadata,
            sections,
            required_sections: None,
            badges: None,
        }
    }

    #[must_use]
    pub fn with_required_sections(mut self, required: Vec<SectionId>) -> Self {
        self.required_sections = Some(required);
        self
    }

    #[must_use]
    pub fn with_badges(mut self, badges: BadgeLadder) -> Self {
        self.badges = Some(badges);
        self
    }

    /// Parse a lesson document from JSON.
    ///
    /// Accepts either the bare document or a page wrapper carrying it under
    /// `lesson_content`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Json` when the input cannot be decoded,
    /// including any malformed section inside the page wrapper.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let document = match value {
            serde_json::Value::Object(mut page) if page.contains_key("lesson_content") => {
                serde_json::from_value(page.remove("lesson_content").unwrap_or_default())?
            }
            bare => serde_json::from_value(bare)?,
        };
        Ok(document)
    }

    /// The lesson's own badge ladder, if it declares one.
    #[must_use]
    pub fn badges(&self) -> Option<&BadgeLadder> {
        self.badges.as_ref()
    }

    /// Badge ladder for this lesson, falling back to the minicourse ladder.
    #[must_use]
    pub fn badge_ladder(&self) -> BadgeLadder {
        self.badges
            .clone()
            .unwrap_or_else(BadgeLadder::minicourse_default)
    }

    /// First completable id of the first section; "start study" marks it done.
    #[must_use]
    pub fn entry_section_id(&self) -> Option<SectionId> {
        self.sections
            .first()
            .and_then(|s| s.completable_ids().into_iter().next())
    }

    /// First section of the given kind.
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind() == kind)
    }

    /// Sections that count toward completion.
    ///
    /// An explicit `required_sections` list wins, even when empty. Without
    /// one, every completable item of every section counts, in document order.
    #[must_use]
    pub fn required_section_ids(&self) -> Vec<SectionId> {
        let mut seen = BTreeSet::new();
        let candidates = match &self.required_sections {
            Some(explicit) => explicit.clone(),
            None => self
                .sections
                .iter()
                .flat_map(Section::completable_ids)
                .collect(),
        };
        candidates
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Question `index` of the first quiz section.
    #[must_use]
    pub fn quiz_question(&self, index: usize) -> Option<&QuizQuestion> {
        match self.section(SectionKind::Quiz)? {
            Section::Quiz { questions, .. } => questions.get(index),
            _ => None,
        }
    }
}

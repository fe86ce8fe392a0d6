//! Section outlines: what each lesson section shows and which of its items
//! the learner has already completed.
//!
//! Handlers are looked up by [`SectionKind`]. Supporting a new section type
//! means adding a variant in the content model and registering a handler here.

use std::collections::HashMap;

use lesson_core::model::content::{Section, SectionKind};
use lesson_core::model::{LessonDocument, ProgressRecord, SectionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub id: SectionId,
    pub label: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutline {
    pub kind: SectionKind,
    pub title: String,
    pub items: Vec<OutlineItem>,
}

impl SectionOutline {
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.completed).count()
    }

    /// A section with nothing to complete counts as complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|i| i.completed)
    }
}

pub trait SectionHandler: Send + Sync {
    /// Build the outline for `section`, or `None` if there is nothing to show.
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline>;
}

fn item(id: &SectionId, label: &str, progress: &ProgressRecord) -> OutlineItem {
    OutlineItem {
        id: id.clone(),
        label: if label.is_empty() {
            id.to_string()
        } else {
            label.to_owned()
        },
        completed: progress.is_section_completed(id),
    }
}

struct IntroHandler;

impl SectionHandler for IntroHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Intro { id, title, .. } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::Intro,
            title: title.clone(),
            items: vec![item(id, title, progress)],
        })
    }
}

struct MultimediaHandler;

impl SectionHandler for MultimediaHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Multimedia { title, items } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::Multimedia,
            title: title.clone(),
            items: items
                .iter()
                .map(|m| item(&m.id, &m.title, progress))
                .collect(),
        })
    }
}

struct TabsHandler;

impl SectionHandler for TabsHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Tabs { title, tabs } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::Tabs,
            title: title.clone(),
            items: tabs
                .iter()
                .flat_map(|tab| tab.content.iter())
                .map(|card| item(&card.id, &card.title, progress))
                .collect(),
        })
    }
}

struct ExerciseHandler;

impl SectionHandler for ExerciseHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Exercise { id, title, .. } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::Exercise,
            title: title.clone(),
            items: vec![item(id, title, progress)],
        })
    }
}

struct QuizHandler;

impl SectionHandler for QuizHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Quiz { title, questions } = section else {
            return None;
        };
        if questions.is_empty() {
            return None;
        }
        let ids = section.completable_ids();
        Some(SectionOutline {
            kind: SectionKind::Quiz,
            title: title.clone(),
            items: ids
                .iter()
                .zip(questions)
                .map(|(id, q)| item(id, &q.question, progress))
                .collect(),
        })
    }
}

struct CompletionHandler;

impl SectionHandler for CompletionHandler {
    fn outline(&self, section: &Section, _progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::LessonCompletion { title, .. } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::LessonCompletion,
            title: title.clone(),
            items: Vec::new(),
        })
    }
}

/// Flat sections: one item, completed by the section's own id.
struct BlockHandler;

impl SectionHandler for BlockHandler {
    fn outline(&self, section: &Section, progress: &ProgressRecord) -> Option<SectionOutline> {
        let Section::Block { id, title, .. } = section else {
            return None;
        };
        Some(SectionOutline {
            kind: SectionKind::Block,
            title: title.clone(),
            items: vec![item(id, title, progress)],
        })
    }
}

/// Lookup table from section kind to handler.
pub struct SectionRegistry {
    handlers: HashMap<SectionKind, Box<dyn SectionHandler>>,
}

impl SectionRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with a handler for every known section kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::empty()
            .with(SectionKind::Intro, IntroHandler)
            .with(SectionKind::Multimedia, MultimediaHandler)
            .with(SectionKind::Tabs, TabsHandler)
            .with(SectionKind::Exercise, ExerciseHandler)
            .with(SectionKind::Quiz, QuizHandler)
            .with(SectionKind::LessonCompletion, CompletionHandler)
            .with(SectionKind::Block, BlockHandler)
    }

    #[must_use]
    pub fn with(mut self, kind: SectionKind, handler: impl SectionHandler + 'static) -> Self {
        self.register(kind, handler);
        self
    }

    /// Install `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: SectionKind, handler: impl SectionHandler + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    #[must_use]
    pub fn handles(&self, kind: SectionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Outlines for every section of `document` that has a handler, in order.
    #[must_use]
    pub fn outline(
        &self,
        document: &LessonDocument,
        progress: &ProgressRecord,
    ) -> Vec<SectionOutline> {
        document
            .sections
            .iter()
            .filter_map(|section| {
                self.handlers
                    .get(&section.kind())
                    .and_then(|h| h.outline(section, progress))
            })
            .collect()
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = r#"{
        "metadata": { "title": "Aula 2" },
        "sections": [
            { "type": "intro", "title": "Boas-vindas" },
            { "type": "tabs", "title": "Teoria", "tabs": [
                { "id": "fundamentos", "content": [ { "id": "card_1", "title": "Origem" } ] }
            ] },
            { "type": "testimonials" },
            { "type": "quiz", "title": "Quiz", "questions": [
                { "question": "Qual lado?", "options": ["esquerdo", "direito"], "correct_index": 0 }
            ] },
            { "type": "lesson_completion", "title": "Fim" }
        ]
    }"#;

    #[test]
    fn outlines_known_sections_in_order() {
        let doc = LessonDocument::from_json(LESSON).unwrap();
        let mut progress = ProgressRecord::new();
        progress.complete_section(SectionId::new("card_1"));

        let outlines = SectionRegistry::with_defaults().outline(&doc, &progress);
        let kinds: Vec<SectionKind> = outlines.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            [
                SectionKind::Intro,
                SectionKind::Tabs,
                SectionKind::Quiz,
                SectionKind::LessonCompletion
            ]
        );
        assert!(outlines[1].is_complete());
        assert!(!outlines[0].is_complete());
        assert_eq!(outlines[2].items[0].id, SectionId::new("quiz_1"));
        assert_eq!(outlines[2].items[0].label, "Qual lado?");
    }

    #[test]
    fn unregistered_kinds_render_nothing() {
        let doc = LessonDocument::from_json(LESSON).unwrap();
        let registry = SectionRegistry::empty().with(SectionKind::Quiz, QuizHandler);
        let outlines = registry.outline(&doc, &ProgressRecord::new());
        assert_eq!(outlines.len(), 1);
        assert!(!registry.handles(SectionKind::Tabs));
    }

    #[test]
    fn custom_handler_replaces_default() {
        struct Hidden;
        impl SectionHandler for Hidden {
            fn outline(&self, _: &Section, _: &ProgressRecord) -> Option<SectionOutline> {
                None
            }
        }

        let doc = LessonDocument::from_json(LESSON).unwrap();
        let registry = SectionRegistry::with_defaults().with(SectionKind::LessonCompletion, Hidden);
        let outlines = registry.outline(&doc, &ProgressRecord::new());
        assert!(outlines.iter().all(|o| o.kind != SectionKind::LessonCompletion));
    }

    #[test]
    fn flat_sections_outline_as_single_items() {
        let doc = LessonDocument::from_json(
            r#"{ "sections": [
                { "type": "text_block", "id": "s1", "title": "O que é microexpressão" },
                { "type": "interactive_check", "id": "s2" },
                { "type": "testimonials" }
            ] }"#,
        )
        .unwrap();
        let mut progress = ProgressRecord::new();
        progress.complete_section(SectionId::new("s1"));

        let outlines = SectionRegistry::with_defaults().outline(&doc, &progress);
        assert_eq!(outlines.len(), 2);
        assert!(outlines.iter().all(|o| o.kind == SectionKind::Block));
        assert!(outlines[0].is_complete());
        assert_eq!(outlines[0].items[0].label, "O que é microexpressão");
        assert_eq!(outlines[1].items[0].label, "s2");
        assert!(!outlines[1].is_complete());
    }
}

use serde::Deserialize;

use crate::model::ids::SectionId;

//
// ─── SECTION KINDS ─────────────────────────────────────────────────────────────
//

/// Discriminant of a [`Section`], used as the key of handler tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Intro,
    Multimedia,
    Tabs,
    Exercise,
    Quiz,
    LessonCompletion,
    Block,
    Unsupported,
}

impl SectionKind {
    /// The `type` tag used in lesson documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Intro => "intro",
            SectionKind::Multimedia => "multimedia",
            SectionKind::Tabs => "tabs",
            SectionKind::Exercise => "exercise",
            SectionKind::Quiz => "quiz",
            SectionKind::LessonCompletion => "lesson_completion",
            SectionKind::Block => "block",
            SectionKind::Unsupported => "unsupported",
        }
    }

    /// Kinds decoded from their own `type` tag. Any other tag is read as a
    /// [`Section::Block`] when it carries an id.
    const TAGGED: [SectionKind; 6] = [
        SectionKind::Intro,
        SectionKind::Multimedia,
        SectionKind::Tabs,
        SectionKind::Exercise,
        SectionKind::Quiz,
        SectionKind::LessonCompletion,
    ];
}

//
// ─── SECTION PAYLOADS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    pub id: SectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabCard {
    pub id: SectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tab {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: Vec<TabCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Whether `choice` (zero-based option index) is the correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }
}

fn intro_id() -> SectionId {
    SectionId::new("intro")
}

/// One block of a lesson document, tagged by its `type` field.
///
/// Decode through [`Section::from_value`] (lesson documents do): the derived
/// impl only knows the structured tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Intro {
        #[serde(default = "intro_id")]
        id: SectionId,
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: Option<String>,
    },
    Multimedia {
        #[serde(default)]
        title: String,
        #[serde(default)]
        items: Vec<MediaItem>,
    },
    Tabs {
        #[serde(default)]
        title: String,
        #[serde(default)]
        tabs: Vec<Tab>,
    },
    Exercise {
        id: SectionId,
        #[serde(default)]
        title: String,
        #[serde(default)]
        prompt: String,
    },
    Quiz {
        #[serde(default)]
        title: String,
        #[serde(default)]
        questions: Vec<QuizQuestion>,
    },
    LessonCompletion {
        #[serde(default)]
        title: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Flat section with any other `type` tag, completed by its own id
    /// (`text_block`, `interactive_check`, `call_to_action`, ...).
    #[serde(skip_deserializing)]
    Block {
        kind: String,
        id: SectionId,
        title: String,
    },
    /// Unknown tag without an id: renders nothing and counts for nothing.
    #[serde(skip_deserializing)]
    Unsupported,
}

#[derive(Deserialize)]
struct FlatSection {
    #[serde(default)]
    id: Option<SectionId>,
    #[serde(default)]
    title: String,
}

impl Section {
    /// Decode one section from its JSON value.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the `type` tag is missing or a
    /// structured section is malformed.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        let Some(tag) = tag.filter(|t| !SectionKind::TAGGED.iter().any(|k| k.as_str() == t))
        else {
            return serde_json::from_value(value);
        };
        let flat: FlatSection = serde_json::from_value(value)?;
        Ok(match flat.id {
            Some(id) => Section::Block {
                kind: tag,
                id,
                title: flat.title,
            },
            None => Section::Unsupported,
        })
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Intro { .. } => SectionKind::Intro,
            Section::Multimedia { .. } => SectionKind::Multimedia,
            Section::Tabs { .. } => SectionKind::Tabs,
            Section::Exercise { .. } => SectionKind::Exercise,
            Section::Quiz { .. } => SectionKind::Quiz,
            Section::LessonCompletion { .. } => SectionKind::LessonCompletion,
            Section::Block { .. } => SectionKind::Block,
            Section::Unsupported => SectionKind::Unsupported,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Section::Intro { title, .. }
            | Section::Multimedia { title, .. }
            | Section::Tabs { title, .. }
            | Section::Exercise { title, .. }
            | Section::Quiz { title, .. }
            | Section::LessonCompletion { title, .. }
            | Section::Block { title, .. } => title,
            Section::Unsupported => "",
        }
    }

    /// Ids a learner can mark complete within this section, in display order.
    #[must_use]
    pub fn completable_ids(&self) -> Vec<SectionId> {
        match self {
            Section::Intro { id, .. }
            | Section::Exercise { id, .. }
            | Section::Block { id, .. } => vec![id.clone()],
            Section::Multimedia { items, .. } => items.iter().map(|i| i.id.clone()).collect(),
            Section::Tabs { tabs, .. } => tabs
                .iter()
                .flat_map(|t| t.content.iter().map(|c| c.id.clone()))
                .collect(),
            Section::Quiz { questions, .. } => (0..questions.len())
                .map(|i| SectionId::quiz_question(u32::try_from(i).unwrap_or(u32::MAX)))
                .collect(),
            Section::LessonCompletion { .. } | Section::Unsupported => Vec::new(),
        }
    }
}

pub(crate) fn deserialize_sections<'de, D>(deserializer: D) -> Result<Vec<Section>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Vec::<serde_json::Value>::deserialize(deserializer)?
        .into_iter()
        .map(Section::from_value)
        .collect::<Result<_, _>>()
        .map_err(serde::de::Error::custom)
}

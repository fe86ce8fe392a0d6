use std::fmt;
use std::path::PathBuf;

use lesson_core::model::{CourseId, LearnerId, LessonId, SectionId};

pub const DEFAULT_DB_URL: &str = "sqlite://course.sqlite3";
pub const DEFAULT_CATALOG: &str = "catalog.json";
pub const DEFAULT_COURSE: &str = "minicourse";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidLearnerId { raw: String },
    InvalidQuizAnswer { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid lesson id: {raw}"),
            ArgsError::InvalidLearnerId { raw } => write!(f, "invalid --learner value: {raw}"),
            ArgsError::InvalidQuizAnswer { raw } => {
                write!(f, "invalid --quiz value: {raw} (expected <question>=<option>)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Schedule,
    Progress,
    Countdown,
}

impl Command {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "schedule" => Some(Self::Schedule),
            "progress" => Some(Self::Progress),
            "countdown" => Some(Self::Countdown),
            _ => None,
        }
    }
}

/// A quiz answer given on the command line as `<question>=<option>`, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizChoice {
    pub question: u32,
    pub option: usize,
}

impl QuizChoice {
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        let invalid = || ArgsError::InvalidQuizAnswer { raw: raw.to_string() };
        let (question, option) = raw.split_once('=').ok_or_else(invalid)?;
        Ok(Self {
            question: question.trim().parse().map_err(|_| invalid())?,
            option: option.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Resolved settings. Flags override `COURSE_*` environment variables,
/// which override the defaults.
#[derive(Debug, Clone)]
pub struct Args {
    pub db_url: String,
    pub catalog: PathBuf,
    pub learner: Option<LearnerId>,
    pub course: CourseId,
    pub lesson: Option<LessonId>,
    pub content: Option<PathBuf>,
    pub start: bool,
    pub complete: Vec<SectionId>,
    pub exercise: Option<(SectionId, String)>,
    pub quiz: Vec<QuizChoice>,
    pub once: bool,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_lesson(raw: String) -> Result<LessonId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidLessonId { raw })
}

fn parse_learner(raw: String) -> Result<LearnerId, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidLearnerId { raw })
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let catalog = std::env::var("COURSE_CATALOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CATALOG), PathBuf::from);
        let learner = std::env::var("COURSE_LEARNER_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(parse_learner)
            .transpose()?;

        Ok(Self {
            db_url,
            catalog,
            learner,
            course: CourseId::new(DEFAULT_COURSE),
            lesson: None,
            content: None,
            start: false,
            complete: Vec::new(),
            exercise: None,
            quiz: Vec::new(),
            once: false,
        })
    }

    pub fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--catalog" => parsed.catalog = require_value(args, "--catalog")?.into(),
                "--learner" => {
                    parsed.learner = Some(parse_learner(require_value(args, "--learner")?)?);
                }
                "--course" => parsed.course = CourseId::new(require_value(args, "--course")?),
                "--lesson" => parsed.lesson = Some(parse_lesson(require_value(args, "--lesson")?)?),
                "--content" if command == Command::Progress => {
                    parsed.content = Some(require_value(args, "--content")?.into());
                }
                "--start" if command == Command::Progress => parsed.start = true,
                "--complete" if command == Command::Progress => {
                    parsed
                        .complete
                        .push(SectionId::new(require_value(args, "--complete")?));
                }
                "--exercise" if command == Command::Progress => {
                    let section = require_value(args, "--exercise")?;
                    let text = require_value(args, "--exercise")?;
                    parsed.exercise = Some((SectionId::new(section), text));
                }
                "--quiz" if command == Command::Progress => {
                    parsed.quiz.push(QuizChoice::parse(&require_value(args, "--quiz")?)?);
                }
                "--once" if command == Command::Countdown => parsed.once = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match command {
            Command::Progress if parsed.content.is_none() => {
                return Err(ArgsError::MissingFlag { flag: "--content" });
            }
            Command::Progress | Command::Countdown if parsed.lesson.is_none() => {
                return Err(ArgsError::MissingFlag { flag: "--lesson" });
            }
            _ => {}
        }

        Ok(parsed)
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories so the pool can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_progress_flags() {
        let parsed = Args::parse(
            Command::Progress,
            &mut args(&[
                "--db",
                "sqlite::memory:",
                "--lesson",
                "2",
                "--content",
                "aula2.json",
                "--complete",
                "card_1",
                "--quiz",
                "0=1",
                "--exercise",
                "exercise_1",
                "braços cruzados",
            ]),
        )
        .unwrap();
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert_eq!(parsed.lesson, Some(LessonId::new(2)));
        assert_eq!(parsed.complete, vec![SectionId::new("card_1")]);
        assert_eq!(parsed.quiz, vec![QuizChoice { question: 0, option: 1 }]);
        assert_eq!(
            parsed.exercise,
            Some((SectionId::new("exercise_1"), "braços cruzados".to_string()))
        );
    }

    #[test]
    fn progress_requires_content() {
        let err = Args::parse(Command::Progress, &mut args(&["--lesson", "1"])).unwrap_err();
        assert!(matches!(err, ArgsError::MissingFlag { flag: "--content" }));
    }

    #[test]
    fn rejects_flags_of_other_commands() {
        let err = Args::parse(Command::Schedule, &mut args(&["--once"])).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(_)));
    }

    #[test]
    fn rejects_malformed_quiz_answer() {
        assert!(QuizChoice::parse("2").is_err());
        assert!(QuizChoice::parse("a=1").is_err());
    }

    #[test]
    fn normalizes_relative_paths() {
        let url = normalize_sqlite_url("sqlite:data/course.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/course.sqlite3"));
    }
}

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BadgeError {
    #[error("badge ladder must contain at least one tier")]
    Empty,

    #[error("badge threshold {0} exceeds 100")]
    ThresholdOutOfRange(u8),

    #[error("badge thresholds must be strictly ascending ({previous} then {next})")]
    NotAscending { previous: u8, next: u8 },

    #[error("badge name cannot be empty")]
    EmptyName,
}

/// One rung of a badge ladder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BadgeTier {
    pub min_percentage: u8,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl BadgeTier {
    pub fn new(min_percentage: u8, name: impl Into<String>) -> Self {
        Self {
            min_percentage,
            name: name.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Display label, falling back to the badge name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Ascending thresholds mapping a progress percentage to a badge.
///
/// Deserializes from a list of tiers and is validated like [`BadgeLadder::new`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<BadgeTier>")]
pub struct BadgeLadder {
    tiers: Vec<BadgeTier>,
}

impl BadgeLadder {
    /// Build a ladder from tiers ordered by ascending threshold.
    ///
    /// # Errors
    ///
    /// Returns `BadgeError` if there are no tiers, a threshold is above 100,
    /// thresholds are not strictly ascending, or a name is blank.
    pub fn new(tiers: Vec<BadgeTier>) -> Result<Self, BadgeError> {
        if tiers.is_empty() {
            return Err(BadgeError::Empty);
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tier.name.trim().is_empty() {
                return Err(BadgeError::EmptyName);
            }
            if tier.min_percentage > 100 {
                return Err(BadgeError::ThresholdOutOfRange(tier.min_percentage));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &tiers[p]) {
                if prev.min_percentage >= tier.min_percentage {
                    return Err(BadgeError::NotAscending {
                        previous: prev.min_percentage,
                        next: tier.min_percentage,
                    });
                }
            }
        }
        Ok(Self { tiers })
    }

    /// Three-tier ladder used by the minicourse lessons.
    #[must_use]
    pub fn minicourse_default() -> Self {
        Self {
            tiers: vec![
                BadgeTier::new(0, "iniciante").with_label("Estudante"),
                BadgeTier::new(40, "explorador").with_label("Analista Jr."),
                BadgeTier::new(80, "mestre").with_label("Analista Elite"),
            ],
        }
    }

    #[must_use]
    pub fn tiers(&self) -> &[BadgeTier] {
        &self.tiers
    }

    /// Tier for `percentage`: the highest threshold not above it, else the lowest tier.
    #[must_use]
    pub fn select(&self, percentage: u8) -> &BadgeTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.min_percentage <= percentage)
            .unwrap_or(&self.tiers[0])
    }
}

impl TryFrom<Vec<BadgeTier>> for BadgeLadder {
    type Error = BadgeError;

    fn try_from(tiers: Vec<BadgeTier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

//! Gameplay mistakes attributed to a player in a match.

use serde::{Deserialize, Serialize};

use super::{MatchId, MistakeId, PlayerId};

/// Mistake category. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MistakeCategory {
    Positioning,
    Mechanics,
    DecisionMaking,
    Communication,
    Macro,
}

impl MistakeCategory {
    /// All categories in canonical order. Ties between categories are
    /// broken by this order.
    pub const ALL: [MistakeCategory; 5] = [
        MistakeCategory::Positioning,
        MistakeCategory::Mechanics,
        MistakeCategory::DecisionMaking,
        MistakeCategory::Communication,
        MistakeCategory::Macro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MistakeCategory::Positioning => "positioning",
            MistakeCategory::Mechanics => "mechanics",
            MistakeCategory::DecisionMaking => "decision-making",
            MistakeCategory::Communication => "communication",
            MistakeCategory::Macro => "macro",
        }
    }

    /// Human-readable label, e.g. "Decision Making".
    pub fn label(&self) -> &'static str {
        match self {
            MistakeCategory::Positioning => "Positioning",
            MistakeCategory::Mechanics => "Mechanics",
            MistakeCategory::DecisionMaking => "Decision Making",
            MistakeCategory::Communication => "Communication",
            MistakeCategory::Macro => "Macro",
        }
    }

    /// Coaching advice attached to insights about this category.
    pub fn recommendation(&self) -> &'static str {
        match self {
            MistakeCategory::Positioning => {
                "Review vision control and spacing in team fights; drill safe positioning in scrims."
            }
            MistakeCategory::Mechanics => {
                "Schedule focused mechanics practice and review lane replays for execution errors."
            }
            MistakeCategory::DecisionMaking => {
                "Walk through key decision points in VOD review and agree on default calls."
            }
            MistakeCategory::Communication => {
                "Standardise shot-calling and pings around objective timers."
            }
            MistakeCategory::Macro => {
                "Plan wave management and objective trading before each match."
            }
        }
    }
}

impl std::fmt::Display for MistakeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MistakeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MistakeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown mistake category: {}", s))
    }
}

/// How much a mistake hurt. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

/// A single tagged, timestamped mistake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mistake {
    pub id: MistakeId,

    pub player_id: PlayerId,

    pub player_name: String,

    pub category: MistakeCategory,

    pub description: String,

    pub impact: Impact,

    /// Match the mistake happened in
    pub match_id: MatchId,

    /// In-game timestamp in seconds
    pub game_time: u32,

    /// What the mistake led to, e.g. "Lost baron"
    #[serde(default)]
    pub outcome: String,
}

impl Mistake {
    pub fn new(
        id: impl Into<MistakeId>,
        player_id: impl Into<PlayerId>,
        category: MistakeCategory,
        match_id: impl Into<MatchId>,
        game_time: u32,
    ) -> Self {
        Self {
            id: id.into(),
            player_id: player_id.into(),
            player_name: String::new(),
            category,
            description: String::new(),
            impact: Impact::Medium,
            match_id: match_id.into(),
            game_time,
            outcome: String::new(),
        }
    }

    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = outcome.into();
        self
    }
}

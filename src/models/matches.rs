//! Match records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::MatchId;

/// Outcome of a match from the team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
}

impl MatchResult {
    pub fn is_win(&self) -> bool {
        matches!(self, MatchResult::Win)
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "win"),
            MatchResult::Loss => write!(f, "loss"),
        }
    }
}

/// Objectives secured by the team during a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveCounts {
    #[serde(default)]
    pub dragons: u32,
    #[serde(default)]
    pub barons: u32,
    #[serde(default)]
    pub towers: u32,
}

/// A played match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,

    /// Calendar date the match was played
    pub date: NaiveDate,

    pub opponent: String,

    pub result: MatchResult,

    /// Match length in seconds
    pub duration: u32,

    #[serde(default)]
    pub objectives: ObjectiveCounts,
}

impl Match {
    pub fn new(
        id: impl Into<MatchId>,
        date: NaiveDate,
        opponent: impl Into<String>,
        result: MatchResult,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            opponent: opponent.into(),
            result,
            duration: 0,
            objectives: ObjectiveCounts::default(),
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_objectives(mut self, objectives: ObjectiveCounts) -> Self {
        self.objectives = objectives;
        self
    }

    pub fn is_win(&self) -> bool {
        self.result.is_win()
    }
}

/// Sort matches oldest first. Matches on the same date keep their input order.
pub fn sort_chronologically(matches: &[Match]) -> Vec<&Match> {
    let mut sorted: Vec<&Match> = matches.iter().collect();
    sorted.sort_by_key(|m| m.date);
    sorted
}

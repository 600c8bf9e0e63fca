//! Player records.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Scalar performance stats for a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub kda: f64,

    /// Win rate as a percentage (0 to 100)
    pub win_rate: f64,

    pub games_played: u32,
}

/// A player on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            stats: PlayerStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: PlayerStats) -> Self {
        self.stats = stats;
        self
    }
}

//! Performance series shown next to a player's mistake trend.
//!
//! Nothing in the match or mistake data measures per-match performance,
//! so the series comes from a pluggable source. The baseline source is
//! sample data for charting, not a measurement.

use std::collections::HashMap;

use crate::models::{HistoricalPoint, Match, Player, PlayerId};

/// Supplies a per-match performance series for a player.
pub trait PerformanceSource: Send + Sync {
    /// One point per match, in the order given.
    fn series(&self, player: &Player, matches: &[&Match]) -> Vec<HistoricalPoint>;
}

/// Repeats the player's career KDA for every match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselinePerformance;

impl PerformanceSource for BaselinePerformance {
    fn series(&self, player: &Player, matches: &[&Match]) -> Vec<HistoricalPoint> {
        let kda = if player.stats.kda.is_finite() {
            player.stats.kda
        } else {
            0.0
        };
        matches
            .iter()
            .map(|m| HistoricalPoint::new(m.date, kda))
            .collect()
    }
}

/// Serves series recorded elsewhere, e.g. imported from a stats provider.
/// Matches without a recorded value are skipped.
#[derive(Debug, Clone, Default)]
pub struct RecordedPerformance {
    series: HashMap<PlayerId, Vec<HistoricalPoint>>,
}

impl RecordedPerformance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, player_id: impl Into<PlayerId>, points: Vec<HistoricalPoint>) -> Self {
        self.series.insert(player_id.into(), points);
        self
    }
}

impl PerformanceSource for RecordedPerformance {
    fn series(&self, player: &Player, matches: &[&Match]) -> Vec<HistoricalPoint> {
        let Some(recorded) = self.series.get(&player.id) else {
            return Vec::new();
        };
        matches
            .iter()
            .filter_map(|m| {
                recorded
                    .iter()
                    .find(|p| p.date == m.date && p.value.is_finite())
                    .copied()
            })
            .collect()
    }
}

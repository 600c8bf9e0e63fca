//! Derived analysis records.
//!
//! All of these are value objects recomputed in full on every analysis
//! run; nothing here is updated incrementally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{HistoricalPoint, MatchId, MistakeCategory, PlayerId, TrendDirection, TrendInsight};

/// Team-wide direction of a mistake category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl CategoryTrend {
    /// More mistakes means performance is getting worse.
    pub fn as_direction(&self) -> TrendDirection {
        match self {
            CategoryTrend::Increasing => TrendDirection::Declining,
            CategoryTrend::Decreasing => TrendDirection::Improving,
            CategoryTrend::Stable => TrendDirection::Stable,
        }
    }
}

impl std::fmt::Display for CategoryTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryTrend::Increasing => write!(f, "increasing"),
            CategoryTrend::Decreasing => write!(f, "decreasing"),
            CategoryTrend::Stable => write!(f, "stable"),
        }
    }
}

/// A player's count and local trend for one mistake category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrendTag {
    pub category: MistakeCategory,
    pub count: u32,
    pub trend: TrendDirection,
}

/// Per-player trend summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTrendData {
    pub player_id: PlayerId,

    pub player_name: String,

    /// Mistake count per match, oldest first
    pub mistake_frequency: Vec<HistoricalPoint>,

    /// Performance series from the configured source
    pub performance_metrics: Vec<HistoricalPoint>,

    /// Percentage drop in mistakes between the older and recent windows.
    /// Negative when the player is making more mistakes.
    pub improvement_rate: f64,

    /// Up to three categories, most frequent first
    pub top_mistake_categories: Vec<CategoryTrendTag>,
}

/// Team-wide summary for one mistake category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTrendData {
    pub category: MistakeCategory,

    pub total_occurrences: u32,

    pub trend: CategoryTrend,

    /// Estimated effect on win rate, in percentage points
    pub impact_on_win_rate: f64,

    /// Date of the match with the most occurrences
    pub peak_period: Option<NaiveDate>,

    pub affected_matches: Vec<MatchId>,
}

/// A heuristic co-occurrence finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationData {
    pub pattern: String,

    /// Qualifying events divided by the pattern's denominator. Not a
    /// correlation coefficient.
    pub strength: f64,

    pub matches: Vec<MatchId>,

    pub description: String,

    pub recommendation: String,
}

/// Result of one long-term analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiMatchAnalysis {
    pub total_matches: usize,

    /// "<earliest> to <latest>", or "No data"
    pub timeframe: String,

    pub overall_trends: Vec<TrendInsight>,

    pub player_trends: Vec<PlayerTrendData>,

    pub category_trends: Vec<CategoryTrendData>,

    pub correlations: Vec<CorrelationData>,
}

impl MultiMatchAnalysis {
    /// True when there was nothing to analyze. This is a valid outcome,
    /// rendered as "no analysis available".
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }
}

//! Insights: structured, human-readable findings with quantified
//! confidence and impact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{InsightId, MatchId, PlayerId};

/// Kind of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Pattern,
    Trend,
    Correlation,
    Recommendation,
}

/// Severity of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Returns true if the insight should be surfaced prominently.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Direction of a performance trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    /// Severity attached to a win-rate trend in this direction.
    pub fn severity(&self) -> Severity {
        match self {
            TrendDirection::Declining => Severity::Critical,
            TrendDirection::Improving => Severity::Low,
            TrendDirection::Stable => Severity::Medium,
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Declining => write!(f, "declining"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Base insight shape shared by every finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: InsightId,

    #[serde(rename = "type")]
    pub insight_type: InsightType,

    pub severity: Severity,

    pub title: String,

    pub description: String,

    pub recommendation: String,

    pub affected_players: Vec<PlayerId>,

    /// How often the finding occurs (0.0 to 1.0)
    pub frequency: f64,

    /// Signed effect on win rate, in percentage points
    pub impact_on_win_rate: f64,

    /// Confidence in the finding (0.0 to 1.0)
    pub confidence: f64,
}

/// One point in a chartable series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl HistoricalPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An insight computed over a span of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendInsight {
    #[serde(flatten)]
    pub insight: Insight,

    pub matches_analyzed: Vec<MatchId>,

    pub timeframe: String,

    pub trend_direction: TrendDirection,

    pub historical_data: Vec<HistoricalPoint>,
}

//! Statistics calculation engine.
//!
//! Computes derived metrics from match, mistake and player collections:
//! - Win-rate trajectory and the team's most frequent mistake category
//! - Per-player mistake trends
//! - Per-category trends across the team
//! - Heuristic correlations between mistakes and results
//!
//! The engine is pure and infallible. Empty or degenerate input yields
//! zero-valued or empty output, never an error, and every number it
//! returns is finite.

mod categories;
mod correlations;
mod overall;
mod performance;
mod players;

pub use categories::classify_category_trend;
pub use overall::classify_win_rate_trend;
pub use performance::{BaselinePerformance, PerformanceSource, RecordedPerformance};
pub use players::classify_player_category;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    sort_chronologically, Match, MatchId, Mistake, MultiMatchAnalysis, Player, PlayerId,
};

/// Tunable thresholds of the analysis. The defaults are the values the
/// dashboard has always shipped with; none of them is statistically
/// derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Number of most recent matches forming the "recent" window
    pub recent_window: usize,

    /// Win-ratio delta beyond which a trend is improving or declining
    pub trend_threshold: f64,

    /// Matches needed before the win-rate trend gets the higher confidence
    pub confident_sample_size: usize,

    pub high_confidence: f64,

    pub low_confidence: f64,

    /// Confidence attached to the top-category insight
    pub category_confidence: f64,

    /// Frequency above which the top-category insight is critical
    pub critical_frequency: f64,

    /// Frequency above which the top-category insight is high severity
    pub high_frequency: f64,

    /// A player's category is improving when recent < older * this
    pub improving_ratio: f64,

    /// A player's category is declining when recent > older * this
    pub declining_ratio: f64,

    /// Win-rate points lost when every affected match was a loss
    pub category_impact_scale: f64,

    /// In-game seconds before which a mistake counts as early game
    pub early_game_cutoff: u32,

    /// Qualifying events a correlation needs before it is reported
    pub min_correlation_events: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            recent_window: 3,
            trend_threshold: 0.10,
            confident_sample_size: 5,
            high_confidence: 0.85,
            low_confidence: 0.65,
            category_confidence: 0.88,
            critical_frequency: 0.6,
            high_frequency: 0.4,
            improving_ratio: 0.5,
            declining_ratio: 1.5,
            category_impact_scale: -15.0,
            early_game_cutoff: 900,
            min_correlation_events: 2,
        }
    }
}

/// Divide, returning 0.0 for a zero denominator.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Win ratio of a set of matches (0.0 for none).
pub fn calculate_win_rate(matches: &[&Match]) -> f64 {
    let wins = matches.iter().filter(|m| m.is_win()).count();
    safe_ratio(wins as f64, matches.len() as f64)
}

/// Map -0.0 to 0.0 so zero impacts serialize without a sign.
pub fn normalize_zero(value: f64) -> f64 {
    value + 0.0
}

/// "<earliest> to <latest>" for chronologically sorted matches.
pub fn describe_timeframe(sorted: &[&Match]) -> String {
    match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => "No data".to_string(),
    }
}

/// Shared, precomputed view of one analysis run's input.
pub(crate) struct AnalysisContext<'a> {
    pub params: &'a AnalysisParams,

    /// Matches oldest first
    pub matches: Vec<&'a Match>,

    /// Mistakes whose match is part of `matches`
    pub mistakes: Vec<&'a Mistake>,

    pub players: &'a [Player],

    pub timeframe: String,

    positions: HashMap<&'a str, usize>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        params: &'a AnalysisParams,
        matches: &'a [Match],
        mistakes: &'a [Mistake],
        players: &'a [Player],
    ) -> Self {
        let sorted = sort_chronologically(matches);

        let mut positions = HashMap::new();
        for (idx, m) in sorted.iter().enumerate() {
            positions.entry(m.id.as_str()).or_insert(idx);
        }

        let attributable: Vec<&Mistake> = mistakes
            .iter()
            .filter(|m| positions.contains_key(m.match_id.as_str()))
            .collect();

        Self {
            params,
            timeframe: describe_timeframe(&sorted),
            matches: sorted,
            mistakes: attributable,
            players,
            positions,
        }
    }

    /// Chronological index of a match.
    pub fn position(&self, match_id: &MatchId) -> Option<usize> {
        self.positions.get(match_id.as_str()).copied()
    }

    /// Index of the first match in the recent window.
    pub fn recent_start(&self) -> usize {
        self.matches.len().saturating_sub(self.params.recent_window)
    }

    pub fn is_recent(&self, mistake: &Mistake) -> bool {
        self.position(&mistake.match_id)
            .is_some_and(|idx| idx >= self.recent_start())
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.iter().map(|m| m.id.clone()).collect()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Number of the given mistakes per match, in chronological order.
    pub fn counts_per_match(&self, mistakes: &[&Mistake]) -> Vec<u32> {
        let mut counts = vec![0u32; self.matches.len()];
        for mistake in mistakes {
            if let Some(idx) = self.position(&mistake.match_id) {
                counts[idx] += 1;
            }
        }
        counts
    }
}

/// Run the full long-term analysis with the default thresholds and the
/// baseline performance series.
pub fn analyze_long_term_trends(
    matches: &[Match],
    mistakes: &[Mistake],
    players: &[Player],
) -> MultiMatchAnalysis {
    analyze_with(
        &AnalysisParams::default(),
        &BaselinePerformance,
        matches,
        mistakes,
        players,
    )
}

/// Run the full long-term analysis.
pub fn analyze_with(
    params: &AnalysisParams,
    performance: &dyn PerformanceSource,
    matches: &[Match],
    mistakes: &[Mistake],
    players: &[Player],
) -> MultiMatchAnalysis {
    let ctx = AnalysisContext::new(params, matches, mistakes, players);

    let category_trends = categories::category_trends(&ctx);

    let mut overall_trends = Vec::new();
    if let Some(trend) = overall::win_rate_trend(&ctx) {
        overall_trends.push(trend);
    }
    if let Some(pattern) = overall::top_category_insight(&ctx, &category_trends) {
        overall_trends.push(pattern);
    }

    let player_trends = players::player_trends(&ctx, performance);
    let correlations = correlations::detect_correlations(&ctx);

    debug!(
        "Analyzed {} matches, {} attributable mistakes ({} orphaned), {} players: {} trends, {} categories, {} correlations",
        ctx.matches.len(),
        ctx.mistakes.len(),
        mistakes.len() - ctx.mistakes.len(),
        players.len(),
        overall_trends.len(),
        category_trends.len(),
        correlations.len()
    );

    MultiMatchAnalysis {
        total_matches: matches.len(),
        timeframe: ctx.timeframe.clone(),
        overall_trends,
        player_trends,
        category_trends,
        correlations,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::{MatchResult::*, MistakeCategory, TrendDirection};
    use pretty_assertions::assert_eq;

    fn assert_all_finite(analysis: &MultiMatchAnalysis) {
        for t in &analysis.overall_trends {
            assert!(t.insight.confidence.is_finite());
            assert!((0.0..=1.0).contains(&t.insight.confidence));
            assert!(t.insight.frequency.is_finite());
            assert!((0.0..=1.0).contains(&t.insight.frequency));
            assert!(t.insight.impact_on_win_rate.is_finite());
            assert!(t.historical_data.iter().all(|p| p.value.is_finite()));
        }
        for p in &analysis.player_trends {
            assert!(p.improvement_rate.is_finite());
            assert!(p.mistake_frequency.iter().all(|pt| pt.value.is_finite()));
            assert!(p.performance_metrics.iter().all(|pt| pt.value.is_finite()));
        }
        for c in &analysis.category_trends {
            assert!(c.impact_on_win_rate.is_finite());
        }
        for c in &analysis.correlations {
            assert!(c.strength.is_finite());
        }
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(3.0, 4.0), 0.75);
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_calculate_win_rate() {
        let ms = matches(&[Win, Loss, Win, Win]);
        let refs: Vec<&Match> = ms.iter().collect();
        assert_eq!(calculate_win_rate(&refs), 0.75);
        assert_eq!(calculate_win_rate(&[]), 0.0);
    }

    #[test]
    fn test_normalize_zero() {
        assert!(normalize_zero(-0.0).is_sign_positive());
        assert_eq!(normalize_zero(-7.56), -7.56);
        assert_eq!(normalize_zero(1.0 / 3.0), 1.0 / 3.0);
    }

    #[test]
    fn test_rates_are_not_rounded() {
        let ms = matches(&[Win, Win, Loss, Win, Loss, Loss]);
        let mistakes = vec![
            mistake("x1", "p1", MistakeCategory::Macro, "m1", 100),
            mistake("x2", "p1", MistakeCategory::Macro, "m2", 100),
            mistake("x3", "p1", MistakeCategory::Macro, "m3", 100),
            mistake("x4", "p1", MistakeCategory::Macro, "m4", 100),
            mistake("x5", "p1", MistakeCategory::Macro, "m5", 100),
        ];

        let analysis = analyze_long_term_trends(&ms, &mistakes, &[player("p1")]);

        // older m1..m3 won 2 of 3, recent m4..m6 won 1 of 3
        let trend = &analysis.overall_trends[0];
        assert_eq!(
            trend.insight.impact_on_win_rate,
            (1.0 / 3.0 - 2.0 / 3.0) * 100.0
        );
        assert!(trend.insight.impact_on_win_rate < -33.33);

        // 3 older mistakes, 2 recent
        let rate = analysis.player_trends[0].improvement_rate;
        assert_eq!(rate, 1.0 / 3.0 * 100.0);
        assert!(rate > 33.33);

        // m3 and m5 lost, m1 m2 m4 won
        let macro_trend = &analysis.category_trends[0];
        assert_eq!(macro_trend.impact_on_win_rate, 2.0 / 5.0 * -15.0);
    }

    #[test]
    fn test_empty_input_degrades_gracefully() {
        let analysis = analyze_long_term_trends(&[], &[], &[]);

        assert_eq!(analysis.total_matches, 0);
        assert_eq!(analysis.timeframe, "No data");
        assert!(analysis.is_empty());
        assert!(analysis.overall_trends.is_empty());
        assert!(analysis.player_trends.is_empty());
        assert!(analysis.category_trends.is_empty());
        assert!(analysis.correlations.is_empty());
    }

    #[test]
    fn test_no_matches_but_players_and_orphan_mistakes() {
        let mistakes = vec![mistake("x1", "p1", MistakeCategory::Macro, "m1", 100)];
        let players = vec![player("p1")];

        let analysis = analyze_long_term_trends(&[], &mistakes, &players);

        assert_eq!(analysis.total_matches, 0);
        assert!(analysis.category_trends.is_empty());
        assert_eq!(analysis.player_trends.len(), 1);
        assert_eq!(analysis.player_trends[0].improvement_rate, 0.0);
        assert_all_finite(&analysis);
    }

    #[test]
    fn test_total_matches_and_timeframe() {
        let mut ms = matches(&[Win, Loss, Win, Loss, Win, Win]);
        ms.reverse();

        let analysis = analyze_long_term_trends(&ms, &[], &[]);

        assert_eq!(analysis.total_matches, 6);
        assert_eq!(analysis.timeframe, "2024-03-01 to 2024-03-06");
    }

    #[test]
    fn test_small_samples_stay_finite() {
        for n in 1..=4 {
            let ms = matches(&vec![Loss; n]);
            let mistakes = vec![
                mistake("x1", "p1", MistakeCategory::Positioning, "m1", 100),
                mistake("x2", "p1", MistakeCategory::Communication, "m1", 1000),
            ];
            let analysis = analyze_long_term_trends(&ms, &mistakes, &[player("p1")]);
            assert_eq!(analysis.total_matches, n);
            assert_all_finite(&analysis);
        }
    }

    #[test]
    fn test_five_match_improving_scenario() {
        let ms = matches(&[Loss, Loss, Win, Win, Win]);
        let analysis = analyze_long_term_trends(&ms, &[], &[player("p1")]);

        let trend = &analysis.overall_trends[0];
        assert_eq!(trend.trend_direction, TrendDirection::Improving);
        assert_eq!(trend.insight.impact_on_win_rate, 100.0);
        assert_eq!(trend.insight.confidence, 0.85);
    }

    #[test]
    fn test_orphan_mistakes_are_excluded() {
        let ms = matches(&[Win, Loss]);
        let mistakes = vec![
            mistake("x1", "p1", MistakeCategory::Macro, "m2", 100),
            mistake("x2", "p1", MistakeCategory::Mechanics, "gone", 100),
        ];

        let analysis = analyze_long_term_trends(&ms, &mistakes, &[player("p1")]);

        let categories: Vec<MistakeCategory> =
            analysis.category_trends.iter().map(|c| c.category).collect();
        assert_eq!(categories, vec![MistakeCategory::Macro]);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let ms = matches(&[Loss, Win, Loss, Loss, Win, Win, Loss]);
        let mistakes = vec![
            mistake("x1", "p1", MistakeCategory::Positioning, "m1", 300),
            mistake("x2", "p2", MistakeCategory::Communication, "m3", 1300)
                .with_outcome("Lost Dragon"),
            mistake("x3", "p1", MistakeCategory::Communication, "m3", 1500)
                .with_outcome("Baron stolen"),
            mistake("x4", "p2", MistakeCategory::Macro, "m4", 600),
            mistake("x5", "p1", MistakeCategory::Positioning, "m7", 200),
        ];
        let players = vec![player("p1"), player("p2")];

        let first = analyze_long_term_trends(&ms, &mistakes, &players);
        let second = analyze_long_term_trends(&ms.clone(), &mistakes.clone(), &players.clone());

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_custom_recent_window() {
        let ms = matches(&[Loss, Loss, Loss, Win]);
        let params = AnalysisParams {
            recent_window: 1,
            ..Default::default()
        };

        let analysis = analyze_with(&params, &BaselinePerformance, &ms, &[], &[]);
        let trend = &analysis.overall_trends[0];
        assert_eq!(trend.trend_direction, TrendDirection::Improving);
        assert_eq!(trend.insight.impact_on_win_rate, 100.0);
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: AnalysisParams = toml::from_str("recent_window = 5").unwrap();
        assert_eq!(params.recent_window, 5);
        assert_eq!(params.trend_threshold, 0.10);
        assert_eq!(params.early_game_cutoff, 900);
    }
}

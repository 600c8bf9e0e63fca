//! Team-level trends: win-rate trajectory and the most frequent mistake
//! category.

use std::collections::BTreeSet;

use crate::models::{
    CategoryTrendData, EntityId, HistoricalPoint, Insight, InsightType, Match, MistakeCategory,
    Severity, TrendDirection, TrendInsight,
};

use super::{calculate_win_rate, normalize_zero, safe_ratio, AnalysisContext};

/// Classify a win-ratio change. Improving iff `recent - older > threshold`,
/// declining iff `recent - older < -threshold`, otherwise stable.
pub fn classify_win_rate_trend(recent: f64, older: f64, threshold: f64) -> TrendDirection {
    let delta = recent - older;
    if delta > threshold {
        TrendDirection::Improving
    } else if delta < -threshold {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Split chronologically sorted matches into (older, recent) windows.
///
/// The older window always holds at least the first match, so with fewer
/// than `recent_window + 1` matches the two windows overlap.
fn win_rate_windows<'m, 'a>(
    sorted: &'m [&'a Match],
    recent_window: usize,
) -> (&'m [&'a Match], &'m [&'a Match]) {
    if sorted.is_empty() {
        return (&[], &[]);
    }
    let recent = &sorted[sorted.len().saturating_sub(recent_window)..];
    let older_end = sorted.len().saturating_sub(recent_window).max(1);
    (&sorted[..older_end], recent)
}

pub(crate) fn win_rate_trend(ctx: &AnalysisContext<'_>) -> Option<TrendInsight> {
    if ctx.matches.is_empty() {
        return None;
    }
    let params = ctx.params;

    let (older, recent) = win_rate_windows(&ctx.matches, params.recent_window);
    let recent_rate = calculate_win_rate(recent);
    let older_rate = calculate_win_rate(older);

    let direction = classify_win_rate_trend(recent_rate, older_rate, params.trend_threshold);
    let confidence = if ctx.matches.len() >= params.confident_sample_size {
        params.high_confidence
    } else {
        params.low_confidence
    };

    let (title, recommendation) = match direction {
        TrendDirection::Improving => (
            "Win Rate Improving",
            "Keep the current preparation routine and lock in the habits behind recent wins.",
        ),
        TrendDirection::Declining => (
            "Win Rate Declining",
            "Review recent losses as a team and revisit draft and early-game plans.",
        ),
        TrendDirection::Stable => (
            "Win Rate Stable",
            "Target the most frequent mistake category to break out of the plateau.",
        ),
    };

    let mut wins = 0u32;
    let historical_data = ctx
        .matches
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            if m.is_win() {
                wins += 1;
            }
            HistoricalPoint::new(m.date, safe_ratio(wins as f64, (idx + 1) as f64))
        })
        .collect();

    Some(TrendInsight {
        insight: Insight {
            id: EntityId::generate(&["trend", "win-rate", &ctx.timeframe]),
            insight_type: InsightType::Trend,
            severity: direction.severity(),
            title: title.to_string(),
            description: format!(
                "Won {:.0}% of the last {} matches compared with {:.0}% over the {} before.",
                recent_rate * 100.0,
                recent.len(),
                older_rate * 100.0,
                older.len()
            ),
            recommendation: recommendation.to_string(),
            affected_players: ctx.player_ids(),
            frequency: recent_rate,
            impact_on_win_rate: normalize_zero((recent_rate - older_rate) * 100.0),
            confidence,
        },
        matches_analyzed: ctx.match_ids(),
        timeframe: ctx.timeframe.clone(),
        trend_direction: direction,
        historical_data,
    })
}

fn frequency_severity(frequency: f64, critical: f64, high: f64) -> Severity {
    if frequency > critical {
        Severity::Critical
    } else if frequency > high {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Insight about the single most frequent mistake category.
pub(crate) fn top_category_insight(
    ctx: &AnalysisContext<'_>,
    category_trends: &[CategoryTrendData],
) -> Option<TrendInsight> {
    let params = ctx.params;

    let mut top: Option<(MistakeCategory, usize)> = None;
    for category in MistakeCategory::ALL {
        let count = ctx.mistakes.iter().filter(|m| m.category == category).count();
        if count > 0 && top.map_or(true, |(_, best)| count > best) {
            top = Some((category, count));
        }
    }
    let (category, count) = top?;

    let in_category: Vec<_> = ctx
        .mistakes
        .iter()
        .copied()
        .filter(|m| m.category == category)
        .collect();
    let per_match = ctx.counts_per_match(&in_category);
    let matches_with = per_match.iter().filter(|c| **c > 0).count();
    let frequency = safe_ratio(matches_with as f64, ctx.matches.len() as f64);

    let trend = category_trends.iter().find(|t| t.category == category);
    let impact = trend.map_or(0.0, |t| t.impact_on_win_rate);
    let direction = trend.map_or(TrendDirection::Stable, |t| t.trend.as_direction());

    let affected_players: BTreeSet<_> = in_category.iter().map(|m| m.player_id.clone()).collect();

    let historical_data = ctx
        .matches
        .iter()
        .zip(per_match.iter())
        .map(|(m, c)| HistoricalPoint::new(m.date, *c as f64))
        .collect();

    Some(TrendInsight {
        insight: Insight {
            id: EntityId::generate(&["pattern", category.as_str(), &ctx.timeframe]),
            insight_type: InsightType::Pattern,
            severity: frequency_severity(
                frequency,
                params.critical_frequency,
                params.high_frequency,
            ),
            title: format!("Recurring {} Mistakes", category.label()),
            description: format!(
                "{} is the most common mistake category with {} occurrences, appearing in {:.0}% of matches.",
                category.label(),
                count,
                frequency * 100.0
            ),
            recommendation: category.recommendation().to_string(),
            affected_players: affected_players.into_iter().collect(),
            frequency,
            impact_on_win_rate: impact,
            confidence: params.category_confidence,
        },
        matches_analyzed: ctx.match_ids(),
        timeframe: ctx.timeframe.clone(),
        trend_direction: direction,
        historical_data,
    })
}

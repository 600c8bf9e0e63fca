//! Per-category mistake trends across the whole team.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{CategoryTrend, CategoryTrendData, MistakeCategory};

use super::{normalize_zero, safe_ratio, AnalysisContext};

/// Compare how many of a category's occurrences fall in the recent window
/// against half of all occurrences.
pub fn classify_category_trend(recent: u32, total: u32) -> CategoryTrend {
    let doubled = recent * 2;
    if doubled > total {
        CategoryTrend::Increasing
    } else if doubled < total {
        CategoryTrend::Decreasing
    } else {
        CategoryTrend::Stable
    }
}

pub(crate) fn category_trends(ctx: &AnalysisContext<'_>) -> Vec<CategoryTrendData> {
    let recent_start = ctx.recent_start();
    let mut trends = Vec::new();

    for category in MistakeCategory::ALL {
        let occurrences: Vec<_> = ctx
            .mistakes
            .iter()
            .copied()
            .filter(|m| m.category == category)
            .collect();
        if occurrences.is_empty() {
            continue;
        }

        let per_match = ctx.counts_per_match(&occurrences);
        let total: u32 = per_match.iter().sum();
        let recent: u32 = per_match[recent_start..].iter().sum();

        let mut affected = Vec::new();
        let mut affected_losses = 0u32;
        let mut by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for (m, count) in ctx.matches.iter().zip(per_match.iter()) {
            if *count == 0 {
                continue;
            }
            affected.push(m.id.clone());
            if !m.is_win() {
                affected_losses += 1;
            }
            *by_date.entry(m.date).or_default() += count;
        }

        // BTreeMap iterates oldest first, so ties resolve to the earliest date.
        let mut peak_period: Option<(NaiveDate, u32)> = None;
        for (date, count) in by_date {
            if peak_period.map_or(true, |(_, best)| count > best) {
                peak_period = Some((date, count));
            }
        }

        let loss_fraction = safe_ratio(affected_losses as f64, affected.len() as f64);

        trends.push(CategoryTrendData {
            category,
            total_occurrences: total,
            trend: classify_category_trend(recent, total),
            impact_on_win_rate: normalize_zero(loss_fraction * ctx.params.category_impact_scale),
            peak_period: peak_period.map(|(date, _)| date),
            affected_matches: affected,
        });
    }

    trends.sort_by(|a, b| b.total_occurrences.cmp(&a.total_occurrences));
    trends
}

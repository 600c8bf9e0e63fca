//! Per-player mistake trends.

use crate::models::{
    CategoryTrendTag, HistoricalPoint, Mistake, MistakeCategory, PlayerTrendData, TrendDirection,
};

use super::{normalize_zero, AnalysisContext, AnalysisParams, PerformanceSource};

/// Classify one of a player's categories by its recent count relative to
/// its older count.
pub fn classify_player_category(recent: u32, older: u32, params: &AnalysisParams) -> TrendDirection {
    let recent = recent as f64;
    let older = older as f64;
    if recent < older * params.improving_ratio {
        TrendDirection::Improving
    } else if recent > older * params.declining_ratio {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Percentage drop in mistakes from the older window to the recent one.
/// The older count is floored at 1 so a player with no older mistakes
/// still gets a finite rate.
fn improvement_rate(older: u32, recent: u32) -> f64 {
    let denominator = older.max(1) as f64;
    normalize_zero((older as f64 - recent as f64) / denominator * 100.0)
}

fn split_counts<'a>(ctx: &AnalysisContext<'_>, mistakes: impl Iterator<Item = &'a Mistake>) -> (u32, u32) {
    let mut recent = 0;
    let mut older = 0;
    for m in mistakes {
        if ctx.is_recent(m) {
            recent += 1;
        } else {
            older += 1;
        }
    }
    (recent, older)
}

pub(crate) fn player_trends(
    ctx: &AnalysisContext<'_>,
    performance: &dyn PerformanceSource,
) -> Vec<PlayerTrendData> {
    ctx.players
        .iter()
        .map(|player| {
            let own: Vec<&Mistake> = ctx
                .mistakes
                .iter()
                .copied()
                .filter(|m| m.player_id == player.id)
                .collect();

            let mistake_frequency = ctx
                .matches
                .iter()
                .zip(ctx.counts_per_match(&own))
                .map(|(m, count)| HistoricalPoint::new(m.date, count as f64))
                .collect();

            let (recent, older) = split_counts(ctx, own.iter().copied());

            let mut top_mistake_categories: Vec<CategoryTrendTag> = MistakeCategory::ALL
                .into_iter()
                .filter_map(|category| {
                    let (recent, older) =
                        split_counts(ctx, own.iter().copied().filter(|m| m.category == category));
                    let count = recent + older;
                    (count > 0).then(|| CategoryTrendTag {
                        category,
                        count,
                        trend: classify_player_category(recent, older, ctx.params),
                    })
                })
                .collect();
            top_mistake_categories.sort_by(|a, b| b.count.cmp(&a.count));
            top_mistake_categories.truncate(3);

            PlayerTrendData {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
                mistake_frequency,
                performance_metrics: performance.series(player, &ctx.matches),
                improvement_rate: improvement_rate(older, recent),
                top_mistake_categories,
            }
        })
        .collect()
}

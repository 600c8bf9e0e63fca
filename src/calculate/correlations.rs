//! Heuristic correlations between mistakes and match outcomes.
//!
//! Strength is a plain ratio of qualifying events to a denominator, not a
//! correlation coefficient, and can exceed 1.0 when several qualifying
//! mistakes land in the same match.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{CorrelationData, MatchId, Mistake, MistakeCategory};

use super::{safe_ratio, AnalysisContext};

pub const EARLY_GAME_PATTERN: &str = "Early Game Mistakes → Game Loss";
pub const COMMUNICATION_PATTERN: &str = "Communication Breakdown → Objective Loss";

fn objective_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)baron|dragon").unwrap())
}

/// True if the outcome text mentions losing a major objective.
pub fn mentions_objective(outcome: &str) -> bool {
    objective_regex().is_match(outcome)
}

/// Distinct match ids of the given mistakes, oldest match first.
fn distinct_matches(ctx: &AnalysisContext<'_>, mistakes: &[&Mistake]) -> Vec<MatchId> {
    let ids: HashSet<&str> = mistakes.iter().map(|m| m.match_id.as_str()).collect();
    ctx.matches
        .iter()
        .filter(|m| ids.contains(m.id.as_str()))
        .map(|m| m.id.clone())
        .collect()
}

fn early_game_losses(ctx: &AnalysisContext<'_>) -> Option<CorrelationData> {
    let cutoff = ctx.params.early_game_cutoff;

    let losses: HashSet<&str> = ctx
        .matches
        .iter()
        .filter(|m| !m.is_win())
        .map(|m| m.id.as_str())
        .collect();

    let early: Vec<&Mistake> = ctx
        .mistakes
        .iter()
        .copied()
        .filter(|m| m.game_time < cutoff && losses.contains(m.match_id.as_str()))
        .collect();

    if early.len() < ctx.params.min_correlation_events {
        return None;
    }

    Some(CorrelationData {
        pattern: EARLY_GAME_PATTERN.to_string(),
        strength: safe_ratio(early.len() as f64, losses.len() as f64),
        matches: distinct_matches(ctx, &early),
        description: format!(
            "{} mistakes before the {}-minute mark happened in matches that ended in a loss.",
            early.len(),
            cutoff / 60
        ),
        recommendation: "Prioritise a safe early game: rehearse level-one setups and jungle tracking."
            .to_string(),
    })
}

fn communication_objective_losses(ctx: &AnalysisContext<'_>) -> Option<CorrelationData> {
    let objective_matches: HashSet<&str> = ctx
        .mistakes
        .iter()
        .filter(|m| mentions_objective(&m.outcome))
        .map(|m| m.match_id.as_str())
        .collect();

    let communication: Vec<&Mistake> = ctx
        .mistakes
        .iter()
        .copied()
        .filter(|m| m.category == MistakeCategory::Communication)
        .collect();

    let overlapping: Vec<&Mistake> = communication
        .iter()
        .copied()
        .filter(|m| objective_matches.contains(m.match_id.as_str()))
        .collect();

    if overlapping.len() < ctx.params.min_correlation_events {
        return None;
    }

    Some(CorrelationData {
        pattern: COMMUNICATION_PATTERN.to_string(),
        strength: safe_ratio(overlapping.len() as f64, communication.len() as f64),
        matches: distinct_matches(ctx, &overlapping),
        description: format!(
            "{} of {} communication mistakes came in matches where baron or dragon was lost.",
            overlapping.len(),
            communication.len()
        ),
        recommendation: "Call objective timers early and assign one voice for objective setups."
            .to_string(),
    })
}

pub(crate) fn detect_correlations(ctx: &AnalysisContext<'_>) -> Vec<CorrelationData> {
    let mut correlations: Vec<CorrelationData> =
        [early_game_losses(ctx), communication_objective_losses(ctx)]
            .into_iter()
            .flatten()
            .collect();

    correlations.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    correlations
}

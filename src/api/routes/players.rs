use axum::extract::{Path, Query, State};
use axum::Json;

use super::analysis::{load_scoped, run_analysis, AnalysisQuery};
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::PlayerTrendData;

#[derive(Debug, serde::Deserialize)]
pub struct PlayerTrendsQuery {
    pub recent: Option<usize>,
}

/// One player's trend across the stored matches.
pub async fn get_player_trends(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<PlayerTrendsQuery>,
) -> Result<Json<PlayerTrendData>, ApiError> {
    let scope = AnalysisQuery {
        recent: query.recent,
        player: Some(player_id.clone()),
    };
    let dataset = load_scoped(&state, &scope).await?;

    run_analysis(&state, &dataset)
        .player_trends
        .into_iter()
        .find(|t| t.player_id.as_str() == player_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("player {}", player_id)))
}

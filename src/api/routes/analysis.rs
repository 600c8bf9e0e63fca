use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agents::narrator::{Narrative, NarratorAgent};
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{analyze_with, BaselinePerformance};
use crate::models::{CategoryTrendData, Dataset, MultiMatchAnalysis};
use crate::storage::{self, StorageConfig, StorageError};

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    /// Only analyze the N most recent matches
    pub recent: Option<usize>,

    /// Only analyze one player's mistakes
    pub player: Option<String>,
}

/// Narrow a dataset to the requested window and player.
pub(crate) fn scope_dataset(dataset: Dataset, query: &AnalysisQuery) -> Result<Dataset, ApiError> {
    let dataset = match query.recent {
        Some(0) => {
            return Err(ApiError::BadRequest(
                "recent must be greater than 0".to_string(),
            ))
        }
        Some(n) => dataset.recent(n),
        None => dataset,
    };

    match &query.player {
        Some(id) => dataset
            .for_player(id)
            .ok_or_else(|| ApiError::NotFound(format!("player {}", id))),
        None => Ok(dataset),
    }
}

/// Run a storage call on the blocking pool so file reads never stall the
/// async workers.
pub(crate) async fn with_storage<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&StorageConfig) -> Result<T, StorageError> + Send + 'static,
{
    let storage = state.storage.clone();
    let result = tokio::task::spawn_blocking(move || op(storage.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("storage task failed: {}", e)))?;
    Ok(result?)
}

/// The stored dataset, narrowed by the query.
pub(crate) async fn load_scoped(
    state: &AppState,
    query: &AnalysisQuery,
) -> Result<Dataset, ApiError> {
    let dataset = with_storage(state, storage::load_dataset).await?;
    scope_dataset(dataset, query)
}

pub(crate) fn run_analysis(state: &AppState, dataset: &Dataset) -> MultiMatchAnalysis {
    analyze_with(
        &state.params,
        &BaselinePerformance,
        &dataset.matches,
        &dataset.mistakes,
        &dataset.players,
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,

    /// Narratives fall back to static text while this is false
    pub ai_available: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ai_available = state.ai_backend.health_check().await.unwrap_or(false);
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ai_available,
    })
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<MultiMatchAnalysis>, ApiError> {
    let dataset = load_scoped(&state, &query).await?;
    Ok(Json(run_analysis(&state, &dataset)))
}

/// The snapshot last saved with `analyze --save`, served as stored.
pub async fn get_snapshot(
    State(state): State<AppState>,
) -> Result<Json<MultiMatchAnalysis>, ApiError> {
    match with_storage(&state, storage::read_analysis).await {
        Ok(analysis) => Ok(Json(analysis)),
        Err(ApiError::NotFound(_)) => Err(ApiError::NotFound(
            "no saved analysis snapshot".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Analyze a dataset supplied in the request body. Nothing is stored.
pub async fn post_analysis(
    State(state): State<AppState>,
    Json(dataset): Json<Dataset>,
) -> Result<Json<MultiMatchAnalysis>, ApiError> {
    info!(
        "Analyzing posted dataset: {} matches, {} mistakes",
        dataset.matches.len(),
        dataset.mistakes.len()
    );
    Ok(Json(run_analysis(&state, &dataset)))
}

#[derive(Debug, Serialize)]
pub struct NarrativeResponse {
    pub analysis: MultiMatchAnalysis,
    pub narrative: Narrative,
}

pub async fn get_narrative(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<NarrativeResponse>, ApiError> {
    let dataset = load_scoped(&state, &query).await?;
    let analysis = run_analysis(&state, &dataset);

    let narrator = NarratorAgent::new(state.ai_backend.clone());
    let narrative = narrator
        .summarize(&analysis, dataset.matches.len(), dataset.mistakes.len())
        .await;

    Ok(Json(NarrativeResponse {
        analysis,
        narrative,
    }))
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub timeframe: String,
    pub categories: Vec<CategoryTrendData>,
}

pub async fn get_categories(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let dataset = load_scoped(&state, &query).await?;
    let analysis = run_analysis(&state, &dataset);

    Ok(Json(CategoriesResponse {
        timeframe: analysis.timeframe,
        categories: analysis.category_trends,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::agents::backend::MockBackend;
    use crate::agents::narrator::FALLBACK_NARRATIVE;
    use crate::api::build_router;
    use crate::api::routes::test_support::*;

    #[tokio::test]
    async fn test_health() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["ai_available"], true);
    }

    #[tokio::test]
    async fn test_health_reports_backend_down() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(tmp.path(), Arc::new(MockBackend::failing("offline"))));

        let (status, json) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ai_available"], false);
    }

    #[tokio::test]
    async fn test_get_analysis() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalMatches"], 5);
        assert_eq!(json["timeframe"], "2024-03-01 to 2024-03-05");
        assert_eq!(json["overallTrends"][0]["title"], "Win Rate Improving");
        assert_eq!(json["playerTrends"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_analysis_recent_window() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis?recent=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalMatches"], 2);
        assert_eq!(json["timeframe"], "2024-03-04 to 2024-03-05");
    }

    #[tokio::test]
    async fn test_get_analysis_for_player() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis?player=p1").await;

        assert_eq!(status, StatusCode::OK);
        let players = json["playerTrends"].as_array().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0]["playerId"], "p1");
        assert_eq!(json["categoryTrends"][0]["category"], "positioning");
        assert_eq!(json["categoryTrends"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_analysis_unknown_player() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis?player=p9").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_get_analysis_rejects_zero_window() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis?recent=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_get_analysis_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = mock_state(tmp.path());
        state.storage = Arc::new(crate::storage::StorageConfig::new(tmp.path().join("empty")));
        let app = build_router(state);

        let (status, json) = get_json(app, "/api/analysis").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalMatches"], 0);
        assert_eq!(json["timeframe"], "No data");
        assert_eq!(json["overallTrends"], json!([]));
    }

    #[tokio::test]
    async fn test_post_analysis() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let body = json!({
            "matches": [
                {"id": "a", "date": "2024-07-01", "opponent": "G2", "result": "loss", "duration": 1900},
                {"id": "b", "date": "2024-07-02", "opponent": "FNC", "result": "loss", "duration": 2100}
            ],
            "mistakes": [
                {"id": "x", "playerId": "p1", "playerName": "Caps", "category": "communication",
                 "description": "Late call", "impact": "medium", "matchId": "a", "gameTime": 1200}
            ]
        });
        let (status, json) = post_json(app, "/api/analysis", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalMatches"], 2);
        assert_eq!(json["categoryTrends"][0]["category"], "communication");
        assert_eq!(json["playerTrends"], json!([]));
    }

    #[tokio::test]
    async fn test_post_analysis_malformed_body() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, _) = post_json(app, "/api/analysis", &json!({"matches": "none"})).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_get_narrative() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis/narrative").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["narrative"]["text"], "Steady improvement.");
        assert_eq!(json["narrative"]["generated"], true);
        assert_eq!(json["analysis"]["totalMatches"], 5);
    }

    #[tokio::test]
    async fn test_get_narrative_backend_down() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), Arc::new(MockBackend::failing("offline")));
        let app = build_router(state);

        let (status, json) = get_json(app, "/api/analysis/narrative?recent=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["narrative"]["text"], FALLBACK_NARRATIVE);
        assert_eq!(json["narrative"]["generated"], false);
        assert_eq!(json["analysis"]["totalMatches"], 3);
    }

    #[tokio::test]
    async fn test_get_categories() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/categories").await;

        assert_eq!(status, StatusCode::OK);
        let categories = json["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0]["category"], "positioning");
        assert_eq!(categories[0]["totalOccurrences"], 2);
    }

    #[tokio::test]
    async fn test_get_snapshot_before_save() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(mock_state(tmp.path()));

        let (status, json) = get_json(app, "/api/analysis/snapshot").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json["error"]["message"],
            "Not found: no saved analysis snapshot"
        );
    }

    #[tokio::test]
    async fn test_get_snapshot_returns_saved_analysis() {
        let tmp = tempfile::tempdir().unwrap();
        let state = mock_state(tmp.path());

        // saved from the two most recent matches only, so it differs from a fresh run
        let dataset = sample_dataset().recent(2);
        let saved = run_analysis(&state, &dataset);
        crate::storage::write_analysis(&state.storage, &saved).unwrap();
        let app = build_router(state);

        let (status, json) = get_json(app, "/api/analysis/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalMatches"], 2);
        assert_eq!(json, serde_json::to_value(&saved).unwrap());
    }

    #[tokio::test]
    async fn test_with_storage_maps_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let state = mock_state(tmp.path());

        let loaded = with_storage(&state, storage::load_dataset).await.unwrap();
        assert_eq!(loaded, sample_dataset());

        let err = with_storage(&state, |_: &StorageConfig| -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_scope_dataset_player_and_window() {
        let query = AnalysisQuery {
            recent: Some(3),
            player: Some("p2".to_string()),
        };
        let scoped = scope_dataset(sample_dataset(), &query).unwrap();

        assert_eq!(scoped.matches.len(), 3);
        assert_eq!(scoped.players.len(), 1);
        // x3 is p2's only mistake and m4 is in the window
        assert_eq!(scoped.mistakes.len(), 1);
    }
}

//! Stats API client.
//!
//! Pulls a team's recent series from a GraphQL statistics service and
//! maps them into a [`Dataset`]. One request per call, bounded by the
//! configured timeout; callers decide whether to try again.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::StatsApiConfig;
use crate::models::{
    Dataset, Impact, Match, MatchResult, Mistake, MistakeCategory, ObjectiveCounts, Player,
    PlayerStats,
};

/// Errors that can occur while fetching from the stats API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Stats API returned errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Environment variable {0} not set")]
    MissingApiKey(String),

    #[error("Stats API is disabled in configuration")]
    Disabled,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

const TEAM_SERIES_QUERY: &str = r#"query TeamSeries($teamId: ID!, $first: Int!) {
  team(id: $teamId) {
    players { id nickname role kda winRate gamesPlayed }
    series(first: $first) {
      id
      startDate
      opponent
      won
      durationSeconds
      objectives { dragons barons towers }
      mistakes { id playerId playerName category description impact gameTime outcome }
    }
  }
}"#;

/// Series requested per call.
const SERIES_PAGE_SIZE: u32 = 50;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: TeamSeriesVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeamSeriesVariables<'a> {
    team_id: &'a str,
    first: u32,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<TeamSeriesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TeamSeriesData {
    team: Option<TeamNode>,
}

#[derive(Debug, Deserialize)]
struct TeamNode {
    #[serde(default)]
    players: Vec<PlayerNode>,
    #[serde(default)]
    series: Vec<SeriesNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerNode {
    id: String,
    nickname: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    kda: Option<f64>,
    #[serde(default)]
    win_rate: Option<f64>,
    #[serde(default)]
    games_played: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesNode {
    id: String,
    start_date: String,
    opponent: String,
    won: bool,
    #[serde(default)]
    duration_seconds: Option<u32>,
    #[serde(default)]
    objectives: Option<ObjectiveCounts>,
    #[serde(default)]
    mistakes: Vec<MistakeNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MistakeNode {
    id: String,
    player_id: String,
    #[serde(default)]
    player_name: Option<String>,
    category: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    impact: Option<Impact>,
    game_time: u32,
    #[serde(default)]
    outcome: Option<String>,
}

/// Accepts "2024-05-01" as well as RFC 3339 timestamps.
fn parse_series_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl GraphQlResponse {
    fn into_dataset(self) -> Result<Dataset, FetchError> {
        if !self.errors.is_empty() {
            return Err(FetchError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let team = self
            .data
            .and_then(|d| d.team)
            .ok_or_else(|| FetchError::InvalidResponse("no team in response".to_string()))?;

        let players = team
            .players
            .into_iter()
            .map(|p| {
                Player::new(p.id, p.nickname, p.role.unwrap_or_default()).with_stats(PlayerStats {
                    kda: p.kda.unwrap_or_default(),
                    win_rate: p.win_rate.unwrap_or_default(),
                    games_played: p.games_played.unwrap_or_default(),
                })
            })
            .collect();

        let mut matches = Vec::new();
        let mut mistakes = Vec::new();

        for series in team.series {
            let Some(date) = parse_series_date(&series.start_date) else {
                warn!(
                    "Skipping series {} with unreadable date {:?}",
                    series.id, series.start_date
                );
                continue;
            };

            let result = if series.won {
                MatchResult::Win
            } else {
                MatchResult::Loss
            };

            for node in series.mistakes {
                let category = match node.category.parse::<MistakeCategory>() {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Skipping mistake {}: {}", node.id, e);
                        continue;
                    }
                };
                mistakes.push(
                    Mistake::new(node.id, node.player_id, category, series.id.as_str(), node.game_time)
                        .with_player_name(node.player_name.unwrap_or_default())
                        .with_description(node.description.unwrap_or_default())
                        .with_impact(node.impact.unwrap_or(Impact::Medium))
                        .with_outcome(node.outcome.unwrap_or_default()),
                );
            }

            matches.push(
                Match::new(series.id, date, series.opponent, result)
                    .with_duration(series.duration_seconds.unwrap_or_default())
                    .with_objectives(series.objectives.unwrap_or_default()),
            );
        }

        Ok(Dataset::new(matches, mistakes, players))
    }
}

/// Client for the GraphQL stats API.
pub struct StatsApiClient {
    client: Client,
    endpoint: Url,
}

impl StatsApiClient {
    /// Build a client, reading the bearer token from the configured
    /// environment variable.
    pub fn new(config: &StatsApiConfig) -> Result<Self, FetchError> {
        if !config.enabled {
            return Err(FetchError::Disabled);
        }
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| FetchError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, &api_key)
    }

    pub fn with_api_key(config: &StatsApiConfig, api_key: &str) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.endpoint, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("esports-insights/", env!("CARGO_PKG_VERSION"))),
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| FetchError::MissingApiKey(config.api_key_env.clone()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch a team's recent series, players and recorded mistakes.
    pub async fn fetch_dataset(&self, team_id: &str) -> Result<Dataset, FetchError> {
        info!("Fetching series for team {} from {}", team_id, self.endpoint);

        let request = GraphQlRequest {
            query: TEAM_SERIES_QUERY,
            variables: TeamSeriesVariables {
                team_id,
                first: SERIES_PAGE_SIZE,
            },
        };

        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let dataset = body.into_dataset()?;
        debug!(
            "Fetched {} matches, {} mistakes, {} players",
            dataset.matches.len(),
            dataset.mistakes.len(),
            dataset.players.len()
        );
        Ok(dataset)
    }
}

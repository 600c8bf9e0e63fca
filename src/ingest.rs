//! Ingestion of import payloads.
//!
//! Every payload names what it carries with an explicit `kind` tag:
//!
//! ```json
//! {"kind": "players", "records": [{"id": "p1", "name": "Faker", "role": "Mid"}]}
//! ```
//!
//! Payloads without a recognised tag are rejected rather than guessed at.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Dataset, EntityId, Match, Mistake, Player};
use crate::storage::{self, StorageConfig, StorageError};

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unrecognised payload: {0}")]
    UnknownPayload(String),

    #[error("Invalid records: {0}")]
    InvalidRecords(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A tagged import payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum ImportPayload {
    Players(Vec<Player>),
    Matches(Vec<Match>),
    Mistakes(Vec<Mistake>),
    Dataset(Dataset),
}

const KNOWN_KINDS: [&str; 4] = ["players", "matches", "mistakes", "dataset"];

impl ImportPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ImportPayload::Players(_) => "players",
            ImportPayload::Matches(_) => "matches",
            ImportPayload::Mistakes(_) => "mistakes",
            ImportPayload::Dataset(_) => "dataset",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ImportPayload::Players(r) => r.len(),
            ImportPayload::Matches(r) => r.len(),
            ImportPayload::Mistakes(r) => r.len(),
            ImportPayload::Dataset(d) => d.matches.len() + d.mistakes.len() + d.players.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a payload, checking the tag before the records.
pub fn parse_payload(json: &str) -> Result<ImportPayload, IngestError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| IngestError::UnknownPayload(e.to_string()))?;

    let kind = match value.get("kind") {
        Some(serde_json::Value::String(kind)) => kind.clone(),
        Some(_) => {
            return Err(IngestError::UnknownPayload(
                "\"kind\" must be a string".to_string(),
            ))
        }
        None => {
            return Err(IngestError::UnknownPayload(
                "missing \"kind\" tag".to_string(),
            ))
        }
    };

    if !KNOWN_KINDS.contains(&kind.as_str()) {
        return Err(IngestError::UnknownPayload(format!(
            "unknown kind \"{}\", expected one of {}",
            kind,
            KNOWN_KINDS.join(", ")
        )));
    }

    serde_json::from_value(value).map_err(|e| IngestError::InvalidRecords(format!("{}: {}", kind, e)))
}

fn check_ids<'a>(
    label: &str,
    ids: impl Iterator<Item = &'a EntityId>,
    problems: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_blank() {
            problems.push(format!("{} with empty id", label));
        } else if !seen.insert(id.as_str()) {
            problems.push(format!("duplicate {} id {}", label, id));
        }
    }
}

fn check_players(players: &[Player], problems: &mut Vec<String>) {
    check_ids("player", players.iter().map(|p| &p.id), problems);
    for p in players {
        let stats = &p.stats;
        if !stats.kda.is_finite() || stats.kda < 0.0 {
            problems.push(format!("player {} has invalid kda {}", p.id, stats.kda));
        }
        if !(0.0..=100.0).contains(&stats.win_rate) {
            problems.push(format!(
                "player {} has win rate {} outside 0-100",
                p.id, stats.win_rate
            ));
        }
    }
}

fn check_mistakes(mistakes: &[Mistake], problems: &mut Vec<String>) {
    check_ids("mistake", mistakes.iter().map(|m| &m.id), problems);
    for m in mistakes {
        if m.player_id.is_blank() {
            problems.push(format!("mistake {} has no player", m.id));
        }
        if m.match_id.is_blank() {
            problems.push(format!("mistake {} has no match", m.id));
        }
    }
}

/// Validate a payload on its own and return non-fatal warnings.
///
/// Orphan mistakes inside a dataset payload are warnings, not errors:
/// their match may arrive in a later payload.
pub fn validate(payload: &ImportPayload) -> Result<Vec<String>, IngestError> {
    let mut problems = Vec::new();
    let mut warnings = Vec::new();

    match payload {
        ImportPayload::Players(players) => check_players(players, &mut problems),
        ImportPayload::Matches(matches) => {
            check_ids("match", matches.iter().map(|m| &m.id), &mut problems)
        }
        ImportPayload::Mistakes(mistakes) => check_mistakes(mistakes, &mut problems),
        ImportPayload::Dataset(dataset) => {
            check_players(&dataset.players, &mut problems);
            check_ids("match", dataset.matches.iter().map(|m| &m.id), &mut problems);
            check_mistakes(&dataset.mistakes, &mut problems);
            for orphan in dataset.orphan_mistakes() {
                warnings.push(format!(
                    "mistake {} references unknown match {}",
                    orphan.id, orphan.match_id
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(warnings)
    } else {
        Err(IngestError::Validation(problems))
    }
}

/// Counts from merging one payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub added: usize,
    pub replaced: usize,
}

impl std::ops::AddAssign for MergeSummary {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.replaced += other.replaced;
    }
}

fn upsert<T: Clone>(
    existing: &mut Vec<T>,
    incoming: &[T],
    id: impl Fn(&T) -> &EntityId,
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for record in incoming {
        match existing.iter_mut().find(|e| id(&**e) == id(record)) {
            Some(slot) => {
                *slot = record.clone();
                summary.replaced += 1;
            }
            None => {
                existing.push(record.clone());
                summary.added += 1;
            }
        }
    }
    summary
}

/// Merge a payload into a dataset. Records with an existing id replace
/// the stored record.
pub fn merge_into(dataset: &mut Dataset, payload: &ImportPayload) -> MergeSummary {
    match payload {
        ImportPayload::Players(r) => upsert(&mut dataset.players, r, |p| &p.id),
        ImportPayload::Matches(r) => upsert(&mut dataset.matches, r, |m| &m.id),
        ImportPayload::Mistakes(r) => upsert(&mut dataset.mistakes, r, |m| &m.id),
        ImportPayload::Dataset(d) => {
            let mut summary = upsert(&mut dataset.players, &d.players, |p| &p.id);
            summary += upsert(&mut dataset.matches, &d.matches, |m| &m.id);
            summary += upsert(&mut dataset.mistakes, &d.mistakes, |m| &m.id);
            summary
        }
    }
}

/// Result of importing a set of files.
#[derive(Debug, Default)]
pub struct ImportResult {
    pub files_imported: usize,
    pub merged: MergeSummary,
    pub orphan_mistakes: usize,
    pub errors: Vec<String>,
}

fn import_file(path: &Path, dataset: &mut Dataset) -> Result<MergeSummary, IngestError> {
    let content = std::fs::read_to_string(path)?;
    let payload = parse_payload(&content)?;
    for warning in validate(&payload)? {
        debug!("{:?}: {}", path, warning);
    }
    let summary = merge_into(dataset, &payload);
    info!(
        "Imported {} {} records from {:?} ({} new, {} replaced)",
        payload.len(),
        payload.kind(),
        path,
        summary.added,
        summary.replaced
    );
    Ok(summary)
}

/// Import every file matching `pattern` into storage. Bad files are
/// reported and skipped; good files are still stored.
pub fn import_files(storage: &StorageConfig, pattern: &str) -> Result<ImportResult, IngestError> {
    let mut dataset = storage::load_dataset(storage)?;
    let mut result = ImportResult::default();

    let mut paths: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect();
    paths.sort();

    for path in paths {
        match import_file(&path, &mut dataset) {
            Ok(summary) => {
                result.files_imported += 1;
                result.merged += summary;
            }
            Err(e) => {
                warn!("Failed to import {:?}: {}", path, e);
                result.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    result.orphan_mistakes = dataset.orphan_mistakes().len();
    if result.orphan_mistakes > 0 {
        warn!(
            "{} mistakes reference unknown matches and will be left out of analysis",
            result.orphan_mistakes
        );
    }

    if result.files_imported > 0 {
        storage::save_dataset(storage, &dataset)?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchResult, MistakeCategory, PlayerStats};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const PLAYERS: &str = r#"{
        "kind": "players",
        "records": [
            {"id": "p1", "name": "Faker", "role": "Mid", "stats": {"kda": 4.1, "winRate": 64.0, "gamesPlayed": 80}},
            {"id": "p2", "name": "Oner", "role": "Jungle"}
        ]
    }"#;

    const MATCHES: &str = r#"{
        "kind": "matches",
        "records": [
            {"id": "m1", "date": "2024-04-01", "opponent": "GEN", "result": "loss", "duration": 2011},
            {"id": "m2", "date": "2024-04-03", "opponent": "HLE", "result": "win", "duration": 1702}
        ]
    }"#;

    #[test]
    fn test_parse_tagged_payload() {
        let payload = parse_payload(PLAYERS).unwrap();
        assert_eq!(payload.kind(), "players");
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_parse_dataset_payload() {
        let json = r#"{"kind": "dataset", "records": {"matches": [], "players": [{"id": "p1", "name": "A", "role": "Top"}]}}"#;
        match parse_payload(json).unwrap() {
            ImportPayload::Dataset(d) => {
                assert_eq!(d.players.len(), 1);
                assert!(d.mistakes.is_empty());
            }
            other => panic!("Expected dataset, got {}", other.kind()),
        }
    }

    #[test]
    fn test_untagged_array_is_rejected() {
        let json = r#"[{"id": "p1", "name": "Faker", "role": "Mid"}]"#;
        assert!(matches!(
            parse_payload(json),
            Err(IngestError::UnknownPayload(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"kind": "insights", "records": []}"#;
        let err = parse_payload(json).unwrap_err();
        assert!(matches!(err, IngestError::UnknownPayload(_)));
        assert!(err.to_string().contains("insights"));
    }

    #[test]
    fn test_records_must_match_kind() {
        // player records labelled as matches
        let json = r#"{"kind": "matches", "records": [{"id": "p1", "name": "Faker", "role": "Mid"}]}"#;
        assert!(matches!(
            parse_payload(json),
            Err(IngestError::InvalidRecords(_))
        ));
    }

    #[test]
    fn test_validate_duplicates_and_stats() {
        let payload = ImportPayload::Players(vec![
            Player::new("p1", "A", "Top").with_stats(PlayerStats {
                kda: -1.0,
                win_rate: 120.0,
                games_played: 1,
            }),
            Player::new("p1", "B", "Mid"),
            Player::new(" ", "C", "Bot"),
        ]);

        match validate(&payload) {
            Err(IngestError::Validation(problems)) => {
                assert_eq!(problems.len(), 4);
                assert!(problems.iter().any(|p| p.contains("duplicate player id p1")));
                assert!(problems.iter().any(|p| p.contains("empty id")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_orphan_mistakes() {
        let payload = ImportPayload::Mistakes(vec![Mistake::new(
            "x1",
            "p1",
            MistakeCategory::Macro,
            "unknown-match",
            100,
        )]);
        assert_eq!(validate(&payload).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_validate_reports_orphans_in_dataset() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let payload = ImportPayload::Dataset(Dataset::new(
            vec![Match::new("m1", date, "DK", MatchResult::Win)],
            vec![
                Mistake::new("x1", "p1", MistakeCategory::Mechanics, "m1", 100),
                Mistake::new("x2", "p1", MistakeCategory::Mechanics, "m2", 200),
            ],
            vec![Player::new("p1", "Zeka", "Mid")],
        ));

        let warnings = validate(&payload).unwrap();
        assert_eq!(warnings, vec!["mistake x2 references unknown match m2".to_string()]);
    }

    #[test]
    fn test_merge_replaces_by_id() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut dataset = Dataset::new(
            vec![Match::new("m1", date, "Old", MatchResult::Win)],
            vec![],
            vec![],
        );

        let payload = parse_payload(MATCHES).unwrap();
        let summary = merge_into(&mut dataset, &payload);

        assert_eq!(summary, MergeSummary { added: 1, replaced: 1 });
        assert_eq!(dataset.matches.len(), 2);
        assert_eq!(dataset.matches[0].opponent, "GEN");
        assert_eq!(dataset.matches[0].result, MatchResult::Loss);
    }

    #[test]
    fn test_import_files() {
        let data = TempDir::new().unwrap();
        let inbox = TempDir::new().unwrap();
        let storage = StorageConfig::new(data.path().to_path_buf());

        std::fs::write(inbox.path().join("a_players.json"), PLAYERS).unwrap();
        std::fs::write(inbox.path().join("b_matches.json"), MATCHES).unwrap();
        std::fs::write(
            inbox.path().join("c_mistakes.json"),
            r#"{"kind": "mistakes", "records": [
                {"id": "x1", "playerId": "p1", "playerName": "Faker", "category": "positioning",
                 "description": "Overextended", "impact": "high", "matchId": "m9", "gameTime": 500}
            ]}"#,
        )
        .unwrap();
        std::fs::write(inbox.path().join("d_broken.json"), "[1, 2, 3]").unwrap();

        let pattern = format!("{}/*.json", inbox.path().display());
        let result = import_files(&storage, &pattern).unwrap();

        assert_eq!(result.files_imported, 3);
        assert_eq!(result.merged.added, 5);
        assert_eq!(result.orphan_mistakes, 1);
        assert_eq!(result.errors.len(), 1);

        let stored = storage::load_dataset(&storage).unwrap();
        assert_eq!(stored.players.len(), 2);
        assert_eq!(stored.matches.len(), 2);
        assert_eq!(stored.mistakes.len(), 1);
    }

    #[test]
    fn test_import_bad_pattern() {
        let data = TempDir::new().unwrap();
        let storage = StorageConfig::new(data.path().to_path_buf());
        assert!(matches!(
            import_files(&storage, "[unclosed"),
            Err(IngestError::Pattern(_))
        ));
    }
}

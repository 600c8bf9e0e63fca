//! The input bundle handed to the analysis engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{sort_chronologically, Match, Mistake, Player};

/// Matches, mistakes and players for one analysis scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub mistakes: Vec<Mistake>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Dataset {
    pub fn new(matches: Vec<Match>, mistakes: Vec<Mistake>, players: Vec<Player>) -> Self {
        Self {
            matches,
            mistakes,
            players,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.mistakes.is_empty() && self.players.is_empty()
    }

    /// Keep the `n` most recent matches and only the mistakes made in them.
    /// Players are kept as-is.
    pub fn recent(&self, n: usize) -> Dataset {
        let sorted = sort_chronologically(&self.matches);
        let start = sorted.len().saturating_sub(n);
        let matches: Vec<Match> = sorted[start..].iter().map(|m| (*m).clone()).collect();

        let kept: HashSet<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        let mistakes = self
            .mistakes
            .iter()
            .filter(|m| kept.contains(m.match_id.as_str()))
            .cloned()
            .collect();

        Dataset {
            matches,
            mistakes,
            players: self.players.clone(),
        }
    }

    /// Narrow the dataset to one player. Returns `None` if the player is
    /// not on the roster.
    pub fn for_player(&self, player_id: &str) -> Option<Dataset> {
        let player = self.players.iter().find(|p| p.id.as_str() == player_id)?;

        Some(Dataset {
            matches: self.matches.clone(),
            mistakes: self
                .mistakes
                .iter()
                .filter(|m| m.player_id.as_str() == player_id)
                .cloned()
                .collect(),
            players: vec![player.clone()],
        })
    }

    /// Mistakes whose match is not part of this dataset.
    pub fn orphan_mistakes(&self) -> Vec<&Mistake> {
        let ids: HashSet<&str> = self.matches.iter().map(|m| m.id.as_str()).collect();
        self.mistakes
            .iter()
            .filter(|m| !ids.contains(m.match_id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchResult, MistakeCategory};
    use chrono::NaiveDate;

    fn sample() -> Dataset {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        Dataset::new(
            vec![
                Match::new("m3", d(3), "C", MatchResult::Win),
                Match::new("m1", d(1), "A", MatchResult::Loss),
                Match::new("m2", d(2), "B", MatchResult::Win),
            ],
            vec![
                Mistake::new("x1", "p1", MistakeCategory::Macro, "m1", 100),
                Mistake::new("x2", "p2", MistakeCategory::Macro, "m3", 200),
                Mistake::new("x3", "p1", MistakeCategory::Mechanics, "m9", 300),
            ],
            vec![Player::new("p1", "One", "Top"), Player::new("p2", "Two", "Jungle")],
        )
    }

    #[test]
    fn test_recent_keeps_latest_matches_and_their_mistakes() {
        let recent = sample().recent(2);
        let ids: Vec<&str> = recent.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3"]);
        assert_eq!(recent.mistakes.len(), 1);
        assert_eq!(recent.mistakes[0].id.as_str(), "x2");
        assert_eq!(recent.players.len(), 2);
    }

    #[test]
    fn test_recent_larger_than_dataset() {
        let recent = sample().recent(10);
        assert_eq!(recent.matches.len(), 3);
    }

    #[test]
    fn test_for_player() {
        let scoped = sample().for_player("p1").unwrap();
        assert_eq!(scoped.players.len(), 1);
        assert_eq!(scoped.mistakes.len(), 2);
        assert_eq!(scoped.matches.len(), 3);

        assert!(sample().for_player("nobody").is_none());
    }

    #[test]
    fn test_orphan_mistakes() {
        let data = sample();
        let orphans = data.orphan_mistakes();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].match_id.as_str(), "m9");
    }
}

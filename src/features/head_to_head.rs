//! Head-to-head bookkeeping between pairs of players

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{MatchRecord, Outcome, PlayerName};

/// Record of one player (the subject) against one opponent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub wins: u32,
    pub losses: u32,
    /// +1 if the subject won the last meeting, -1 if the opponent did, 0 if none
    pub last_winner: i8,
}

impl HeadToHeadRecord {
    /// `(wins - losses) / (wins + losses)`, 0 with no prior meetings
    pub fn advantage(&self) -> f64 {
        let total = self.meetings();
        if total == 0 {
            0.0
        } else {
            (self.wins as f64 - self.losses as f64) / total as f64
        }
    }

    pub fn last_winner_indicator(&self) -> i8 {
        self.last_winner
    }

    pub fn meetings(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Head-to-head records keyed by (subject, opponent)
#[derive(Debug, Clone, Default)]
pub struct HeadToHead {
    records: HashMap<(PlayerName, PlayerName), HeadToHeadRecord>,
}

impl HeadToHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &PlayerName, opponent: &PlayerName) -> HeadToHeadRecord {
        self.records
            .get(&(subject.clone(), opponent.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Update both directions of the pair after a decided match
    pub fn update(&mut self, record: &MatchRecord) {
        let Some(outcome) = record.outcome() else {
            return;
        };
        let (winner, loser) = match outcome {
            Outcome::Player1 => (&record.player1, &record.player2),
            Outcome::Player2 => (&record.player2, &record.player1),
        };

        let forward = self
            .records
            .entry((winner.clone(), loser.clone()))
            .or_default();
        forward.wins += 1;
        forward.last_winner = 1;

        let reverse = self
            .records
            .entry((loser.clone(), winner.clone()))
            .or_default();
        reverse.losses += 1;
        reverse.last_winner = -1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SideMetrics;

    fn make_match(p1: &str, p2: &str, winner: &str) -> MatchRecord {
        MatchRecord {
            source_index: 0,
            player1: PlayerName(p1.to_string()),
            player2: PlayerName(p2.to_string()),
            winner: Some(PlayerName(winner.to_string())),
            date: None,
            surface: None,
            round: None,
            court: None,
            tournament: None,
            best_of: None,
            side1: SideMetrics::default(),
            side2: SideMetrics::default(),
            score: None,
            label: None,
        }
    }

    #[test]
    fn test_no_history() {
        let h2h = HeadToHead::new();
        let rec = h2h.get(&PlayerName("A".into()), &PlayerName("B".into()));
        assert_eq!(rec.advantage(), 0.0);
        assert_eq!(rec.last_winner_indicator(), 0);
    }

    #[test]
    fn test_bidirectional_update() {
        let mut h2h = HeadToHead::new();
        h2h.update(&make_match("A", "B", "A"));
        h2h.update(&make_match("B", "A", "A"));
        h2h.update(&make_match("A", "B", "B"));

        let a = PlayerName("A".into());
        let b = PlayerName("B".into());
        let ab = h2h.get(&a, &b);
        let ba = h2h.get(&b, &a);
        assert_eq!((ab.wins, ab.losses), (2, 1));
        assert_eq!((ba.wins, ba.losses), (1, 2));
        assert!((ab.advantage() - 1.0 / 3.0).abs() < 1e-12);
        assert!((ab.advantage() + ba.advantage()).abs() < 1e-12);
        assert_eq!(ab.last_winner_indicator(), -1);
        assert_eq!(ba.last_winner_indicator(), 1);
    }
}

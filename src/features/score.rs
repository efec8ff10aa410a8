//! Score line parsing
//!
//! Extracts games, sets and tiebreaks from strings such as `6-4 3-6 7-6(5)`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Games and sets won by each side of a completed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreLine {
    pub games1: u32,
    pub games2: u32,
    pub sets1: u32,
    pub sets2: u32,
    pub tiebreaks: u32,
}

impl ScoreLine {
    /// Game margin from player 1's side
    pub fn games_delta(&self) -> f64 {
        self.games1 as f64 - self.games2 as f64
    }

    /// Set margin from player 1's side
    pub fn sets_delta(&self) -> f64 {
        self.sets1 as f64 - self.sets2 as f64
    }
}

fn set_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(\d{1,3})-(\d{1,3})\b").expect("valid set score pattern"))
}

/// Parse a score line. Walkovers and strings without any set score yield `None`.
pub fn parse_score(raw: &str) -> Option<ScoreLine> {
    let raw = raw.trim();
    let lower = raw.to_lowercase();
    if raw.is_empty() || lower.contains("w/o") || lower.contains("walkover") {
        return None;
    }

    let mut line = ScoreLine::default();
    let mut sets_seen = 0;
    for caps in set_pattern().captures_iter(raw) {
        let (Ok(g1), Ok(g2)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        sets_seen += 1;
        line.games1 = line.games1.checked_add(g1)?;
        line.games2 = line.games2.checked_add(g2)?;
        match g1.cmp(&g2) {
            std::cmp::Ordering::Greater => line.sets1 += 1,
            std::cmp::Ordering::Less => line.sets2 += 1,
            std::cmp::Ordering::Equal => {}
        }
        if g1.max(g2) >= 7 {
            line.tiebreaks += 1;
        }
    }

    if sets_seen == 0 {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_sets() {
        let line = parse_score("6-4 6-3").unwrap();
        assert_eq!(line.games1, 12);
        assert_eq!(line.games2, 7);
        assert_eq!(line.sets1, 2);
        assert_eq!(line.sets2, 0);
        assert_eq!(line.tiebreaks, 0);
        assert_eq!(line.games_delta(), 5.0);
    }

    #[test]
    fn test_tiebreak_with_points_suffix() {
        // The "(5)" tiebreak points must not be read as a set
        let line = parse_score("7-6(5) 3-6 6-7(2)").unwrap();
        assert_eq!(line.sets1, 1);
        assert_eq!(line.sets2, 2);
        assert_eq!(line.tiebreaks, 2);
        assert_eq!(line.sets_delta(), -1.0);
    }

    #[test]
    fn test_walkover_and_garbage() {
        assert!(parse_score("W/O").is_none());
        assert!(parse_score("").is_none());
        assert!(parse_score("retired").is_none());
    }

    #[test]
    fn test_oversized_numbers_are_not_set_scores() {
        let line = parse_score("4294967295-0 6-4").unwrap();
        assert_eq!(line.games1, 6);
        assert_eq!(line.games2, 4);
        assert_eq!(line.sets1, 1);
        assert!(parse_score("99999-1").is_none());
    }
}

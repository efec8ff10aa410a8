//! Elo rating system for player strength estimation
//!
//! Tracks an overall rating and one rating per surface for every player.
//! Ratings regress towards the initial value as the calendar year advances.

use std::collections::HashMap;

use crate::{EloConfig, MatchRecord, Outcome, PlayerName};

/// Elo rating computer
#[derive(Debug, Clone)]
pub struct EloRatings {
    ratings: HashMap<PlayerName, f64>,
    surface_ratings: HashMap<(PlayerName, String), f64>,
    last_year: Option<i32>,
    config: EloConfig,
}

impl Default for EloRatings {
    fn default() -> Self {
        Self::new(EloConfig::default())
    }
}

/// Expected score (0-1) of a player rated `r_a` against one rated `r_b`
pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_b - r_a) / 400.0))
}

impl EloRatings {
    pub fn new(config: EloConfig) -> Self {
        EloRatings {
            ratings: HashMap::new(),
            surface_ratings: HashMap::new(),
            last_year: None,
            config,
        }
    }

    /// Overall rating, or `None` before the player's first decided match
    pub fn rating(&self, player: &PlayerName) -> Option<f64> {
        self.ratings.get(player).copied()
    }

    /// Get current rating for a player (returns initial if unknown)
    pub fn get_rating(&self, player: &PlayerName) -> f64 {
        *self
            .ratings
            .get(player)
            .unwrap_or(&self.config.initial_rating)
    }

    pub fn initial_rating(&self) -> f64 {
        self.config.initial_rating
    }

    /// Surface rating, or `None` if the player never played on that surface
    pub fn surface_rating(&self, player: &PlayerName, surface: &str) -> Option<f64> {
        self.surface_ratings
            .get(&(player.clone(), surface.to_string()))
            .copied()
    }

    /// Surface rating used for pre-match snapshots (initial if unseen)
    pub fn surface_rating_or_initial(&self, player: &PlayerName, surface: &str) -> f64 {
        self.surface_rating(player, surface)
            .unwrap_or(self.config.initial_rating)
    }

    /// Apply the yearly regression when the fold moves into a later year.
    /// Idempotent for a year already reached.
    pub fn advance_to(&mut self, year: Option<i32>) {
        let Some(year) = year else {
            return;
        };
        if let Some(last) = self.last_year {
            if year > last {
                let decay = (-self.config.yearly_decay * (year - last) as f64).exp();
                let initial = self.config.initial_rating;
                for rating in self.ratings.values_mut() {
                    *rating = initial + (*rating - initial) * decay;
                }
                for rating in self.surface_ratings.values_mut() {
                    *rating = initial + (*rating - initial) * decay;
                }
            }
        }
        if self.last_year.map_or(true, |last| year > last) {
            self.last_year = Some(year);
        }
    }

    /// Update ratings after a match (call AFTER reading pre-match ratings)
    pub fn update(&mut self, record: &MatchRecord) {
        self.advance_to(record.year());

        let Some(outcome) = record.outcome() else {
            return;
        };
        let actual = if outcome == Outcome::Player1 { 1.0 } else { 0.0 };

        let (p1, p2) = (&record.player1, &record.player2);
        let r1 = self.get_rating(p1);
        let r2 = self.get_rating(p2);
        let expected = expected_score(r1, r2);
        let k = self.config.k_factor;
        self.ratings.insert(p1.clone(), r1 + k * (actual - expected));
        self.ratings
            .insert(p2.clone(), r2 + k * ((1.0 - actual) - (1.0 - expected)));

        if let Some(surface) = record.surface_name() {
            let s1 = self.surface_rating_or_initial(p1, surface);
            let s2 = self.surface_rating_or_initial(p2, surface);
            let expected = expected_score(s1, s2);
            let k = self.config.surface_k_factor;
            self.surface_ratings
                .insert((p1.clone(), surface.to_string()), s1 + k * (actual - expected));
            self.surface_ratings.insert(
                (p2.clone(), surface.to_string()),
                s2 + k * ((1.0 - actual) - (1.0 - expected)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::SideMetrics;

    fn make_match(p1: &str, p2: &str, winner: &str, year: i32, surface: &str) -> MatchRecord {
        MatchRecord {
            source_index: 0,
            player1: PlayerName(p1.to_string()),
            player2: PlayerName(p2.to_string()),
            winner: Some(PlayerName(winner.to_string())),
            date: NaiveDate::from_ymd_opt(year, 3, 1),
            surface: Some(surface.to_string()),
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

    fn name(s: &str) -> PlayerName {
        PlayerName(s.to_string())
    }

    #[test]
    fn test_initial_ratings() {
        let elo = EloRatings::default();
        assert_eq!(elo.get_rating(&name("A")), 1500.0);
        assert!(elo.surface_rating(&name("A"), "Clay").is_none());
    }

    #[test]
    fn test_expected_score_symmetry() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);
        let e = expected_score(1600.0, 1500.0);
        assert!(e > 0.5);
        assert!((e + expected_score(1500.0, 1600.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rating_update() {
        let mut elo = EloRatings::default();
        elo.update(&make_match("A", "B", "A", 2020, "Clay"));

        assert!((elo.get_rating(&name("A")) - 1516.0).abs() < 1e-9);
        assert!((elo.get_rating(&name("B")) - 1484.0).abs() < 1e-9);
        assert!((elo.surface_rating(&name("A"), "Clay").unwrap() - 1512.0).abs() < 1e-9);
        assert!(elo.surface_rating(&name("A"), "Hard").is_none());
    }

    #[test]
    fn test_yearly_decay_pulls_towards_initial() {
        let mut elo = EloRatings::default();
        elo.update(&make_match("A", "B", "A", 2020, "Clay"));
        let before = elo.get_rating(&name("A")) - 1500.0;

        // A new-year match between other players triggers the regression
        elo.update(&make_match("C", "D", "C", 2022, "Hard"));
        let after = elo.get_rating(&name("A")) - 1500.0;
        assert!((after - before * (-0.02_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_unrated_until_decided_match() {
        let mut elo = EloRatings::default();
        let mut undecided = make_match("A", "B", "A", 2020, "Clay");
        undecided.winner = None;
        elo.update(&undecided);
        assert!(elo.rating(&name("A")).is_none());

        elo.update(&make_match("A", "B", "A", 2020, "Clay"));
        assert!(elo.rating(&name("A")).is_some_and(|r| r > 1500.0));
        assert!(elo.rating(&name("B")).is_some_and(|r| r < 1500.0));
    }
}

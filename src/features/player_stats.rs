//! Player statistics computation
//!
//! Rolling per-player state built up one match at a time in chronological
//! order: latest published rank/points/odds, recent form windows, surface
//! records and rest between matches.

use chrono::NaiveDate;
use std::collections::{BTreeMap, VecDeque};

use crate::{CatalogConfig, MatchRecord, PlayerName, SideMetrics};

/// One finished match seen from a single player's side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentResult {
    pub won: bool,
    /// Game margin signed from this player's perspective
    pub games_margin: Option<f64>,
    /// Set margin signed from this player's perspective
    pub sets_margin: Option<f64>,
    /// 1.0 if at least one tiebreak was played
    pub tiebreak_played: Option<f64>,
}

/// A match as it concerns one of its two players
#[derive(Debug, Clone)]
pub struct Appearance<'a> {
    pub metrics: SideMetrics,
    pub result: Option<RecentResult>,
    pub surface: Option<&'a str>,
    pub date: Option<NaiveDate>,
}

impl<'a> Appearance<'a> {
    /// Build the appearance of `player` in `record`, or `None` if they did not play
    pub fn from_record(record: &'a MatchRecord, player: &PlayerName) -> Option<Self> {
        let (metrics, sign) = if *player == record.player1 {
            (record.side1, 1.0)
        } else if *player == record.player2 {
            (record.side2, -1.0)
        } else {
            return None;
        };

        let result = record.did_win(player).map(|won| RecentResult {
            won,
            games_margin: record.score.map(|s| sign * s.games_delta()),
            sets_margin: record.score.map(|s| sign * s.sets_delta()),
            tiebreak_played: record
                .score
                .map(|s| if s.tiebreaks > 0 { 1.0 } else { 0.0 }),
        });

        Some(Appearance {
            metrics,
            result,
            surface: record.surface_name(),
            date: record.date,
        })
    }
}

/// Bounded window of recent results
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    results: VecDeque<RecentResult>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        RollingWindow {
            capacity,
            results: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: RecentResult) {
        self.results.push_back(result);
        while self.results.len() > self.capacity {
            self.results.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Mean of the values `pick` yields, gated on how many are available
    fn mean_of<F>(&self, min_count: usize, pick: F) -> Option<f64>
    where
        F: Fn(&RecentResult) -> Option<f64>,
    {
        let values: Vec<f64> = self.results.iter().filter_map(pick).collect();
        if values.is_empty() || values.len() < min_count {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Win rate over the window
    pub fn form(&self, min_count: usize) -> Option<f64> {
        self.mean_of(min_count, |r| Some(if r.won { 1.0 } else { 0.0 }))
    }

    pub fn games_margin(&self, min_count: usize) -> Option<f64> {
        self.mean_of(min_count, |r| r.games_margin)
    }

    pub fn sets_margin(&self, min_count: usize) -> Option<f64> {
        self.mean_of(min_count, |r| r.sets_margin)
    }

    pub fn tiebreak_rate(&self, min_count: usize) -> Option<f64> {
        self.mean_of(min_count, |r| r.tiebreak_played)
    }
}

/// Latest two finite values of a published series
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendTracker {
    last: Option<f64>,
    previous: Option<f64>,
}

impl TrendTracker {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.previous = self.last;
            self.last = Some(v);
        }
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Last value minus the one before it
    pub fn trend(&self) -> Option<f64> {
        Some(self.last? - self.previous?)
    }
}

/// Surface-scoped sub-entry
#[derive(Debug, Clone)]
pub struct SurfaceEntry {
    pub recent: RollingWindow,
    pub wins: u32,
    pub losses: u32,
}

impl SurfaceEntry {
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.wins + self.losses;
        if total == 0 {
            None
        } else {
            Some(self.wins as f64 / total as f64)
        }
    }
}

/// Mutable aggregate for one player
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub name: PlayerName,
    pub matches_played: usize,
    pub wins: u32,
    pub losses: u32,
    pub rank: TrendTracker,
    pub points: TrendTracker,
    pub last_odds: Option<f64>,
    pub recent: RollingWindow,
    pub surfaces: BTreeMap<String, SurfaceEntry>,
    pub last_date: Option<NaiveDate>,
    /// Rest before the most recent match
    pub rest_days: Option<f64>,
    config: CatalogConfig,
}

impl PlayerEntry {
    pub fn new(name: PlayerName, config: &CatalogConfig) -> Self {
        PlayerEntry {
            name,
            matches_played: 0,
            wins: 0,
            losses: 0,
            rank: TrendTracker::default(),
            points: TrendTracker::default(),
            last_odds: None,
            recent: RollingWindow::new(config.form_window),
            surfaces: BTreeMap::new(),
            last_date: None,
            rest_days: None,
            config: config.clone(),
        }
    }

    /// Days of rest a match on `date` would follow, clipped to the configured range
    pub fn rest_before(&self, date: Option<NaiveDate>) -> f64 {
        match (self.last_date, date) {
            (Some(last), Some(date)) => ((date - last).num_days() as f64)
                .clamp(0.0, self.config.max_rest_days),
            _ => self.config.default_rest_days,
        }
    }

    /// Fold one match into the entry
    pub fn record(&mut self, appearance: &Appearance<'_>) {
        self.matches_played += 1;
        self.rank.push(appearance.metrics.rank);
        self.points.push(appearance.metrics.points);
        if let Some(odds) = appearance.metrics.odds.filter(|v| v.is_finite()) {
            self.last_odds = Some(odds);
        }

        if appearance.date.is_some() {
            self.rest_days = Some(self.rest_before(appearance.date));
            self.last_date = appearance.date;
        }

        let Some(result) = appearance.result else {
            return;
        };
        self.recent.push(result);
        if result.won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        if let Some(surface) = appearance.surface {
            let window = self.config.surface_form_window;
            let entry = self
                .surfaces
                .entry(surface.to_string())
                .or_insert_with(|| SurfaceEntry {
                    recent: RollingWindow::new(window),
                    wins: 0,
                    losses: 0,
                });
            entry.recent.push(result);
            if result.won {
                entry.wins += 1;
            } else {
                entry.losses += 1;
            }
        }
    }

    pub fn form(&self) -> Option<f64> {
        self.recent.form(self.config.min_form_matches)
    }

    pub fn games_margin(&self) -> Option<f64> {
        self.recent.games_margin(self.config.min_form_matches)
    }

    pub fn sets_margin(&self) -> Option<f64> {
        self.recent.sets_margin(self.config.min_form_matches)
    }

    pub fn tiebreak_rate(&self) -> Option<f64> {
        self.recent.tiebreak_rate(self.config.min_form_matches)
    }

    pub fn surface_form(&self, surface: &str) -> Option<f64> {
        self.surfaces
            .get(surface)?
            .recent
            .form(self.config.min_surface_form_matches)
    }

    /// Overall win rate across every decided match
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.wins + self.losses;
        if total == 0 {
            None
        } else {
            Some(self.wins as f64 / total as f64)
        }
    }

    /// Surface win rate, falling back to the all-surface rate when the surface is unseen
    pub fn surface_win_rate(&self, surface: Option<&str>) -> Option<f64> {
        surface
            .and_then(|s| self.surfaces.get(s))
            .and_then(SurfaceEntry::win_rate)
            .or_else(|| self.win_rate())
    }

    pub fn rank_trend(&self) -> Option<f64> {
        self.rank.trend()
    }

    pub fn points_trend(&self) -> Option<f64> {
        self.points.trend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::score::parse_score;

    fn make_match(p1: &str, p2: &str, winner: &str, day: u32, surface: &str) -> MatchRecord {
        MatchRecord {
            source_index: 0,
            player1: PlayerName(p1.to_string()),
            player2: PlayerName(p2.to_string()),
            winner: Some(PlayerName(winner.to_string())),
            date: NaiveDate::from_ymd_opt(2024, 1, day),
            surface: Some(surface.to_string()),
            round: None,
            court: None,
            tournament: None,
            best_of: None,
            side1: SideMetrics {
                rank: Some(10.0 + day as f64),
                points: Some(1000.0),
                odds: Some(1.5),
            },
            side2: SideMetrics::default(),
            score: parse_score("6-4 7-6(3)"),
            label: None,
        }
    }

    fn record_into(entry: &mut PlayerEntry, record: &MatchRecord) {
        let appearance = Appearance::from_record(record, &entry.name).unwrap();
        entry.record(&appearance);
    }

    #[test]
    fn test_appearance_signs_margins_per_side() {
        let record = make_match("A", "B", "A", 1, "Hard");
        let a = Appearance::from_record(&record, &PlayerName("A".into())).unwrap();
        let b = Appearance::from_record(&record, &PlayerName("B".into())).unwrap();
        assert_eq!(a.result.unwrap().games_margin, Some(3.0));
        assert_eq!(b.result.unwrap().games_margin, Some(-3.0));
        assert_eq!(b.result.unwrap().sets_margin, Some(-2.0));
        assert!(!b.result.unwrap().won);
        assert!(Appearance::from_record(&record, &PlayerName("C".into())).is_none());
    }

    #[test]
    fn test_form_is_gated_on_min_matches() {
        let config = CatalogConfig::default();
        let mut entry = PlayerEntry::new(PlayerName("A".into()), &config);

        record_into(&mut entry, &make_match("A", "B", "A", 1, "Hard"));
        record_into(&mut entry, &make_match("A", "B", "B", 2, "Hard"));
        assert!(entry.form().is_none());
        assert_eq!(entry.surface_form("Hard"), Some(0.5));

        record_into(&mut entry, &make_match("A", "B", "A", 3, "Hard"));
        assert!((entry.form().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(entry.tiebreak_rate(), Some(1.0));
    }

    #[test]
    fn test_window_drops_oldest_results() {
        let config = CatalogConfig {
            form_window: 3,
            min_form_matches: 1,
            ..CatalogConfig::default()
        };
        let mut entry = PlayerEntry::new(PlayerName("A".into()), &config);
        record_into(&mut entry, &make_match("A", "B", "B", 1, "Clay"));
        for day in 2..5 {
            record_into(&mut entry, &make_match("A", "B", "A", day, "Clay"));
        }
        assert_eq!(entry.recent.len(), 3);
        assert_eq!(entry.form(), Some(1.0));
        assert_eq!(entry.win_rate(), Some(0.75));
    }

    #[test]
    fn test_surface_win_rate_falls_back_to_overall() {
        let config = CatalogConfig::default();
        let mut entry = PlayerEntry::new(PlayerName("A".into()), &config);
        record_into(&mut entry, &make_match("A", "B", "A", 1, "Clay"));
        record_into(&mut entry, &make_match("A", "B", "B", 2, "Hard"));

        assert_eq!(entry.surface_win_rate(Some("Clay")), Some(1.0));
        assert_eq!(entry.surface_win_rate(Some("Grass")), Some(0.5));
        assert_eq!(entry.surface_win_rate(None), Some(0.5));

        let empty = PlayerEntry::new(PlayerName("Z".into()), &config);
        assert!(empty.surface_win_rate(Some("Clay")).is_none());
    }

    #[test]
    fn test_trend_and_rest() {
        let config = CatalogConfig::default();
        let mut entry = PlayerEntry::new(PlayerName("A".into()), &config);
        assert_eq!(entry.rest_before(NaiveDate::from_ymd_opt(2024, 1, 5)), 30.0);

        record_into(&mut entry, &make_match("A", "B", "A", 1, "Hard"));
        assert!(entry.rank_trend().is_none());
        record_into(&mut entry, &make_match("A", "B", "A", 8, "Hard"));

        // Ranks were 11 then 18
        assert_eq!(entry.rank_trend(), Some(7.0));
        assert_eq!(entry.rest_days, Some(7.0));
        assert_eq!(entry.rest_before(NaiveDate::from_ymd_opt(2024, 3, 30)), 60.0);
        assert_eq!(entry.last_odds, Some(1.5));
    }
}

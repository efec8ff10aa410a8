//! Player catalog
//!
//! Built once by a strict chronological fold over every match record. While
//! folding, the pre-match feature snapshot of each record is taken before the
//! record itself is applied, so rolling statistics at record *i* only reflect
//! records before *i*. After `build` returns the catalog is read-only.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::data::aliases::ColumnMap;
use crate::data::csv_parser::CsvTable;
use crate::data::records::{parse_records, sort_chronologically};
use crate::features::derive::{derive, derive_named, Feature, PairState, SideState};
use crate::features::elo::EloRatings;
use crate::features::head_to_head::HeadToHead;
use crate::features::player_stats::{Appearance, PlayerEntry};
use crate::{CatalogConfig, Config, MatchRecord, PlayerName, Result, SideMetrics, TennisError};

const FALLBACK_SURFACE: &str = "Hard";

/// Surface, court, round and year a match is played under
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub surface: Option<String>,
    pub court: Option<String>,
    pub round: Option<String>,
    pub year: Option<i32>,
}

/// A record together with its pre-match feature values
#[derive(Debug, Clone)]
pub struct HistoricalRow {
    pub record: MatchRecord,
    /// Indexed by `Feature::index`; `None` when the feature had no data
    pub values: Vec<Option<f64>>,
}

impl HistoricalRow {
    pub fn value(&self, feature: Feature) -> Option<f64> {
        self.values.get(feature.index()).copied().flatten()
    }
}

/// Feature request for a player pairing
#[derive(Debug, Clone, Default)]
pub struct FeatureRequest {
    pub player1: String,
    pub player2: String,
    pub features: Vec<String>,
    pub context: MatchContext,
}

/// Requested features for a resolved pairing
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    pub player1: PlayerName,
    pub player2: PlayerName,
    pub context: MatchContext,
    /// Every requested feature in request order; missing ones hold 0
    pub values: Vec<(String, f64)>,
    pub missing: Vec<String>,
}

impl PreparedFeatures {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Per-player state after folding the full history
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
    players: BTreeMap<PlayerName, PlayerEntry>,
    lowercase: HashMap<String, PlayerName>,
    head_to_head: HeadToHead,
    elo: EloRatings,
    surfaces: BTreeSet<String>,
    rounds: BTreeSet<String>,
    courts: BTreeSet<String>,
    latest_year: Option<i32>,
    history: Vec<HistoricalRow>,
}

impl Catalog {
    /// Sort the records into time order and fold them in
    pub fn build(mut records: Vec<MatchRecord>, config: &Config) -> Self {
        sort_chronologically(&mut records);

        let mut catalog = Catalog {
            config: config.catalog.clone(),
            players: BTreeMap::new(),
            lowercase: HashMap::new(),
            head_to_head: HeadToHead::new(),
            elo: EloRatings::new(config.elo.clone()),
            surfaces: BTreeSet::new(),
            rounds: BTreeSet::new(),
            courts: BTreeSet::new(),
            latest_year: None,
            history: Vec::with_capacity(records.len()),
        };

        let mut skipped = 0;
        for record in records {
            if record.player1 == record.player2 {
                skipped += 1;
                continue;
            }
            catalog.register(&record.player1);
            catalog.register(&record.player2);
            catalog.elo.advance_to(record.year());

            let values = catalog.snapshot(&record);
            catalog.apply(&record);
            catalog.history.push(HistoricalRow { record, values });
        }
        if skipped > 0 {
            log::debug!("Skipped {} records with the same player on both sides", skipped);
        }

        log::info!(
            "Catalog built: {} players, {} matches, {} head-to-head pairs",
            catalog.players.len(),
            catalog.history.len(),
            catalog.head_to_head.len() / 2
        );
        catalog
    }

    /// Cast the rows of a table and build from them
    pub fn from_table(table: &CsvTable, columns: &ColumnMap, config: &Config) -> Self {
        Self::build(parse_records(table, columns), config)
    }

    fn register(&mut self, name: &PlayerName) {
        if self.players.contains_key(name) {
            return;
        }
        self.lowercase
            .entry(name.as_str().to_lowercase())
            .or_insert_with(|| name.clone());
        self.players
            .insert(name.clone(), PlayerEntry::new(name.clone(), &self.config));
    }

    /// Pre-match values for a record, from state strictly before it
    fn snapshot(&self, record: &MatchRecord) -> Vec<Option<f64>> {
        let surface = record.surface_name();
        let side = |player: &PlayerName, metrics: SideMetrics| -> SideState {
            let Some(entry) = self.players.get(player) else {
                return SideState::default();
            };
            // Published values for the match itself are known before play
            SideState {
                rank: metrics.rank.or(entry.rank.last()),
                points: metrics.points.or(entry.points.last()),
                odds: metrics.odds.or(entry.last_odds),
                elo: Some(self.elo.get_rating(player)),
                surface_elo: Some(match surface {
                    Some(s) => self.elo.surface_rating_or_initial(player, s),
                    None => self.elo.initial_rating(),
                }),
                rest_days: Some(entry.rest_before(record.date)),
                ..self.history_side(entry, surface)
            }
        };

        let pair = PairState {
            player1: side(&record.player1, record.side1),
            player2: side(&record.player2, record.side2),
            head_to_head: self.head_to_head.get(&record.player1, &record.player2),
            year: record
                .year()
                .or(self.latest_year)
                .unwrap_or_else(current_year),
        };
        Feature::ALL
            .iter()
            .map(|f| derive(*f, &pair).ok())
            .collect()
    }

    /// Values that depend only on a player's own past results
    fn history_side(&self, entry: &PlayerEntry, surface: Option<&str>) -> SideState {
        SideState {
            form: entry.form(),
            surface_form: surface.and_then(|s| entry.surface_form(s)),
            games_margin: entry.games_margin(),
            sets_margin: entry.sets_margin(),
            tiebreak_rate: entry.tiebreak_rate(),
            rank_trend: entry.rank_trend(),
            points_trend: entry.points_trend(),
            surface_win_rate: entry.surface_win_rate(surface),
            ..SideState::default()
        }
    }

    fn apply(&mut self, record: &MatchRecord) {
        for player in [&record.player1, &record.player2] {
            if let (Some(appearance), Some(entry)) = (
                Appearance::from_record(record, player),
                self.players.get_mut(player),
            ) {
                entry.record(&appearance);
            }
        }
        self.head_to_head.update(record);
        self.elo.update(record);

        if let Some(surface) = record.surface_name() {
            self.surfaces.insert(surface.to_string());
        }
        if let Some(round) = record.round.as_deref().filter(|s| !s.is_empty()) {
            self.rounds.insert(round.to_string());
        }
        if let Some(court) = record.court.as_deref().filter(|s| !s.is_empty()) {
            self.courts.insert(court.to_string());
        }
        if let Some(year) = record.year() {
            self.latest_year = Some(self.latest_year.map_or(year, |y| y.max(year)));
        }
    }

    pub fn list_players(&self) -> Vec<&PlayerName> {
        self.players.keys().collect()
    }

    pub fn list_surfaces(&self) -> Vec<&str> {
        self.surfaces.iter().map(String::as_str).collect()
    }

    pub fn list_rounds(&self) -> Vec<&str> {
        self.rounds.iter().map(String::as_str).collect()
    }

    pub fn list_courts(&self) -> Vec<&str> {
        self.courts.iter().map(String::as_str).collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.latest_year
    }

    pub fn player(&self, name: &PlayerName) -> Option<&PlayerEntry> {
        self.players.get(name)
    }

    pub fn head_to_head(&self) -> &HeadToHead {
        &self.head_to_head
    }

    pub fn elo(&self) -> &EloRatings {
        &self.elo
    }

    /// Every folded record with its pre-match values, in chronological order
    pub fn history(&self) -> &[HistoricalRow] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Resolve a user-typed name: exact, then case-insensitive exact, then the
    /// first player (alphabetically) whose name contains the query.
    /// Best-effort: a short query may match several players.
    pub fn resolve_player(&self, query: &str) -> Option<&PlayerName> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Some((name, _)) = self.players.get_key_value(&PlayerName(query.to_string())) {
            return Some(name);
        }
        let lower = query.to_lowercase();
        if let Some(name) = self.lowercase.get(&lower) {
            return Some(name);
        }
        self.players
            .keys()
            .find(|name| name.as_str().to_lowercase().contains(&lower))
    }

    pub fn default_surface(&self) -> String {
        self.surfaces
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| FALLBACK_SURFACE.to_string())
    }

    pub fn default_court(&self) -> Option<String> {
        self.courts.iter().next().cloned()
    }

    pub fn default_round(&self) -> Option<String> {
        self.rounds.iter().next().cloned()
    }

    /// Fill unset context fields with catalog defaults
    pub fn resolve_context(&self, context: &MatchContext) -> MatchContext {
        let pick = |value: &Option<String>| value.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        MatchContext {
            surface: pick(&context.surface).or_else(|| Some(self.default_surface())),
            court: pick(&context.court).or_else(|| self.default_court()),
            round: pick(&context.round).or_else(|| self.default_round()),
            year: context.year.or(self.latest_year),
        }
    }

    /// Current state of two players ahead of a future meeting
    pub fn pair_state(
        &self,
        player1: &PlayerName,
        player2: &PlayerName,
        context: &MatchContext,
    ) -> PairState {
        let surface = context.surface.as_deref();
        let side = |player: &PlayerName| -> SideState {
            let Some(entry) = self.players.get(player) else {
                return SideState::default();
            };
            SideState {
                rank: entry.rank.last(),
                points: entry.points.last(),
                odds: entry.last_odds,
                elo: self.elo.rating(player),
                surface_elo: surface.and_then(|s| self.elo.surface_rating(player, s)),
                rest_days: entry.rest_days,
                ..self.history_side(entry, surface)
            }
        };

        PairState {
            player1: side(player1),
            player2: side(player2),
            head_to_head: self.head_to_head.get(player1, player2),
            year: context
                .year
                .or(self.latest_year)
                .unwrap_or_else(current_year),
        }
    }

    /// Resolve both players and compute the requested features.
    ///
    /// Features without data are reported in `missing` with value 0 rather
    /// than failing the request.
    pub fn prepare_features(&self, request: &FeatureRequest) -> Result<PreparedFeatures> {
        let player1 = self
            .resolve_player(&request.player1)
            .ok_or_else(|| TennisError::PlayerNotFound(request.player1.clone()))?;
        let player2 = self
            .resolve_player(&request.player2)
            .ok_or_else(|| TennisError::PlayerNotFound(request.player2.clone()))?;
        if player1 == player2 {
            return Err(TennisError::InvalidPairing(player1.to_string()));
        }

        let context = self.resolve_context(&request.context);
        let pair = self.pair_state(player1, player2, &context);

        let mut values = Vec::with_capacity(request.features.len());
        let mut missing = Vec::new();
        for name in &request.features {
            match derive_named(name, &pair) {
                Ok(value) if value.is_finite() => values.push((name.clone(), value)),
                _ => {
                    values.push((name.clone(), 0.0));
                    missing.push(name.clone());
                }
            }
        }
        if !missing.is_empty() {
            log::debug!(
                "{} vs {}: no data for {}",
                player1,
                player2,
                missing.join(", ")
            );
        }

        Ok(PreparedFeatures {
            player1: player1.clone(),
            player2: player2.clone(),
            context,
            values,
            missing,
        })
    }
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::score::parse_score;
    use chrono::NaiveDate;

    fn make_match(
        idx: usize,
        p1: &str,
        p2: &str,
        winner: &str,
        date: (i32, u32, u32),
        ranks: (f64, f64),
    ) -> MatchRecord {
        MatchRecord {
            source_index: idx,
            player1: PlayerName(p1.to_string()),
            player2: PlayerName(p2.to_string()),
            winner: Some(PlayerName(winner.to_string())),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            surface: Some("Hard".to_string()),
            round: Some("1st Round".to_string()),
            court: Some("Outdoor".to_string()),
            tournament: None,
            best_of: Some(3),
            side1: SideMetrics {
                rank: Some(ranks.0),
                points: Some(5000.0 / ranks.0),
                odds: Some(1.8),
            },
            side2: SideMetrics {
                rank: Some(ranks.1),
                points: Some(5000.0 / ranks.1),
                odds: Some(2.1),
            },
            score: parse_score("6-4 6-3"),
            label: None,
        }
    }

    fn make_history() -> Vec<MatchRecord> {
        vec![
            make_match(0, "Alpha", "Beta", "Alpha", (2021, 1, 10), (5.0, 9.0)),
            make_match(1, "Beta", "Gamma", "Beta", (2021, 1, 20), (8.0, 30.0)),
            make_match(2, "Alpha", "Gamma", "Gamma", (2021, 2, 1), (4.0, 28.0)),
            make_match(3, "Alpha", "Beta", "Beta", (2021, 2, 15), (4.0, 7.0)),
            make_match(4, "Gamma", "Alpha", "Alpha", (2022, 3, 1), (25.0, 3.0)),
            make_match(5, "Beta", "Alpha", "Alpha", (2022, 3, 9), (6.0, 3.0)),
        ]
    }

    fn build(records: Vec<MatchRecord>) -> Catalog {
        Catalog::build(records, &Config::default())
    }

    fn request(p1: &str, p2: &str, features: &[&str]) -> FeatureRequest {
        FeatureRequest {
            player1: p1.to_string(),
            player2: p2.to_string(),
            features: features.iter().map(|s| s.to_string()).collect(),
            context: MatchContext::default(),
        }
    }

    #[test]
    fn test_snapshot_rank_diff_uses_published_ranks() {
        let catalog = build(make_history());
        for row in catalog.history() {
            let expected = row.record.side2.rank.unwrap() - row.record.side1.rank.unwrap();
            assert_eq!(row.value(Feature::RankDiff), Some(expected));
        }
    }

    #[test]
    fn test_history_is_chronological() {
        let mut records = make_history();
        records.reverse();
        let catalog = build(records);
        let indices: Vec<usize> = catalog
            .history()
            .iter()
            .map(|r| r.record.source_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_future_record_does_not_change_earlier_snapshot() {
        let baseline = build(make_history());

        let mut extended = make_history();
        for i in 0..5 {
            extended.push(make_match(
                10 + i,
                "Gamma",
                "Beta",
                "Gamma",
                (2023, 1, 1 + i as u32),
                (2.0, 50.0),
            ));
        }
        // Listed first in the input but dated last
        extended.rotate_right(5);
        let extended = build(extended);

        for (before, after) in baseline.history().iter().zip(extended.history()) {
            assert_eq!(before.record.source_index, after.record.source_index);
            assert_eq!(before.values, after.values);
        }
    }

    #[test]
    fn test_first_meeting_has_no_head_to_head() {
        let catalog = build(make_history());
        let first = &catalog.history()[0];
        assert_eq!(first.value(Feature::H2hAdvantage), Some(0.0));
        assert_eq!(first.value(Feature::LastWinnerIndicator), Some(0.0));
        assert_eq!(first.value(Feature::EloDiff), Some(0.0));
        assert!(first.value(Feature::FormDiff).is_none());

        // Alpha vs Beta again: Alpha won the only earlier meeting
        let rematch = &catalog.history()[3];
        assert_eq!(rematch.value(Feature::H2hAdvantage), Some(1.0));
        assert_eq!(rematch.value(Feature::LastWinner), Some(1.0));
    }

    #[test]
    fn test_listing_and_defaults() {
        let catalog = build(make_history());
        let names: Vec<&str> = catalog.list_players().iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(catalog.list_surfaces(), vec!["Hard"]);
        assert_eq!(catalog.latest_year(), Some(2022));
        assert_eq!(catalog.default_round().as_deref(), Some("1st Round"));

        let empty = build(Vec::new());
        assert_eq!(empty.default_surface(), "Hard");
        assert!(empty.default_court().is_none());
    }

    #[test]
    fn test_resolve_player_order() {
        let mut records = make_history();
        records.push(make_match(6, "alphabet", "Betamax", "Betamax", (2022, 4, 1), (90.0, 80.0)));
        let catalog = build(records);

        assert_eq!(catalog.resolve_player("Alpha").unwrap().as_str(), "Alpha");
        assert_eq!(catalog.resolve_player("ALPHABET").unwrap().as_str(), "alphabet");
        // Substring fallback takes the first name in sorted order
        assert_eq!(catalog.resolve_player("bet").unwrap().as_str(), "Beta");
        assert_eq!(catalog.resolve_player("amm").unwrap().as_str(), "Gamma");
        assert!(catalog.resolve_player("Zeta").is_none());
        assert!(catalog.resolve_player("  ").is_none());
    }

    #[test]
    fn test_prepare_features_same_player_is_invalid() {
        let catalog = build(make_history());
        let result = catalog.prepare_features(&request("Alpha", "alpha", &["rank_diff"]));
        assert!(matches!(result, Err(TennisError::InvalidPairing(_))));
    }

    #[test]
    fn test_prepare_features_unknown_player() {
        let catalog = build(make_history());
        let result = catalog.prepare_features(&request("Alpha", "Zeta", &["rank_diff"]));
        assert!(matches!(result, Err(TennisError::PlayerNotFound(name)) if name == "Zeta"));
    }

    #[test]
    fn test_prepare_features_live_values() {
        let catalog = build(make_history());
        let prepared = catalog
            .prepare_features(&request("alpha", "Beta", &["rank_diff", "h2h_advantage", "year"]))
            .unwrap();
        assert_eq!(prepared.player1.as_str(), "Alpha");
        // Latest ranks: Alpha 3, Beta 6
        assert_eq!(prepared.value("rank_diff"), Some(3.0));
        // Alpha 2 wins, Beta 1 win
        assert!((prepared.value("h2h_advantage").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(prepared.value("year"), Some(2022.0));
        assert_eq!(prepared.context.surface.as_deref(), Some("Hard"));
        assert!(prepared.missing.is_empty());
    }

    #[test]
    fn test_players_without_data_report_every_feature_missing() {
        let bare = MatchRecord {
            source_index: 0,
            player1: PlayerName("Newcomer".to_string()),
            player2: PlayerName("Debutant".to_string()),
            winner: None,
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
        };
        let catalog = build(vec![bare]);
        let features = [
            "rank_diff",
            "pts_diff",
            "odd_diff",
            "elo_diff",
            "surface_elo_diff",
            "form_diff",
            "surface_form_diff",
            "tiebreak_rate_diff",
            "rank_trend_diff",
            "surface_winrate_adv",
            "serve_speed_diff",
        ];
        let prepared = catalog
            .prepare_features(&request("Newcomer", "Debutant", &features))
            .unwrap();
        assert_eq!(prepared.missing.len(), features.len());
        assert!(prepared.values.iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn test_snapshot_elo_is_pre_match_and_antisymmetric() {
        let before = build(make_history());
        let expected = before.elo().get_rating(&PlayerName("Alpha".to_string()))
            - before.elo().get_rating(&PlayerName("Beta".to_string()));
        assert!(expected != 0.0);

        let mut forward = make_history();
        forward.push(make_match(6, "Alpha", "Beta", "Alpha", (2022, 4, 1), (3.0, 6.0)));
        let mut swapped = make_history();
        swapped.push(make_match(6, "Beta", "Alpha", "Alpha", (2022, 4, 1), (6.0, 3.0)));
        let forward = build(forward);
        let swapped = build(swapped);
        let (f, s) = (forward.history().last().unwrap(), swapped.history().last().unwrap());

        let elo = f.value(Feature::EloDiff).unwrap();
        assert!((elo - expected).abs() < 1e-9);
        assert!((elo + s.value(Feature::EloDiff).unwrap()).abs() < 1e-9);
        assert!(
            (f.value(Feature::SurfaceEloDiff).unwrap() + s.value(Feature::SurfaceEloDiff).unwrap())
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_same_player_records_are_skipped() {
        let mut records = make_history();
        records.push(make_match(6, "Alpha", "Alpha", "Alpha", (2022, 5, 1), (3.0, 3.0)));
        let catalog = build(records);
        assert_eq!(catalog.history().len(), 6);
    }
}

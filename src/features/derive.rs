//! Feature derivation
//!
//! Turns the state of two players (plus their head-to-head record and the
//! match context) into named numeric features. The same function serves
//! point-in-time training snapshots and live predictions, so sign
//! conventions cannot drift between the two.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::head_to_head::HeadToHeadRecord;

/// Every numeric feature the pipeline knows about, in design-matrix order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    RankDiff,
    PtsDiff,
    OddDiff,
    EloDiff,
    SurfaceEloDiff,
    FormDiff,
    SurfaceFormDiff,
    GamesMarginDiff,
    SetsMarginDiff,
    RestDaysDiff,
    TiebreakRateDiff,
    RankTrendDiff,
    PointsTrendDiff,
    H2hAdvantage,
    LastWinnerIndicator,
    LastWinner,
    SurfaceWinrateAdv,
    Year,
}

impl Feature {
    pub const ALL: [Feature; 18] = [
        Feature::RankDiff,
        Feature::PtsDiff,
        Feature::OddDiff,
        Feature::EloDiff,
        Feature::SurfaceEloDiff,
        Feature::FormDiff,
        Feature::SurfaceFormDiff,
        Feature::GamesMarginDiff,
        Feature::SetsMarginDiff,
        Feature::RestDaysDiff,
        Feature::TiebreakRateDiff,
        Feature::RankTrendDiff,
        Feature::PointsTrendDiff,
        Feature::H2hAdvantage,
        Feature::LastWinnerIndicator,
        Feature::LastWinner,
        Feature::SurfaceWinrateAdv,
        Feature::Year,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::RankDiff => "rank_diff",
            Feature::PtsDiff => "pts_diff",
            Feature::OddDiff => "odd_diff",
            Feature::EloDiff => "elo_diff",
            Feature::SurfaceEloDiff => "surface_elo_diff",
            Feature::FormDiff => "form_diff",
            Feature::SurfaceFormDiff => "surface_form_diff",
            Feature::GamesMarginDiff => "games_margin_diff",
            Feature::SetsMarginDiff => "sets_margin_diff",
            Feature::RestDaysDiff => "rest_days_diff",
            Feature::TiebreakRateDiff => "tiebreak_rate_diff",
            Feature::RankTrendDiff => "rank_trend_diff",
            Feature::PointsTrendDiff => "points_trend_diff",
            Feature::H2hAdvantage => "h2h_advantage",
            Feature::LastWinnerIndicator => "last_winner_indicator",
            Feature::LastWinner => "last_winner",
            Feature::SurfaceWinrateAdv => "surface_winrate_adv",
            Feature::Year => "year",
        }
    }

    /// Case-insensitive lookup by column name
    pub fn from_name(name: &str) -> Option<Feature> {
        let name = name.trim().to_lowercase();
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Position within `Feature::ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a feature could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// Name does not match any known feature
    UnknownFeature,
    /// One or both players lack the history the feature needs
    NoData,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::UnknownFeature => write!(f, "unknown feature"),
            MissingReason::NoData => write!(f, "no data"),
        }
    }
}

pub type FeatureResult = std::result::Result<f64, MissingReason>;

/// Everything known about one player at the moment a feature is derived
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideState {
    pub rank: Option<f64>,
    pub points: Option<f64>,
    pub odds: Option<f64>,
    pub elo: Option<f64>,
    pub surface_elo: Option<f64>,
    pub form: Option<f64>,
    pub surface_form: Option<f64>,
    pub games_margin: Option<f64>,
    pub sets_margin: Option<f64>,
    pub rest_days: Option<f64>,
    pub tiebreak_rate: Option<f64>,
    pub rank_trend: Option<f64>,
    pub points_trend: Option<f64>,
    pub surface_win_rate: Option<f64>,
}

/// Two players about to meet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairState {
    pub player1: SideState,
    pub player2: SideState,
    /// Record of player1 against player2
    pub head_to_head: HeadToHeadRecord,
    pub year: i32,
}

impl PairState {
    /// The same meeting seen from the other side
    pub fn swapped(&self) -> PairState {
        let h2h = self.head_to_head;
        PairState {
            player1: self.player2,
            player2: self.player1,
            head_to_head: HeadToHeadRecord {
                wins: h2h.losses,
                losses: h2h.wins,
                last_winner: -h2h.last_winner,
            },
            year: self.year,
        }
    }
}

fn diff(a: Option<f64>, b: Option<f64>) -> FeatureResult {
    match (a, b) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Ok(a - b),
        _ => Err(MissingReason::NoData),
    }
}

/// Compute one feature for a pair
pub fn derive(feature: Feature, pair: &PairState) -> FeatureResult {
    let (p1, p2) = (&pair.player1, &pair.player2);
    match feature {
        // Lower rank number is better: positive means player2 is ranked worse
        Feature::RankDiff => diff(p2.rank, p1.rank),
        Feature::PtsDiff => diff(p1.points, p2.points),
        Feature::OddDiff => diff(p2.odds, p1.odds),
        Feature::EloDiff => diff(p1.elo, p2.elo),
        Feature::SurfaceEloDiff => diff(p1.surface_elo, p2.surface_elo),
        Feature::FormDiff => diff(p1.form, p2.form),
        Feature::SurfaceFormDiff => diff(p1.surface_form, p2.surface_form),
        Feature::GamesMarginDiff => diff(p1.games_margin, p2.games_margin),
        Feature::SetsMarginDiff => diff(p1.sets_margin, p2.sets_margin),
        Feature::RestDaysDiff => diff(p1.rest_days, p2.rest_days),
        Feature::TiebreakRateDiff => diff(p1.tiebreak_rate, p2.tiebreak_rate),
        Feature::RankTrendDiff => diff(p1.rank_trend, p2.rank_trend),
        Feature::PointsTrendDiff => diff(p1.points_trend, p2.points_trend),
        Feature::SurfaceWinrateAdv => diff(p1.surface_win_rate, p2.surface_win_rate),
        Feature::H2hAdvantage => Ok(pair.head_to_head.advantage()),
        Feature::LastWinnerIndicator => Ok(pair.head_to_head.last_winner_indicator() as f64),
        Feature::LastWinner => Ok(if pair.head_to_head.last_winner_indicator() > 0 {
            1.0
        } else {
            0.0
        }),
        Feature::Year => Ok(pair.year as f64),
    }
}

/// Compute a feature by column name
pub fn derive_named(name: &str, pair: &PairState) -> FeatureResult {
    let feature = Feature::from_name(name).ok_or(MissingReason::UnknownFeature)?;
    derive(feature, pair)
}

//! Header alias table
//!
//! Historical exports spell the same column many ways (`Player_1`,
//! `player1`, `Player 1`). Headers are normalised and matched against an
//! explicit alias table once per load.

use std::collections::HashMap;

use crate::features::derive::Feature;

/// Raw (non-feature) columns the pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Player1,
    Player2,
    Winner,
    Date,
    Surface,
    Court,
    Round,
    Tournament,
    BestOf,
    Rank1,
    Rank2,
    Points1,
    Points2,
    Odds1,
    Odds2,
    Score,
    Label,
}

impl Field {
    /// Name used when the column is written back out
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Field::Player1 => "Player_1",
            Field::Player2 => "Player_2",
            Field::Winner => "Winner",
            Field::Date => "Date",
            Field::Surface => "Surface",
            Field::Court => "Court",
            Field::Round => "Round",
            Field::Tournament => "Tournament",
            Field::BestOf => "Best of",
            Field::Rank1 => "Rank_1",
            Field::Rank2 => "Rank_2",
            Field::Points1 => "Pts_1",
            Field::Points2 => "Pts_2",
            Field::Odds1 => "Odd_1",
            Field::Odds2 => "Odd_2",
            Field::Score => "Score",
            Field::Label => "y",
        }
    }

    /// Categorical columns one-hot encoded into the design matrix
    pub const CATEGORICAL: [Field; 3] = [Field::Surface, Field::Court, Field::Round];

    /// Columns that identify the match or leak its outcome; never used as features
    pub const LEAKAGE: [Field; 12] = [
        Field::Player1,
        Field::Player2,
        Field::Winner,
        Field::Date,
        Field::Tournament,
        Field::Score,
        Field::Rank1,
        Field::Rank2,
        Field::Points1,
        Field::Points2,
        Field::Odds1,
        Field::Odds2,
    ];
}

/// Lowercase, trim, and turn spaces/hyphens into underscores
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Accepted source spellings per field, compared after normalisation
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(Field, Vec<String>)>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let table: [(Field, &[&str]); 17] = [
            (Field::Player1, &["player_1", "player1", "player_one", "p1"]),
            (Field::Player2, &["player_2", "player2", "player_two", "p2"]),
            (Field::Winner, &["winner", "match_winner"]),
            (Field::Date, &["date", "match_date", "tourney_date"]),
            (Field::Surface, &["surface"]),
            (Field::Court, &["court", "court_type"]),
            (Field::Round, &["round"]),
            (Field::Tournament, &["tournament", "tourney_name", "series"]),
            (Field::BestOf, &["best_of", "bestof"]),
            (Field::Rank1, &["rank_1", "rank1", "player_1_rank"]),
            (Field::Rank2, &["rank_2", "rank2", "player_2_rank"]),
            (Field::Points1, &["pts_1", "pts1", "points_1", "points1"]),
            (Field::Points2, &["pts_2", "pts2", "points_2", "points2"]),
            (Field::Odds1, &["odd_1", "odd1", "odds_1", "odds1"]),
            (Field::Odds2, &["odd_2", "odd2", "odds_2", "odds2"]),
            (Field::Score, &["score", "result"]),
            (Field::Label, &["y", "label", "target"]),
        ];
        AliasTable {
            entries: table
                .iter()
                .map(|(field, spellings)| {
                    (*field, spellings.iter().map(|s| s.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl AliasTable {
    /// Add an extra accepted spelling for a field
    pub fn with_alias(mut self, field: Field, spelling: &str) -> Self {
        let spelling = normalize_header(spelling);
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, spellings)) => spellings.push(spelling),
            None => self.entries.push((field, vec![spelling])),
        }
        self
    }

    fn lookup(&self, normalized: &str) -> Option<Field> {
        self.entries
            .iter()
            .find(|(_, spellings)| spellings.iter().any(|s| s == normalized))
            .map(|(field, _)| *field)
    }
}

/// Column positions resolved from a header row
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    headers: Vec<String>,
    fields: HashMap<Field, usize>,
    features: HashMap<Feature, usize>,
}

impl ColumnMap {
    /// Resolve headers once. The first column matching a field wins.
    pub fn resolve(headers: &[String], aliases: &AliasTable) -> Self {
        let mut fields = HashMap::new();
        let mut features = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header);
            if let Some(feature) = Feature::from_name(&normalized) {
                features.entry(feature).or_insert(idx);
            } else if let Some(field) = aliases.lookup(&normalized) {
                fields.entry(field).or_insert(idx);
            }
        }
        ColumnMap {
            headers: headers.to_vec(),
            fields,
            features,
        }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.fields.get(&field).copied()
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn feature(&self, feature: Feature) -> Option<usize> {
        self.features.get(&feature).copied()
    }

    /// Features present in the header, in design-matrix order
    pub fn present_features(&self) -> Vec<Feature> {
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| self.features.contains_key(f))
            .collect()
    }

    /// Original header text of the leakage-prone columns present in the input
    pub fn leakage_headers(&self) -> Vec<String> {
        let mut dropped: Vec<(usize, String)> = Field::LEAKAGE
            .iter()
            .filter_map(|f| self.get(*f))
            .map(|idx| (idx, self.headers[idx].clone()))
            .collect();
        dropped.sort();
        dropped.into_iter().map(|(_, h)| h).collect()
    }

    /// Trimmed, non-empty value of a field in a row
    pub fn value<'a>(&self, row: &'a [String], field: Field) -> Option<&'a str> {
        let idx = self.get(field)?;
        row.get(idx).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Trimmed value of a feature column in a row
    pub fn feature_value<'a>(&self, row: &'a [String], feature: Feature) -> Option<&'a str> {
        let idx = self.feature(feature)?;
        row.get(idx).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

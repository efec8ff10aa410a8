//! Tennis match prediction dataset preparation
//!
//! Turns raw historical match rows into a leakage-free, normalized training
//! dataset and reproduces the same feature layout for live predictions.

pub mod data;
pub mod features;
pub mod predict;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::features::score::ScoreLine;

/// Canonical (case-sensitive) player name as it appears in the source data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerName(pub String);

impl PlayerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a match from player 1's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Player1,
    Player2,
}

/// Per-side published values at match time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SideMetrics {
    pub rank: Option<f64>,
    pub points: Option<f64>,
    pub odds: Option<f64>,
}

/// A single historical match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Position of the row in the source file, used as a sort tie-breaker
    pub source_index: usize,
    pub player1: PlayerName,
    pub player2: PlayerName,
    pub winner: Option<PlayerName>,
    pub date: Option<NaiveDate>,
    pub surface: Option<String>,
    pub round: Option<String>,
    pub court: Option<String>,
    pub tournament: Option<String>,
    pub best_of: Option<u8>,
    pub side1: SideMetrics,
    pub side2: SideMetrics,
    pub score: Option<ScoreLine>,
    /// Raw `y` label if the source carried one
    pub label: Option<f64>,
}

impl MatchRecord {
    /// Who won, from the winner name first and the label second
    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(winner) = &self.winner {
            if *winner == self.player1 {
                return Some(Outcome::Player1);
            }
            if *winner == self.player2 {
                return Some(Outcome::Player2);
            }
        }
        match self.label {
            Some(y) if y.is_finite() => {
                if y.round() >= 1.0 {
                    Some(Outcome::Player1)
                } else {
                    Some(Outcome::Player2)
                }
            }
            _ => None,
        }
    }

    /// Check if the given player won this match
    pub fn did_win(&self, player: &PlayerName) -> Option<bool> {
        let outcome = self.outcome()?;
        if *player == self.player1 {
            Some(outcome == Outcome::Player1)
        } else if *player == self.player2 {
            Some(outcome == Outcome::Player2)
        } else {
            None
        }
    }

    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.date.map(|d| d.year())
    }

    /// Non-empty surface, if any
    pub fn surface_name(&self) -> Option<&str> {
        self.surface.as_deref().filter(|s| !s.is_empty())
    }
}

/// Win probability for a pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub player1: PlayerName,
    pub player2: PlayerName,
    /// Probability that player 1 wins, in [0, 1]
    pub player1_win_prob: f64,
    pub confidence: ConfidenceLevel,
    pub missing_features: Vec<String>,
}

impl Prediction {
    /// Player with at least even odds
    pub fn predicted_winner(&self) -> &PlayerName {
        if self.player1_win_prob >= 0.5 {
            &self.player1
        } else {
            &self.player2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,   // Every feature had data
    Medium, // Under half the features were missing
    Low,    // Half or more were missing
}

impl ConfidenceLevel {
    pub fn from_missing(missing: usize, total: usize) -> Self {
        if missing == 0 {
            ConfidenceLevel::High
        } else if missing * 2 < total {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum TennisError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Insufficient data: {rows} valid rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid pairing: both names resolve to {0}")]
    InvalidPairing(String),

    #[error("Invalid numeric input for {field}: {value}")]
    InvalidNumericInput { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No dataset artifacts at {0}. Run 'tennis dataset' first.")]
    NoArtifacts(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TennisError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub elo: EloConfig,
    pub dataset: DatasetConfig,
    pub preprocess: PreprocessConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Recent matches kept for form, margins and tiebreak rate
    pub form_window: usize,
    /// Recent matches kept per surface for surface form
    pub surface_form_window: usize,
    pub min_form_matches: usize,
    pub min_surface_form_matches: usize,
    pub default_rest_days: f64,
    pub max_rest_days: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            form_window: 10,
            surface_form_window: 6,
            min_form_matches: 3,
            min_surface_form_matches: 2,
            default_rest_days: 30.0,
            max_rest_days: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    pub k_factor: f64,
    pub surface_k_factor: f64,
    pub initial_rating: f64,
    /// Per-year regression towards the initial rating
    pub yearly_decay: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: 32.0,
            surface_k_factor: 24.0,
            initial_rating: 1500.0,
            yearly_decay: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub test_size: f64,
    pub seed: u64,
    pub min_rows: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            test_size: 0.2,
            seed: 42,
            min_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub min_year: i32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig { min_year: 2010 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub csv_path: String,
    pub artifacts_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            csv_path: "data/processed_matches.csv".to_string(),
            artifacts_path: "model/artifacts.json".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TennisError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TennisError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TennisError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let test_size = self.dataset.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(TennisError::Config(format!(
                "dataset.test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        if self.catalog.form_window == 0 || self.catalog.surface_form_window == 0 {
            return Err(TennisError::Config(
                "catalog windows must hold at least one match".to_string(),
            ));
        }
        if self.catalog.max_rest_days < 0.0 {
            return Err(TennisError::Config(
                "catalog.max_rest_days must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

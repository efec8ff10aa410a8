//! Prediction-time vectorization
//!
//! Reproduces the training feature layout for a new pairing from the catalog
//! and the saved dataset artifacts, then hands the vector to a classifier.

use serde::Serialize;
use std::collections::HashMap;

use crate::data::aliases::Field;
use crate::data::dataset::{DatasetArtifacts, PreparedDataset};
use crate::features::catalog::{Catalog, FeatureRequest, MatchContext};
use crate::{ConfidenceLevel, PlayerName, Prediction, Result, TennisError};

/// External model scoring an encoded vector
pub trait Classifier {
    /// Probability that player 1 wins
    fn predict_proba(&self, features: &[f64]) -> f64;
}

impl<F> Classifier for F
where
    F: Fn(&[f64]) -> f64,
{
    fn predict_proba(&self, features: &[f64]) -> f64 {
        self(features)
    }
}

/// A feature vector built for a named pairing
#[derive(Debug, Clone, Serialize)]
pub struct VectorizedMatch {
    pub vector: Vec<f64>,
    pub resolved_players: (PlayerName, PlayerName),
    pub missing_features: Vec<String>,
    pub context: MatchContext,
}

/// Builds prediction vectors in the training layout
#[derive(Debug, Clone)]
pub struct Vectorizer {
    catalog: Catalog,
    artifacts: DatasetArtifacts,
}

impl Vectorizer {
    pub fn new(catalog: Catalog, artifacts: DatasetArtifacts) -> Self {
        Vectorizer { catalog, artifacts }
    }

    pub fn from_dataset(dataset: PreparedDataset) -> Self {
        Self::new(dataset.catalog, dataset.artifacts)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn artifacts(&self) -> &DatasetArtifacts {
        &self.artifacts
    }

    pub fn width(&self) -> usize {
        self.artifacts.width()
    }

    /// Vector for two players from current catalog state. Features without
    /// data enter as 0 before scaling and are listed in `missing_features`.
    pub fn vectorize_from_players(
        &self,
        player1: &str,
        player2: &str,
        context: &MatchContext,
    ) -> Result<VectorizedMatch> {
        let request = FeatureRequest {
            player1: player1.to_string(),
            player2: player2.to_string(),
            features: self
                .artifacts
                .numeric_features
                .iter()
                .map(|f| f.name().to_string())
                .collect(),
            context: context.clone(),
        };
        let prepared = self.catalog.prepare_features(&request)?;

        let numeric: Vec<f64> = prepared.values.iter().map(|(_, v)| *v).collect();
        let categorical = self.categorical_values(&prepared.context);
        let vector = self.artifacts.encode(&numeric, &categorical);

        Ok(VectorizedMatch {
            vector,
            resolved_players: (prepared.player1, prepared.player2),
            missing_features: prepared.missing,
            context: prepared.context,
        })
    }

    /// Vector from caller-supplied numeric values, keyed by column name.
    /// Every numeric column must be present and finite.
    pub fn vectorize_raw(
        &self,
        values: &HashMap<String, f64>,
        context: &MatchContext,
    ) -> Result<Vec<f64>> {
        let numeric = self
            .artifacts
            .numeric_features
            .iter()
            .map(|feature| {
                let name = feature.name();
                match values.get(name) {
                    Some(v) if v.is_finite() => Ok(*v),
                    Some(v) => Err(TennisError::InvalidNumericInput {
                        field: name.to_string(),
                        value: v.to_string(),
                    }),
                    None => Err(TennisError::InvalidNumericInput {
                        field: name.to_string(),
                        value: "missing".to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        let categorical = self.categorical_values(context);
        Ok(self.artifacts.encode(&numeric, &categorical))
    }

    fn categorical_values(&self, context: &MatchContext) -> Vec<Option<String>> {
        self.artifacts
            .categorical_columns
            .iter()
            .map(|column| {
                if column == Field::Surface.canonical_name() {
                    context.surface.clone()
                } else if column == Field::Court.canonical_name() {
                    context.court.clone()
                } else if column == Field::Round.canonical_name() {
                    context.round.clone()
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Vectorizer paired with a classifier
pub struct Predictor<C: Classifier> {
    vectorizer: Vectorizer,
    classifier: C,
}

impl<C: Classifier> Predictor<C> {
    pub fn new(vectorizer: Vectorizer, classifier: C) -> Self {
        Predictor {
            vectorizer,
            classifier,
        }
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    /// Predict a single match
    pub fn predict(&self, player1: &str, player2: &str, context: &MatchContext) -> Result<Prediction> {
        let vectorized = self
            .vectorizer
            .vectorize_from_players(player1, player2, context)?;

        let raw = self.classifier.predict_proba(&vectorized.vector);
        let player1_win_prob = if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            log::warn!("Classifier returned {} for {} vs {}", raw, player1, player2);
            0.5
        };

        let total = self.vectorizer.artifacts().numeric_features.len();
        let missing = vectorized.missing_features;
        if !missing.is_empty() {
            log::warn!(
                "{} of {} features missing for {} vs {}: {}",
                missing.len(),
                total,
                vectorized.resolved_players.0,
                vectorized.resolved_players.1,
                missing.join(", ")
            );
        }

        let (p1, p2) = vectorized.resolved_players;
        Ok(Prediction {
            player1: p1,
            player2: p2,
            player1_win_prob,
            confidence: ConfidenceLevel::from_missing(missing.len(), total),
            missing_features: missing,
        })
    }

    /// Predict multiple matches
    pub fn predict_batch(
        &self,
        matches: &[(String, String)],
        context: &MatchContext,
    ) -> Vec<Result<Prediction>> {
        matches
            .iter()
            .map(|(p1, p2)| self.predict(p1, p2, context))
            .collect()
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction) -> String {
    let winner = pred.predicted_winner();
    let win_prob = if pred.player1_win_prob >= 0.5 {
        pred.player1_win_prob
    } else {
        1.0 - pred.player1_win_prob
    };
    let missing = if pred.missing_features.is_empty() {
        "none".to_string()
    } else {
        pred.missing_features.join(", ")
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Win probability:  {} {:.1}%
│  Confidence:       {}
│  Missing features: {}
└─────────────────────────────────────────────────┘
"#,
        pred.player1,
        pred.player2,
        winner,
        win_prob * 100.0,
        pred.confidence,
        missing
    )
}

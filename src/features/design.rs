//! Design matrix layout
//!
//! Numeric columns in their declared order followed by one indicator column
//! per categorical level. Levels come from the training split only and are
//! frozen afterwards, so test rows and live predictions share the layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row before scaling and encoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Values for `DesignMatrix::numeric_columns`, all finite
    pub numeric: Vec<f64>,
    /// Values for each categorical column, `None` when blank
    pub categorical: Vec<Option<String>>,
    pub label: u8,
}

/// Sorted distinct levels of one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalVocabulary {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoricalVocabulary {
    pub fn fit<'a, I>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let levels: BTreeSet<String> = values
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        CategoricalVocabulary {
            column: column.to_string(),
            levels: levels.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Indicator per level; a value outside the vocabulary is all zeros
    pub fn one_hot(&self, value: Option<&str>) -> Vec<f64> {
        let value = value.map(str::trim);
        self.levels
            .iter()
            .map(|level| if Some(level.as_str()) == value { 1.0 } else { 0.0 })
            .collect()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }
}

/// Column layout shared by every encoded vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    pub numeric_columns: Vec<String>,
    pub vocabularies: Vec<CategoricalVocabulary>,
}

impl DesignMatrix {
    /// Fit vocabularies on training rows. `categorical_columns[i]` names
    /// `RawRow::categorical[i]`.
    pub fn fit(
        numeric_columns: Vec<String>,
        categorical_columns: &[String],
        train_rows: &[RawRow],
    ) -> Self {
        let vocabularies = categorical_columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                CategoricalVocabulary::fit(
                    name,
                    train_rows
                        .iter()
                        .map(|row| row.categorical.get(col).and_then(|v| v.as_deref())),
                )
            })
            .collect();
        DesignMatrix {
            numeric_columns,
            vocabularies,
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        for vocabulary in &self.vocabularies {
            names.extend(vocabulary.feature_names());
        }
        names
    }

    pub fn width(&self) -> usize {
        self.numeric_columns.len() + self.vocabularies.iter().map(|v| v.len()).sum::<usize>()
    }

    /// Append one-hot blocks to already-scaled numeric values
    pub fn encode(&self, scaled_numeric: &[f64], categorical: &[Option<String>]) -> Vec<f64> {
        let mut vector = Vec::with_capacity(self.width());
        vector.extend_from_slice(scaled_numeric);
        for (col, vocabulary) in self.vocabularies.iter().enumerate() {
            let value = categorical.get(col).and_then(|v| v.as_deref());
            vector.extend(vocabulary.one_hot(value));
        }
        vector
    }
}

/// Round a raw label to {0, 1}; `None` when it is not finite
pub fn encode_label(raw: f64) -> Option<u8> {
    if !raw.is_finite() {
        return None;
    }
    Some(if raw.round() >= 1.0 { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(surface: &str, round: Option<&str>) -> RawRow {
        RawRow {
            numeric: vec![1.0, 2.0],
            categorical: vec![Some(surface.to_string()), round.map(str::to_string)],
            label: 1,
        }
    }

    fn categorical_names() -> Vec<String> {
        vec!["Surface".to_string(), "Round".to_string()]
    }

    #[test]
    fn test_vocabulary_sorted_and_deduplicated() {
        let vocabulary =
            CategoricalVocabulary::fit("Surface", [Some("Hard"), Some("Clay"), None, Some("Hard"), Some(" ")]);
        assert_eq!(vocabulary.levels, vec!["Clay", "Hard"]);
        assert_eq!(vocabulary.feature_names(), vec!["Surface_Clay", "Surface_Hard"]);
    }

    #[test]
    fn test_unseen_level_encodes_to_zeros() {
        let vocabulary = CategoricalVocabulary::fit("Surface", [Some("Clay"), Some("Hard")]);
        assert_eq!(vocabulary.one_hot(Some("Hard")), vec![0.0, 1.0]);
        assert_eq!(vocabulary.one_hot(Some("Grass")), vec![0.0, 0.0]);
        assert_eq!(vocabulary.one_hot(None), vec![0.0, 0.0]);
    }

    #[test]
    fn test_layout_fitted_on_train_rows_only() {
        let train = vec![make_row("Hard", Some("Final")), make_row("Clay", None)];
        let design = DesignMatrix::fit(
            vec!["rank_diff".to_string(), "year".to_string()],
            &categorical_names(),
            &train,
        );
        assert_eq!(
            design.feature_names(),
            vec!["rank_diff", "year", "Surface_Clay", "Surface_Hard", "Round_Final"]
        );
        assert_eq!(design.width(), 5);

        // A test row on grass gets no surface indicator
        let test_row = make_row("Grass", Some("Final"));
        let vector = design.encode(&test_row.numeric, &test_row.categorical);
        assert_eq!(vector, vec![1.0, 2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_encode_label() {
        assert_eq!(encode_label(1.0), Some(1));
        assert_eq!(encode_label(0.4), Some(0));
        assert_eq!(encode_label(0.5), Some(1));
        assert_eq!(encode_label(-2.0), Some(0));
        assert_eq!(encode_label(3.0), Some(1));
        assert_eq!(encode_label(f64::NAN), None);
    }
}

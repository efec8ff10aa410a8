//! Z-score normalization of numeric columns
//!
//! Statistics are fitted once on training rows and reused verbatim for test
//! rows and live predictions.

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// `(x - mean) / std`, or 0 for a constant column
    pub fn apply(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    columns: Vec<ColumnStats>,
}

impl Scaler {
    /// Fit one `ColumnStats` per name over `rows[i][column]`
    pub fn fit(names: &[String], rows: &[Vec<f64>]) -> Self {
        let count = rows.len() as f64;
        let columns = names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                if rows.is_empty() {
                    return ColumnStats {
                        name: name.clone(),
                        mean: 0.0,
                        std: 0.0,
                    };
                }
                let mut sum = 0.0;
                let mut sum_sq = 0.0;
                for row in rows {
                    let x = row.get(col).copied().unwrap_or(0.0);
                    sum += x;
                    sum_sq += x * x;
                }
                let mean = sum / count;
                // Clamp tiny negative variances from cancellation
                let variance = (sum_sq / count - mean * mean).max(0.0);
                ColumnStats {
                    name: name.clone(),
                    mean,
                    std: variance.sqrt(),
                }
            })
            .collect();
        Scaler { columns }
    }

    pub fn columns(&self) -> &[ColumnStats] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Scale a single value of column `col`; unknown columns pass through
    pub fn transform_value(&self, col: usize, value: f64) -> f64 {
        match self.columns.get(col) {
            Some(stats) => stats.apply(value),
            None => value,
        }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(col, x)| self.transform_value(col, *x))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("col_{}", i)).collect()
    }

    #[test]
    fn test_fit_population_std() {
        let rows = vec![vec![2.0, 5.0], vec![4.0, 5.0], vec![6.0, 5.0]];
        let scaler = Scaler::fit(&names(2), &rows);
        let stats = &scaler.columns()[0];
        assert!((stats.mean - 4.0).abs() < 1e-12);
        assert!((stats.std - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.columns()[1].std, 0.0);
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let rows = vec![vec![3.0], vec![3.0]];
        let scaler = Scaler::fit(&names(1), &rows);
        assert_eq!(scaler.transform(&[3.0]), vec![0.0]);
        assert_eq!(scaler.transform(&[100.0]), vec![0.0]);
    }

    #[test]
    fn test_transform_is_repeatable() {
        let rows = vec![vec![1.0, -3.0], vec![2.0, 0.5], vec![7.0, 9.0]];
        let scaler = Scaler::fit(&names(2), &rows);
        let first: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        let _ = scaler.transform(&[100.0, 100.0]);
        let second: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        assert_eq!(first, second);

        let column: Vec<f64> = first.iter().map(|r| r[0]).collect();
        let mean: f64 = column.iter().sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_serde_roundtrip_preserves_stats() {
        let scaler = Scaler::fit(&names(1), &[vec![1.0], vec![3.0]]);
        let json = serde_json::to_string(&scaler).unwrap();
        let parsed: Scaler = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scaler);
        assert_eq!(parsed.transform_value(0, 3.0), 1.0);
    }

    #[test]
    fn test_empty_fit() {
        let scaler = Scaler::fit(&names(2), &[]);
        assert_eq!(scaler.len(), 2);
        assert_eq!(scaler.transform(&[5.0, -1.0]), vec![0.0, 0.0]);
    }
}

//! Dataset assembly
//!
//! Fixed pipeline: parse, resolve headers, build the player catalog from the
//! raw rows, drop leakage-prone columns, cast and filter rows, split, fit the
//! vocabularies and scaler on the training split, then encode both splits.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::aliases::{AliasTable, ColumnMap, Field};
use crate::data::csv_parser::parse_table;
use crate::data::records::parse_number;
use crate::data::split::{stratified_split, Split};
use crate::features::catalog::Catalog;
use crate::features::derive::Feature;
use crate::features::design::{encode_label, DesignMatrix, RawRow};
use crate::features::scaler::Scaler;
use crate::{Config, Result, TennisError};

/// Everything needed to rebuild a feature vector without the source CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetArtifacts {
    pub feature_names: Vec<String>,
    pub numeric_features: Vec<Feature>,
    pub categorical_columns: Vec<String>,
    pub design: DesignMatrix,
    pub scaler: Scaler,
    /// Source headers excluded as identifiers or outcome-linked values
    pub dropped_columns: Vec<String>,
    pub label_column: String,
    pub seed: u64,
    pub test_size: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl DatasetArtifacts {
    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    /// Scale numeric values and append the one-hot blocks
    pub fn encode(&self, numeric: &[f64], categorical: &[Option<String>]) -> Vec<f64> {
        self.design.encode(&self.scaler.transform(numeric), categorical)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved dataset artifacts to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Encoded train/test matrices plus the state that produced them
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub train_matrix: Vec<Vec<f64>>,
    pub train_labels: Vec<u8>,
    pub test_matrix: Vec<Vec<f64>>,
    pub test_labels: Vec<u8>,
    pub feature_names: Vec<String>,
    pub artifacts: DatasetArtifacts,
    /// Indices into the rows that passed validation
    pub split: Split,
    pub catalog: Catalog,
}

impl PreparedDataset {
    /// Write `train.csv` and `test.csv` (features then `y`) into `dir`
    pub fn write_csv<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_matrix(&dir.join("train.csv"), &self.feature_names, &self.train_matrix, &self.train_labels)?;
        write_matrix(&dir.join("test.csv"), &self.feature_names, &self.test_matrix, &self.test_labels)?;
        Ok(())
    }
}

fn write_matrix(path: &Path, names: &[String], matrix: &[Vec<f64>], labels: &[u8]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header: Vec<&str> = names.iter().map(String::as_str).collect();
    header.push("y");
    writer.write_record(&header)?;
    for (row, label) in matrix.iter().zip(labels) {
        let mut fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        fields.push(label.to_string());
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a CSV file and run `load_dataset` on it
pub fn load_dataset_from_path<P: AsRef<Path>>(path: P, config: &Config) -> Result<PreparedDataset> {
    let text = std::fs::read_to_string(path.as_ref())?;
    load_dataset(&text, config)
}

/// Build train/test matrices from CSV text
pub fn load_dataset(csv_text: &str, config: &Config) -> Result<PreparedDataset> {
    let table = parse_table(csv_text)?;
    let columns = ColumnMap::resolve(&table.headers, &AliasTable::default());

    if !columns.has(Field::Label) {
        return Err(TennisError::Schema("missing label column `y`".to_string()));
    }
    let numeric_features = columns.present_features();
    if numeric_features.is_empty() {
        return Err(TennisError::Schema(
            "no numeric feature columns found".to_string(),
        ));
    }

    // Built before any row is filtered so every match feeds player state
    let catalog = Catalog::from_table(&table, &columns, config);

    let dropped_columns = columns.leakage_headers();
    log::debug!("Dropping leakage-prone columns: {:?}", dropped_columns);

    let categorical_fields: Vec<Field> = Field::CATEGORICAL
        .iter()
        .copied()
        .filter(|f| columns.has(*f))
        .collect();

    let rows: Vec<RawRow> = table
        .rows
        .iter()
        .filter_map(|row| {
            let label = columns
                .value(row, Field::Label)
                .and_then(parse_number)
                .and_then(encode_label)?;
            let numeric = numeric_features
                .iter()
                .map(|f| columns.feature_value(row, *f).and_then(parse_number))
                .collect::<Option<Vec<f64>>>()?;
            let categorical = categorical_fields
                .iter()
                .map(|f| columns.value(row, *f).map(str::to_string))
                .collect();
            Some(RawRow {
                numeric,
                categorical,
                label,
            })
        })
        .collect();

    log::info!(
        "{} of {} rows valid across {} numeric columns",
        rows.len(),
        table.len(),
        numeric_features.len()
    );
    let required = config.dataset.min_rows;
    if rows.len() < required {
        return Err(TennisError::InsufficientData {
            rows: rows.len(),
            required,
        });
    }

    let labels: Vec<u8> = rows.iter().map(|r| r.label).collect();
    let split = stratified_split(&labels, config.dataset.test_size, config.dataset.seed);
    let train_rows: Vec<RawRow> = split.train.iter().map(|&i| rows[i].clone()).collect();
    let test_rows: Vec<RawRow> = split.test.iter().map(|&i| rows[i].clone()).collect();
    log::info!("Split: train={}, test={}", train_rows.len(), test_rows.len());

    let numeric_columns: Vec<String> = numeric_features.iter().map(|f| f.name().to_string()).collect();
    let categorical_columns: Vec<String> = categorical_fields
        .iter()
        .map(|f| f.canonical_name().to_string())
        .collect();
    let design = DesignMatrix::fit(numeric_columns.clone(), &categorical_columns, &train_rows);
    let train_numeric: Vec<Vec<f64>> = train_rows.iter().map(|r| r.numeric.clone()).collect();
    let scaler = Scaler::fit(&numeric_columns, &train_numeric);
    let feature_names = design.feature_names();
    log::info!("Feature width: {}", feature_names.len());

    let artifacts = DatasetArtifacts {
        feature_names: feature_names.clone(),
        numeric_features,
        categorical_columns,
        design,
        scaler,
        dropped_columns,
        label_column: Field::Label.canonical_name().to_string(),
        seed: config.dataset.seed,
        test_size: config.dataset.test_size,
        train_rows: train_rows.len(),
        test_rows: test_rows.len(),
    };

    let encode = |rows: &[RawRow]| -> Vec<Vec<f64>> {
        rows.iter()
            .map(|r| artifacts.encode(&r.numeric, &r.categorical))
            .collect()
    };
    let train_matrix = encode(&train_rows);
    let test_matrix = encode(&test_rows);

    Ok(PreparedDataset {
        train_matrix,
        train_labels: train_rows.iter().map(|r| r.label).collect(),
        test_matrix,
        test_labels: test_rows.iter().map(|r| r.label).collect(),
        feature_names,
        artifacts,
        split,
        catalog,
    })
}

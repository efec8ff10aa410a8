//! Raw match dump to processed training CSV
//!
//! Replays the raw matches through the catalog and writes each match's
//! pre-match engineered columns next to its identifiers and outcome label.

use std::io::Write;

use crate::data::aliases::{AliasTable, ColumnMap, Field};
use crate::data::csv_parser::parse_table;
use crate::data::records::parse_records;
use crate::features::catalog::Catalog;
use crate::features::derive::Feature;
use crate::{Config, Outcome, Result, TennisError};

/// Identifier columns copied from the raw row, in output order
const PASSTHROUGH: [Field; 10] = [
    Field::Tournament,
    Field::Date,
    Field::Court,
    Field::Surface,
    Field::Round,
    Field::BestOf,
    Field::Player1,
    Field::Player2,
    Field::Winner,
    Field::Score,
];

/// Processed rows ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ProcessedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TennisError::MalformedInput(e.to_string()))
    }
}

/// Turn a raw match dump into processed rows.
///
/// Undated matches and matches before `preprocess.min_year` are left out
/// before the fold, as are rows missing any engineered value or a decided
/// outcome.
pub fn preprocess(raw_text: &str, config: &Config) -> Result<ProcessedTable> {
    let table = parse_table(raw_text)?;
    let columns = ColumnMap::resolve(&table.headers, &AliasTable::default());
    for field in [Field::Player1, Field::Player2, Field::Winner, Field::Date] {
        if !columns.has(field) {
            return Err(TennisError::Schema(format!(
                "raw matches missing required column `{}`",
                field.canonical_name()
            )));
        }
    }

    let min_year = config.preprocess.min_year;
    let records: Vec<_> = parse_records(&table, &columns)
        .into_iter()
        .filter(|r| r.year().is_some_and(|y| y >= min_year))
        .collect();
    let in_range = records.len();
    let catalog = Catalog::build(records, config);

    let mut headers: Vec<String> = PASSTHROUGH
        .iter()
        .map(|f| f.canonical_name().to_string())
        .collect();
    headers.push(Field::Label.canonical_name().to_string());
    headers.extend(Feature::ALL.iter().map(|f| f.name().to_string()));

    let mut rows = Vec::new();
    for history in catalog.history() {
        let record = &history.record;
        let Some(outcome) = record.outcome() else {
            continue;
        };
        let Some(values) = Feature::ALL
            .iter()
            .map(|f| history.value(*f))
            .collect::<Option<Vec<f64>>>()
        else {
            continue;
        };
        let Some(source) = table.rows.get(record.source_index) else {
            continue;
        };

        let mut row: Vec<String> = PASSTHROUGH
            .iter()
            .map(|field| match field {
                Field::Date => record
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                _ => columns.value(source, *field).unwrap_or("").to_string(),
            })
            .collect();
        row.push(if outcome == Outcome::Player1 { "1" } else { "0" }.to_string());
        row.extend(values.iter().map(|v| v.to_string()));
        rows.push(row);
    }

    log::info!(
        "Preprocessed {} raw rows: {} from {} onwards, {} complete",
        table.len(),
        in_range,
        min_year,
        rows.len()
    );
    Ok(ProcessedTable { headers, rows })
}

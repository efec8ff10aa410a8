//! Data ingestion
//!
//! Delimited text parsing, header aliasing, record casting, splitting and
//! the dataset pipeline built on top of them.

pub mod aliases;
pub mod csv_parser;
pub mod dataset;
pub mod preprocess;
pub mod records;
pub mod split;

pub use aliases::{AliasTable, ColumnMap, Field};
pub use csv_parser::{parse_csv, parse_table, CsvTable};
pub use dataset::{load_dataset, DatasetArtifacts, PreparedDataset};
pub use preprocess::{preprocess, ProcessedTable};
pub use split::{stratified_split, Split};

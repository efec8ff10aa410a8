//! Row casting
//!
//! Converts tokenized rows into `MatchRecord`s and orders them in time.

use chrono::NaiveDate;

use crate::data::aliases::{ColumnMap, Field};
use crate::data::csv_parser::CsvTable;
use crate::features::score::parse_score;
use crate::{MatchRecord, PlayerName, SideMetrics};

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];

/// Parse a date, ignoring any time-of-day suffix
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a finite number, accepting a decimal comma
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = raw.parse::<f64>().ok().or_else(|| {
        if raw.contains(',') && !raw.contains('.') {
            raw.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });
    parsed.filter(|v| v.is_finite())
}

/// Cast one row. Rows missing either player name are discarded.
pub fn parse_record(row: &[String], columns: &ColumnMap, source_index: usize) -> Option<MatchRecord> {
    let player1 = columns.value(row, Field::Player1)?;
    let player2 = columns.value(row, Field::Player2)?;
    let text = |field: Field| columns.value(row, field).map(|s| s.to_string());
    let number = |field: Field| columns.value(row, field).and_then(parse_number);

    Some(MatchRecord {
        source_index,
        player1: PlayerName(player1.to_string()),
        player2: PlayerName(player2.to_string()),
        winner: columns
            .value(row, Field::Winner)
            .map(|w| PlayerName(w.to_string())),
        date: columns.value(row, Field::Date).and_then(parse_date),
        surface: text(Field::Surface),
        round: text(Field::Round),
        court: text(Field::Court),
        tournament: text(Field::Tournament),
        best_of: number(Field::BestOf)
            .filter(|v| *v >= 1.0 && *v <= 9.0)
            .map(|v| v as u8),
        side1: SideMetrics {
            rank: number(Field::Rank1),
            points: number(Field::Points1),
            odds: number(Field::Odds1),
        },
        side2: SideMetrics {
            rank: number(Field::Rank2),
            points: number(Field::Points2),
            odds: number(Field::Odds2),
        },
        score: columns.value(row, Field::Score).and_then(parse_score),
        label: number(Field::Label),
    })
}

/// Cast every row of a table, keeping source order
pub fn parse_records(table: &CsvTable, columns: &ColumnMap) -> Vec<MatchRecord> {
    let records: Vec<MatchRecord> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| parse_record(row, columns, idx))
        .collect();
    let discarded = table.rows.len() - records.len();
    if discarded > 0 {
        log::debug!("Discarded {} rows without both player names", discarded);
    }
    records
}

/// Date ascending, undated last, ties by source order
pub fn sort_chronologically(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| {
        let key_a = (a.date.is_none(), a.date);
        let key_b = (b.date.is_none(), b.date);
        key_a
            .cmp(&key_b)
            .then(a.source_index.cmp(&b.source_index))
    });
}

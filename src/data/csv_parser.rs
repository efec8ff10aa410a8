//! Delimited text parsing
//!
//! Detects comma vs semicolon separated input and tokenizes it with the
//! `csv` crate, honouring double-quote escaping.

use csv::ReaderBuilder;

use crate::{Result, TennisError};

/// Parsed delimited text: a header row plus data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Semicolon only when it is strictly more frequent than comma on the first line
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Tokenize text into rows of fields. The first row holds the headers.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TennisError::MalformedInput(e.to_string()))?;
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        if fields.iter().all(|f| f.trim().is_empty()) && fields.len() <= 1 {
            continue;
        }
        rows.push(fields);
    }

    if rows.is_empty() {
        return Err(TennisError::MalformedInput(
            "input contains no rows".to_string(),
        ));
    }
    log::debug!(
        "Parsed {} rows with delimiter '{}'",
        rows.len(),
        delimiter as char
    );
    Ok(rows)
}

/// Parse text into a header row plus data rows
pub fn parse_table(text: &str) -> Result<CsvTable> {
    let mut rows = parse_csv(text)?;
    let headers = rows.remove(0);
    Ok(CsvTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        // Ties go to comma
        assert_eq!(detect_delimiter("a;b,c"), b',');
        assert_eq!(detect_delimiter("a;b;c,d"), b';');
    }

    #[test]
    fn test_detect_delimiter_reads_first_line_only() {
        assert_eq!(detect_delimiter("a,b\n1;2;3;4"), b',');
        assert_eq!(detect_delimiter("\na;b;c\n1;2;3"), b',');
    }

    #[test]
    fn test_quoted_fields() {
        let rows = parse_csv("name,note\n\"Smith, J.\",\"said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Smith, J.", "said \"hi\""]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let rows = parse_csv("a;b\n\n1;2\n   \n3;4\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let table = parse_table("a,b,c\n1,2\n4,5,6,7\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(matches!(parse_csv(""), Err(TennisError::MalformedInput(_))));
        assert!(matches!(
            parse_csv("\n  \n"),
            Err(TennisError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_byte_order_mark_stripped() {
        let table = parse_table("\u{feff}y,rank_diff\n1,2\n").unwrap();
        assert_eq!(table.headers[0], "y");
    }
}

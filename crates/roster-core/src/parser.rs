//! Delimited-text parser for exported sheet tables

use crate::error::{Error, Result};
use crate::table::{Row, Table};
use std::fs;
use std::path::Path;

/// Default cell delimiter of sheet exports
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Parse tab-separated text into a Table
pub fn parse_tsv(content: &str, source_name: &str) -> Table {
    parse_delimited(content, DEFAULT_DELIMITER, source_name)
}

/// Parse delimited text into a Table
///
/// Lines are rows and cells are split on `delimiter`. Every cell is trimmed
/// and loses one surrounding quote character on each side. Blank lines
/// become empty rows, and ragged rows are kept as they are.
pub fn parse_delimited(content: &str, delimiter: u8, source_name: &str) -> Table {
    let mut table = Table::new(source_name);
    let content = content.trim();
    if content.is_empty() {
        return table;
    }

    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            table.rows.push(Row::default());
            continue;
        }
        table
            .rows
            .push(Row::new(split_line(line, delimiter, line_idx, source_name)));
    }

    log::debug!(
        "parsed {} rows ({} columns max) from {}",
        table.row_count(),
        table.max_width(),
        source_name
    );

    table
}

/// Read and parse a delimited file
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_delimited(&content, delimiter, &path.display().to_string()))
}

fn split_line(line: &str, delimiter: u8, line_idx: usize, source_name: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // Allow varying number of fields
        .quoting(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .delimiter(delimiter)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(clean_cell).collect(),
        Ok(false) => Vec::new(),
        Err(e) => {
            log::warn!(
                "line {} in {} could not be split, keeping it as an empty row: {}",
                line_idx + 1,
                source_name,
                e
            );
            Vec::new()
        }
    }
}

/// Trim a cell and drop one surrounding quote on each side
fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tsv() {
        let tsv = "ID\tName\tValue\n1\tfoo\t100\n2\tbar\t200\n";
        let table = parse_tsv(tsv, "test.tsv");

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[0].cells, vec!["ID", "Name", "Value"]);
        assert_eq!(table.rows[2].get(1), "bar");
        assert_eq!(table.source_name, "test.tsv");
    }

    #[test]
    fn test_parse_trims_and_strips_quotes() {
        let tsv = "h\n  \"quoted\"  \t plain \t\"half\n";
        let table = parse_tsv(tsv, "test.tsv");

        assert_eq!(table.rows[1].cells, vec!["quoted", "plain", "half"]);
    }

    #[test]
    fn test_parse_keeps_inner_quotes() {
        let table = parse_tsv("h\n\"say \"hi\"\"", "test.tsv");
        assert_eq!(table.rows[1].get(0), "say \"hi\"");
    }

    #[test]
    fn test_parse_ragged_rows() {
        let tsv = "a\tb\tc\td\n1\n2\t3\n";
        let table = parse_tsv(tsv, "test.tsv");

        assert_eq!(table.rows[1].len(), 1);
        assert_eq!(table.rows[2].len(), 2);
        assert_eq!(table.rows[1].get(3), "");
    }

    #[test]
    fn test_parse_blank_line_is_empty_row() {
        let tsv = "h\na\tb\n   \nc\n";
        let table = parse_tsv(tsv, "test.tsv");

        assert_eq!(table.row_count(), 4);
        assert!(table.rows[2].is_empty());
        assert_eq!(table.rows[3].get(0), "c");
    }

    #[test]
    fn test_parse_crlf() {
        let tsv = "h1\th2\r\nx\ty\r\n";
        let table = parse_tsv(tsv, "test.tsv");

        assert_eq!(table.rows[1].cells, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_empty_cells() {
        let table = parse_tsv("h\na\t\t\tb", "test.tsv");
        assert_eq!(table.rows[1].cells, vec!["a", "", "", "b"]);
    }

    #[test]
    fn test_parse_empty_input() {
        let table = parse_tsv("  \n \n", "empty.tsv");
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let table = parse_delimited("a;b\n1;2", b';', "semi.csv");
        assert_eq!(table.rows[1].cells, vec!["1", "2"]);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("/definitely/not/here.tsv", DEFAULT_DELIMITER).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}

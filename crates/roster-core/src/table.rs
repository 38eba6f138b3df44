//! Raw table types produced by the delimited-text parser

use serde::{Deserialize, Serialize};

/// A parsed table from a single delimited-text payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Row data, header row included
    pub rows: Vec<Row>,
    /// Where the payload came from (path, URL or a test label)
    pub source_name: String,
}

impl Table {
    /// Create a new empty table
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            source_name: source_name.into(),
        }
    }

    /// Get the number of rows, header included
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The header row, if the table has any rows at all
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Rows after the one-line header
    pub fn body(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Widest row in the table
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Row::len).max().unwrap_or(0)
    }
}

/// A row of trimmed cells. Rows may be ragged; an empty line has no cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Get a cell by column index, `""` when the row is too short
    pub fn get(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Number of cells actually present
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

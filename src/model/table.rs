//! Table types.

use serde::{Deserialize, Serialize};

/// A table element: a rectangular grid of cell texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows of cell texts; every row has `column_count` cells
    pub rows: Vec<Vec<String>>,

    /// Number of columns
    pub column_count: usize,

    /// Number of rows
    pub row_count: usize,

    /// The first row is a header
    pub has_header: bool,

    /// Column X positions (view space), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_positions: Option<Vec<f32>>,

    /// 1-indexed page number
    pub page: u32,

    /// Confidence of the table decision
    pub confidence: f32,
}

impl Table {
    /// Create a new empty table.
    pub fn new(page: u32) -> Self {
        Self {
            rows: Vec::new(),
            column_count: 0,
            row_count: 0,
            has_header: false,
            column_positions: None,
            page,
            confidence: 0.0,
        }
    }

    /// Create a table from rows, padding short rows with empty cells.
    pub fn from_rows<S: Into<String>>(
        rows: impl IntoIterator<Item = impl IntoIterator<Item = S>>,
        page: u32,
    ) -> Self {
        let mut table = Self::new(page);
        for row in rows {
            table.add_row(row.into_iter().map(Into::into).collect());
        }
        table
    }

    /// Mark the first row as header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set column positions.
    pub fn with_column_positions(mut self, positions: Vec<f32>) -> Self {
        self.column_positions = Some(positions);
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Add a row, keeping the grid rectangular.
    pub fn add_row(&mut self, mut row: Vec<String>) {
        if row.len() > self.column_count {
            self.column_count = row.len();
            for existing in &mut self.rows {
                existing.resize(self.column_count, String::new());
            }
        } else {
            row.resize(self.column_count, String::new());
        }
        self.rows.push(row);
        self.row_count = self.rows.len();
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get header row, if any.
    pub fn header(&self) -> Option<&[String]> {
        if self.has_header {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Get body rows (non-header).
    pub fn body(&self) -> &[Vec<String>] {
        if self.has_header && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }

    /// Whether every row has `column_count` cells.
    pub fn is_rectangular(&self) -> bool {
        self.row_count == self.rows.len()
            && self.rows.iter().all(|r| r.len() == self.column_count)
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

//! Single-column table extraction.
//!
//! Cuts a block decided to be a table into a cell grid using only its own
//! lines: X clusters become columns, Y clusters become rows, and every line
//! goes to its nearest column.

use log::debug;

use super::detect_header;
use crate::config::{TABLE_MIN_COLUMNS, TABLE_MIN_ROWS};
use crate::layout::clustering::{cluster_values, nearest_cluster, Cluster};
use crate::model::{Block, Line, Table};

/// Distance within which two columns are equally near to a line.
const TIE_DISTANCE: f32 = 1.0;

/// Extracts cell grids from table blocks.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    column_tolerance: f32,
    row_tolerance: f32,
}

/// Horizontal extent of one detected column.
#[derive(Debug, Clone, Copy)]
struct ColumnSpan {
    center: f32,
    left: f32,
    right: f32,
}

impl TableExtractor {
    /// Create an extractor with column (X) and row (Y) clustering tolerances.
    pub fn new(column_tolerance: f32, row_tolerance: f32) -> Self {
        Self {
            column_tolerance,
            row_tolerance,
        }
    }

    /// Build a table from a block, or `None` when fewer than two columns or rows emerge.
    pub fn extract(&self, block: &Block) -> Option<Table> {
        let lines = &block.lines;
        if lines.is_empty() {
            return None;
        }

        let xs: Vec<f32> = lines.iter().map(|l| l.x).collect();
        let all_columns = cluster_values(&xs, self.column_tolerance);
        let strong: Vec<Cluster> = all_columns.iter().filter(|c| c.len() >= 2).cloned().collect();
        let columns = if strong.len() >= TABLE_MIN_COLUMNS {
            strong
        } else {
            all_columns
        };

        let ys: Vec<f32> = lines.iter().map(|l| l.y).collect();
        let rows = cluster_values(&ys, self.row_tolerance);
        if columns.len() < TABLE_MIN_COLUMNS || rows.len() < TABLE_MIN_ROWS {
            debug!(
                "Table block on page {} has {} columns and {} rows; not a grid",
                block.page_num,
                columns.len(),
                rows.len()
            );
            return None;
        }

        let spans = column_spans(&columns, lines);
        let mut grid: Vec<Vec<Vec<&Line>>> = vec![vec![Vec::new(); spans.len()]; rows.len()];
        for line in lines {
            let (Some(row), Some(column)) = (nearest_cluster(&rows, line.y), assign_column(&spans, line)) else {
                continue;
            };
            grid[row][column].push(line);
        }

        let first_row_lines: Vec<&Line> = grid[0].iter().flatten().copied().collect();
        let cells: Vec<Vec<String>> = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let mut cell = cell.clone();
                        cell.sort_by(|a, b| a.x.total_cmp(&b.x));
                        cell.iter().map(|l| l.text.trim()).collect::<Vec<_>>().join(" ")
                    })
                    .collect()
            })
            .collect();

        let has_header = detect_header(&cells, &first_row_lines);
        let confidence = block.decision_confidence().unwrap_or(0.0);
        Some(
            Table::from_rows(cells, block.page_num)
                .with_header(has_header)
                .with_column_positions(spans.iter().map(|s| s.left).collect())
                .with_confidence(confidence),
        )
    }
}

fn column_spans(columns: &[Cluster], lines: &[Line]) -> Vec<ColumnSpan> {
    columns
        .iter()
        .map(|c| {
            let right = lines
                .iter()
                .filter(|l| c.values.contains(&l.x))
                .map(|l| l.right)
                .fold(c.max(), f32::max);
            ColumnSpan {
                center: c.center,
                left: c.min(),
                right,
            }
        })
        .collect()
}

/// Nearest column by left edge; near-ties go to the column the line overlaps most.
fn assign_column(spans: &[ColumnSpan], line: &Line) -> Option<usize> {
    let mut order: Vec<(usize, f32)> = spans
        .iter()
        .enumerate()
        .map(|(i, s)| (i, (s.center - line.x).abs()))
        .collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1));

    let &(best, best_distance) = order.first()?;
    let Some(&(runner_up, runner_distance)) = order.get(1) else {
        return Some(best);
    };
    if runner_distance - best_distance > TIE_DISTANCE {
        return Some(best);
    }

    let overlap = |s: &ColumnSpan| {
        let width = line.width().max(f32::EPSILON);
        (line.right.min(s.right) - line.x.max(s.left)).max(0.0) / width
    };
    if overlap(&spans[runner_up]) > overlap(&spans[best]) {
        Some(runner_up)
    } else {
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_block(rows: &[&[(&str, f32)]]) -> Block {
        let mut lines = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (text, x) in row.iter() {
                lines.push(Line::new(*text, *x, 100.0 + r as f32 * 15.0, 12.0));
            }
        }
        Block::from_lines(lines).unwrap()
    }

    #[test]
    fn test_extract_grid() {
        let block = table_block(&[
            &[("Name", 72.0), ("Version", 172.0), ("License", 272.0)],
            &[("serde", 72.0), ("1.0", 172.0), ("MIT", 272.0)],
            &[("regex", 72.0), ("1.11", 172.0), ("MIT", 272.0)],
        ]);
        let table = TableExtractor::new(18.0, 4.8).extract(&block).unwrap();

        assert_eq!(table.row_count, 3);
        assert_eq!(table.column_count, 3);
        assert_eq!(table.rows[2], vec!["regex", "1.11", "MIT"]);
        assert!(table.has_header);
        assert_eq!(table.column_positions, Some(vec![72.0, 172.0, 272.0]));
    }

    #[test]
    fn test_missing_cell_padded() {
        let block = table_block(&[
            &[("a1", 72.0), ("b1", 172.0)],
            &[("a2", 72.0)],
            &[("a3", 72.0), ("b3", 172.0)],
        ]);
        let table = TableExtractor::new(18.0, 4.8).extract(&block).unwrap();
        assert!(table.is_rectangular());
        assert_eq!(table.rows[1], vec!["a2", ""]);
        // Row 0 is complete while the average row is not.
        assert!(table.has_header);
    }

    #[test]
    fn test_single_column_is_not_table() {
        let block = table_block(&[&[("one", 72.0)], &[("two", 72.0)], &[("three", 72.0)]]);
        assert!(TableExtractor::new(18.0, 4.8).extract(&block).is_none());
    }

    #[test]
    fn test_single_row_is_not_table() {
        let block = table_block(&[&[("one", 72.0), ("two", 172.0)]]);
        assert!(TableExtractor::new(18.0, 4.8).extract(&block).is_none());
    }

    #[test]
    fn test_tie_goes_to_overlap() {
        let spans = [
            ColumnSpan { center: 100.0, left: 100.0, right: 120.0 },
            ColumnSpan { center: 140.0, left: 140.0, right: 200.0 },
        ];
        let line = Line::new("spanning text", 120.0, 0.0, 12.0);
        assert_eq!(assign_column(&spans, &line), Some(1));

        let near = Line::new("x", 101.0, 0.0, 12.0);
        assert_eq!(assign_column(&spans, &near), Some(0));
    }
}

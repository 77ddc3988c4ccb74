//! Table reconstruction.
//!
//! Tables reach the page in two ways. A table whose columns the column
//! detector split apart is rebuilt across columns: the [`block_splitter`]
//! isolates column-0 lines that share rows with other columns, and the
//! [`column_merger`] joins rows by normalized Y. A table kept inside one
//! column is decided by the classifiers and cut into cells by the
//! [`extractor`].

pub mod block_splitter;
pub mod column_merger;
pub mod extractor;

pub use block_splitter::split_table_fragments;
pub use column_merger::{validate_table_structure, ColumnMerger, MergeOutcome, PlacedTable};
pub use extractor::TableExtractor;

use crate::config::{HEADER_BOLD_RATIO, HEADER_KEYWORDS};
use crate::layout::clustering::coefficient_of_variation;
use crate::model::{Block, Line};

/// Average characters per line above which a block reads like prose.
const PROSE_LINE_CHARS: f32 = 30.0;

/// Gap spread under which line spacing counts as regular leading.
const REGULAR_GAP_CV: f32 = 0.15;

/// Normalized Y key: lines whose keys match sit on the same row.
pub fn y_key(y: f32, tolerance: f32) -> i64 {
    if tolerance > 0.0 {
        (y / tolerance).round() as i64
    } else {
        y.round() as i64
    }
}

/// Long lines at regular leading: a paragraph, not table cells.
pub fn is_paragraph_like(block: &Block) -> bool {
    let count = block.line_count();
    if count == 0 {
        return false;
    }
    let avg_chars = block.lines.iter().map(Line::char_count).sum::<usize>() as f32 / count as f32;
    if avg_chars <= PROSE_LINE_CHARS {
        return false;
    }
    if count < 3 {
        return true;
    }
    let gaps: Vec<f32> = block.lines.windows(2).map(|w| w[1].y - w[0].y).collect();
    coefficient_of_variation(&gaps).is_some_and(|(_, cv)| cv <= REGULAR_GAP_CV)
}

/// Header detection shared by both table paths.
///
/// The first row is a header when most of its text is bold, when one of
/// its cells is a typical header word, or when it has fewer empty cells
/// than the rows on average.
pub fn detect_header(rows: &[Vec<String>], first_row_lines: &[&Line]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };
    if rows.len() < 2 {
        return false;
    }

    let total: usize = first_row_lines.iter().map(|l| l.char_count()).sum();
    let bold: usize = first_row_lines
        .iter()
        .filter(|l| l.bold)
        .map(|l| l.char_count())
        .sum();
    if total > 0 && bold as f32 / total as f32 >= HEADER_BOLD_RATIO {
        return true;
    }

    let keyword = first.iter().any(|cell| {
        let cell = cell.trim().to_lowercase();
        HEADER_KEYWORDS.iter().any(|k| cell == *k)
    });
    if keyword {
        return true;
    }

    let empty = |row: &Vec<String>| row.iter().filter(|c| c.trim().is_empty()).count();
    let average = rows.iter().map(empty).sum::<usize>() as f32 / rows.len() as f32;
    (empty(first) as f32) < average
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_key_rows() {
        assert_eq!(y_key(100.0, 1.2), y_key(100.04, 1.2));
        assert_ne!(y_key(100.0, 1.2), y_key(105.0, 1.2));
        assert_eq!(y_key(100.0, 1.2), 83);
        assert_eq!(y_key(105.0, 1.2), 88);
    }

    #[test]
    fn test_paragraph_like() {
        let prose = Block::from_lines(vec![
            Line::new("A paragraph line with plenty of words in it today", 72.0, 100.0, 12.0),
            Line::new("and another line with plenty of words in it again", 72.0, 114.0, 12.0),
            Line::new("and a third one that keeps the rhythm of the text", 72.0, 128.0, 12.0),
        ])
        .unwrap();
        assert!(is_paragraph_like(&prose));

        let cells = Block::from_lines(vec![
            Line::new("Alpha", 72.0, 100.0, 12.0),
            Line::new("Beta", 72.0, 114.0, 12.0),
            Line::new("Gamma", 72.0, 128.0, 12.0),
        ])
        .unwrap();
        assert!(!is_paragraph_like(&cells));
    }

    #[test]
    fn test_detect_header() {
        let rows = vec![
            vec!["Name".to_string(), "Size".to_string()],
            vec!["a.txt".to_string(), "4 KB".to_string()],
        ];
        assert!(detect_header(&rows, &[]));

        let plain = vec![
            vec!["x1".to_string(), "y1".to_string()],
            vec!["x2".to_string(), "y2".to_string()],
        ];
        assert!(!detect_header(&plain, &[]));

        let bold = Line::new("Left", 72.0, 100.0, 12.0).bold();
        assert!(detect_header(&plain, &[&bold]));

        let sparse = vec![
            vec!["h1".to_string(), "h2".to_string()],
            vec!["v".to_string(), String::new()],
        ];
        assert!(detect_header(&sparse, &[]));
    }
}

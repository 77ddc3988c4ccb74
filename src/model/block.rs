//! Blocks: contiguous runs of lines forming one candidate structural unit.

use serde::{Deserialize, Serialize};

use super::classification::{BlockClassification, ElementType, ListMarker};
use super::line::Line;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Vertical distance from a block to whatever follows it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapAfter {
    /// Baseline-to-baseline distance to the next block in the same column
    Distance(f32),
    /// Nothing follows on this page in this column
    PageBreak,
}

impl GapAfter {
    /// The distance, unless this is a page break.
    pub fn distance(&self) -> Option<f32> {
        match self {
            GapAfter::Distance(d) => Some(*d),
            GapAfter::PageBreak => None,
        }
    }
}

/// Where a block came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOrigin {
    /// Built by the grouper
    #[default]
    Regular,
    /// Column-0 lines suspected to be cells of a cross-column table
    TableFragment,
}

/// A candidate structural unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Lines in reading order
    pub lines: Vec<Line>,
    /// Combined text
    pub text: String,
    /// Top of the first line
    pub min_y: f32,
    /// Bottom of the last line
    pub max_y: f32,
    /// Leftmost X
    pub x: f32,
    /// Rightmost X
    pub right: f32,
    /// 1-indexed page number
    pub page_num: u32,
    /// Column index
    pub column: usize,
    /// Character-weighted font size
    pub font_size: f32,
    /// Predominantly bold
    pub bold: bool,
    /// Predominantly italic
    pub italic: bool,
    /// Predominantly underlined
    pub underline: bool,
    /// Distance to the next block
    pub gap_after: GapAfter,
    /// Ends with a colon and introduces a list
    pub is_list_heading: bool,
    /// The next block is a list
    pub followed_by_list: bool,
    /// Marker stripped from the text by the list splitter
    pub list_marker: Option<ListMarker>,
    /// Provenance
    pub origin: BlockOrigin,
    /// Classifier outputs and decision, once classified
    pub classification: Option<BlockClassification>,
}

impl Block {
    /// Build a block from lines.
    pub fn from_lines(lines: Vec<Line>) -> Result<Self> {
        let first = lines.first().ok_or(Error::EmptyBlock)?;
        let page_num = first.page_num;
        let column = first.column;

        let text = join_lines(&lines);
        let min_y = lines.iter().map(Line::top).fold(f32::MAX, f32::min);
        let max_y = lines.iter().map(Line::bottom).fold(f32::MIN, f32::max);
        let x = lines.iter().map(|l| l.x).fold(f32::MAX, f32::min);
        let right = lines.iter().map(|l| l.right).fold(f32::MIN, f32::max);

        let total_chars: usize = lines.iter().map(Line::char_count).sum();
        let font_size = if total_chars > 0 {
            lines
                .iter()
                .map(|l| l.font_size * l.char_count() as f32)
                .sum::<f32>()
                / total_chars as f32
        } else {
            first.font_size
        };
        let bold = char_share(&lines, total_chars, |l| l.bold) > 0.5;
        let italic = char_share(&lines, total_chars, |l| l.italic) > 0.5;
        let underline = char_share(&lines, total_chars, |l| l.underline) > 0.5;

        Ok(Self {
            lines,
            text,
            min_y,
            max_y,
            x,
            right,
            page_num,
            column,
            font_size,
            bold,
            italic,
            underline,
            gap_after: GapAfter::PageBreak,
            is_list_heading: false,
            followed_by_list: false,
            list_marker: None,
            origin: BlockOrigin::Regular,
            classification: None,
        })
    }

    /// Number of characters of combined text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Baseline of the first line.
    pub fn first_baseline(&self) -> f32 {
        self.lines.first().map(|l| l.y).unwrap_or(self.min_y)
    }

    /// Baseline of the last line.
    pub fn last_baseline(&self) -> f32 {
        self.lines.last().map(|l| l.y).unwrap_or(self.max_y)
    }

    /// Bounding box.
    pub fn bbox(&self) -> Rect {
        Rect::from_corners(self.x, self.min_y, self.right, self.max_y)
    }

    /// Decided element type, if classified.
    pub fn element_type(&self) -> Option<ElementType> {
        self.classification
            .as_ref()
            .map(|c| c.decision.element_type)
    }

    /// Confidence of the decision, if classified.
    pub fn decision_confidence(&self) -> Option<f32> {
        self.classification.as_ref().map(|c| c.decision.confidence)
    }
}

/// Fraction of characters in lines matching `pred`.
fn char_share(lines: &[Line], total_chars: usize, pred: impl Fn(&Line) -> bool) -> f32 {
    if total_chars == 0 {
        return 0.0;
    }
    lines
        .iter()
        .filter(|l| pred(l))
        .map(Line::char_count)
        .sum::<usize>() as f32
        / total_chars as f32
}

/// Join line texts with spaces, undoing end-of-line hyphenation.
fn join_lines(lines: &[Line]) -> String {
    let mut text = String::new();
    for line in lines {
        let piece = line.text.trim();
        if piece.is_empty() {
            continue;
        }
        if text.is_empty() {
            text.push_str(piece);
            continue;
        }
        let hyphenated = {
            let mut tail = text.chars().rev();
            tail.next() == Some('-') && tail.next().is_some_and(char::is_alphabetic)
        };
        if hyphenated && piece.chars().next().is_some_and(char::is_lowercase) {
            text.pop();
        } else {
            text.push(' ');
        }
        text.push_str(piece);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines() {
        let lines = vec![
            Line::new("First line of text", 72.0, 100.0, 12.0),
            Line::new("second line", 72.0, 114.4, 12.0),
        ];
        let block = Block::from_lines(lines).unwrap();
        assert_eq!(block.text, "First line of text second line");
        assert_eq!(block.line_count(), 2);
        assert!((block.min_y - 90.4).abs() < 1e-3);
        assert!((block.max_y - 116.8).abs() < 1e-3);
        assert_eq!(block.font_size, 12.0);
        assert_eq!(block.gap_after, GapAfter::PageBreak);
        assert!(block.element_type().is_none());
    }

    #[test]
    fn test_empty_block_is_error() {
        assert!(matches!(Block::from_lines(vec![]), Err(Error::EmptyBlock)));
    }

    #[test]
    fn test_dehyphenation() {
        let lines = vec![
            Line::new("a continu-", 0.0, 0.0, 12.0),
            Line::new("ation of text", 0.0, 14.0, 12.0),
            Line::new("Well-", 0.0, 28.0, 12.0),
            Line::new("Known", 0.0, 42.0, 12.0),
        ];
        let block = Block::from_lines(lines).unwrap();
        assert_eq!(block.text, "a continuation of text Well- Known");
    }

    #[test]
    fn test_bold_share() {
        let lines = vec![
            Line::new("Bold heading text", 0.0, 0.0, 12.0).bold(),
            Line::new("plain", 0.0, 14.0, 12.0),
        ];
        assert!(Block::from_lines(lines).unwrap().bold);
    }
}

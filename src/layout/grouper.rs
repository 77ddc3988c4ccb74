//! Element grouping.
//!
//! Each column's lines are cut into blocks, preferably along the visual
//! text blocks found by gap analysis. When a column has too few gaps for
//! statistics, a line-by-line continuation heuristic decides instead.

use std::collections::BTreeMap;
use std::ops::Range;

use log::{debug, warn};

use super::gaps::{is_outlier_gap, visual_blocks, GapAnalysis, GapStats};
use crate::classify::{classify_block, classify_list, ends_sentence, parse_marker, ClassifierContext, Neighborhood};
use crate::config::{
    FONT_SIZE_BREAK_DELTA, LIST_MIN_CONFIDENCE, SHORT_LINE_RATIO, Y_KEY_TOLERANCE_MULTIPLIER,
};
use crate::model::{Block, GapAfter, Line};

/// Groups column-assigned lines into blocks and classifies them.
#[derive(Debug, Clone)]
pub struct ElementGrouper {
    base_font_size: f32,
}

impl ElementGrouper {
    /// Create a grouper for a base font size.
    pub fn new(base_font_size: f32) -> Self {
        Self { base_font_size }
    }

    /// Cut lines into blocks, ordered by column then by position.
    ///
    /// Every input line ends up in exactly one block.
    pub fn group(&self, lines: Vec<Line>, gaps: &GapAnalysis) -> Vec<Block> {
        let mut by_column: BTreeMap<usize, Vec<Line>> = BTreeMap::new();
        for line in lines {
            by_column.entry(line.column).or_default().push(line);
        }

        let mut blocks = Vec::new();
        for (column, mut column_lines) in by_column {
            column_lines.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
            let stats = gaps.for_column(column);
            let ranges = match visual_blocks(&column_lines, stats, self.base_font_size) {
                Some(ranges) => ranges,
                None => {
                    debug!("Column {}: too few gaps, using continuation heuristic", column);
                    self.continuation_ranges(&column_lines, stats)
                }
            };

            let mut rest = column_lines.into_iter();
            for range in ranges {
                let chunk: Vec<Line> = rest.by_ref().take(range.len()).collect();
                match Block::from_lines(chunk) {
                    Ok(block) => blocks.push(block),
                    Err(e) => warn!("Skipping block in column {}: {}", column, e),
                }
            }
        }

        link_gaps(&mut blocks);
        debug!("Grouped {} blocks", blocks.len());
        blocks
    }

    /// Classify every block that has no classification yet.
    ///
    /// `document_start` marks the page whose first block opens the document.
    pub fn classify(
        &self,
        blocks: &mut [Block],
        ctx: &ClassifierContext<'_>,
        gaps: &GapAnalysis,
        document_start: bool,
    ) {
        mark_list_context(blocks);

        let results: Vec<_> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                if block.classification.is_some() {
                    return None;
                }
                let neighborhood = Neighborhood {
                    is_first_block: document_start && i == 0,
                    gap_after: block.gap_after,
                    next: next_in_column(blocks, i).map(|j| &blocks[j]),
                    normal_gap: gaps.for_column(block.column).normal_gap,
                };
                Some(classify_block(block, ctx, &neighborhood))
            })
            .collect();

        for (block, result) in blocks.iter_mut().zip(results) {
            if result.is_some() {
                block.classification = result;
            }
        }
    }

    fn continuation_ranges(&self, lines: &[Line], stats: &GapStats) -> Vec<Range<usize>> {
        if lines.is_empty() {
            return Vec::new();
        }

        let gaps: Vec<f32> = lines.windows(2).map(|w| w[1].y - w[0].y).collect();
        let widest = lines.iter().map(Line::width).fold(0.0, f32::max);

        let mut ranges = Vec::new();
        let mut start = 0;
        for i in 0..gaps.len() {
            if !self.continues(&lines[i], &lines[i + 1], &gaps, i, stats, widest) {
                ranges.push(start..i + 1);
                start = i + 1;
            }
        }
        ranges.push(start..lines.len());
        ranges
    }

    /// Whether `next` continues the block that `prev` ends.
    fn continues(&self, prev: &Line, next: &Line, gaps: &[f32], index: usize, stats: &GapStats, widest: f32) -> bool {
        let same_row = self.base_font_size * Y_KEY_TOLERANCE_MULTIPLIER;
        let gap = gaps[index];
        if gap <= same_row {
            return true;
        }
        if (prev.font_size - next.font_size).abs() > FONT_SIZE_BREAK_DELTA {
            return false;
        }
        if gap >= stats.paragraph_gap_min || is_outlier_gap(gaps, index, same_row) {
            return false;
        }
        if prev.bold != next.bold || parse_marker(&next.text).is_some() {
            return false;
        }

        let prev_text = prev.text.trim_end();
        if prev_text.ends_with('-') {
            return true;
        }

        let starts_upper = next
            .text
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        if ends_sentence(prev_text) && starts_upper {
            let short = prev.width() < widest * SHORT_LINE_RATIO;
            let indented = next.x - prev.x > self.base_font_size;
            if short || indented {
                return false;
            }
        }
        true
    }
}

/// Index of the next block in the same column and page.
pub fn next_in_column(blocks: &[Block], index: usize) -> Option<usize> {
    let block = blocks.get(index)?;
    blocks
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, b)| b.column == block.column && b.page_num == block.page_num)
        .map(|(j, _)| j)
}

/// Recompute `gap_after` from each block to the next one in its column.
pub fn link_gaps(blocks: &mut [Block]) {
    for i in 0..blocks.len() {
        blocks[i].gap_after = match next_in_column(blocks, i) {
            Some(j) => GapAfter::Distance((blocks[j].first_baseline() - blocks[i].last_baseline()).max(0.0)),
            None => GapAfter::PageBreak,
        };
    }
}

/// Flag blocks that sit right before a list, and colon-terminated ones as list headings.
pub fn mark_list_context(blocks: &mut [Block]) {
    for i in 0..blocks.len() {
        let followed = next_in_column(blocks, i).is_some_and(|j| {
            let next = &blocks[j];
            next.list_marker.is_some()
                || classify_list(next).is_ok_and(|r| r.confidence >= LIST_MIN_CONFIDENCE)
        });
        let block = &mut blocks[i];
        if block.list_marker.is_some() {
            continue;
        }
        block.followed_by_list |= followed;
        if followed && block.text.trim_end().ends_with(':') {
            block.is_list_heading = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::model::ElementType;

    fn lines_at(column: usize, x: f32, ys: &[f32]) -> Vec<Line> {
        ys.iter()
            .map(|&y| Line::new("ordinary words in a running line of text", x, y, 12.0).in_column(column))
            .collect()
    }

    #[test]
    fn test_visual_blocks_split_on_paragraph_gap() {
        let lines = lines_at(0, 72.0, &[100.0, 114.0, 128.0, 160.0, 174.0, 188.0]);
        let gaps = GapAnalysis::analyze(&lines, 12.0);
        let blocks = ElementGrouper::new(12.0).group(lines, &gaps);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line_count(), 3);
        assert_eq!(blocks[1].line_count(), 3);
        assert_eq!(blocks[0].gap_after, GapAfter::Distance(32.0));
        assert_eq!(blocks[1].gap_after, GapAfter::PageBreak);
    }

    #[test]
    fn test_columns_are_grouped_separately() {
        let mut lines = lines_at(1, 320.0, &[100.0, 114.0]);
        lines.extend(lines_at(0, 72.0, &[100.0, 114.0]));
        let gaps = GapAnalysis::analyze(&lines, 12.0);
        let blocks = ElementGrouper::new(12.0).group(lines, &gaps);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].column, 0);
        assert_eq!(blocks[1].column, 1);
        let total: usize = blocks.iter().map(Block::line_count).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_continuation_breaks_after_bold_title() {
        let lines = vec![
            Line::new("Summary", 72.0, 100.0, 12.0).bold(),
            Line::new("The results were positive across the board", 72.0, 114.0, 12.0),
            Line::new("and the team plans to continue.", 72.0, 128.0, 12.0),
        ];
        let gaps = GapAnalysis::analyze(&lines, 12.0);
        let blocks = ElementGrouper::new(12.0).group(lines, &gaps);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Summary");
        assert_eq!(blocks[1].line_count(), 2);
    }

    #[test]
    fn test_continuation_breaks_before_marker() {
        let lines = vec![
            Line::new("Install these first", 72.0, 100.0, 12.0),
            Line::new("• A compiler", 72.0, 114.0, 12.0),
        ];
        let gaps = GapAnalysis::analyze(&lines, 12.0);
        let blocks = ElementGrouper::new(12.0).group(lines, &gaps);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_classify_list_heading() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let mut blocks = vec![
            Block::from_lines(vec![Line::new("Requirements:", 72.0, 100.0, 12.0)]).unwrap(),
            Block::from_lines(vec![Line::new("• Python 3.10 or later", 72.0, 130.0, 12.0)]).unwrap(),
        ];
        link_gaps(&mut blocks);
        let gaps = GapAnalysis::analyze(&[], 12.0);
        ElementGrouper::new(12.0).classify(&mut blocks, &ctx, &gaps, true);

        assert!(blocks[0].followed_by_list);
        assert!(blocks[0].is_list_heading);
        assert_eq!(blocks[0].element_type(), Some(ElementType::Heading));
        assert_eq!(blocks[1].element_type(), Some(ElementType::List));
    }

    #[test]
    fn test_classify_keeps_existing_decisions() {
        let metrics = Metrics::new(12.0);
        let ctx = ClassifierContext::new(&metrics);
        let mut block = Block::from_lines(vec![Line::new("Plain text", 72.0, 100.0, 12.0)]).unwrap();
        block.classification = Some(crate::classify::fallback_classification("preset"));
        let mut blocks = vec![block];
        let gaps = GapAnalysis::analyze(&[], 12.0);
        ElementGrouper::new(12.0).classify(&mut blocks, &ctx, &gaps, false);

        let decision = &blocks[0].classification.as_ref().unwrap().decision;
        assert!(decision.reason.contains("preset"));
    }
}

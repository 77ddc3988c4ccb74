//! Vertical gap analysis.
//!
//! Baseline-to-baseline gaps between consecutive lines of a column are
//! collected and summarized into a typical leading (`normal_gap_max`) and a
//! typical paragraph separation (`paragraph_gap_min`). Those thresholds drive
//! the "visual text block" segmentation used by the grouper.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::clustering::median_sorted;
use crate::config::{
    DEFAULT_LEADING_MULTIPLIER, FONT_SIZE_BREAK_DELTA, GAP_SAFETY_FACTOR, NORMAL_GAP_SPREAD,
    OUTLIER_GAP_RATIO, PARAGRAPH_GAP_FACTOR, Y_KEY_TOLERANCE_MULTIPLIER,
};
use crate::model::Line;

/// Minimum number of gaps for the statistics to drive segmentation.
const MIN_RELIABLE_GAPS: usize = 3;

/// Summary of one gap distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStats {
    /// Observed gaps, ascending
    pub gaps: Vec<f32>,
    /// Median gap
    pub normal_gap: f32,
    /// Largest gap still counted as ordinary leading
    pub normal_gap_max: f32,
    /// Smallest gap counted as a paragraph separation
    pub paragraph_gap_min: f32,
}

impl GapStats {
    /// Summarize a set of gaps. Falls back to leading derived from the base font size.
    pub fn from_gaps(mut gaps: Vec<f32>, base_font_size: f32) -> Self {
        gaps.retain(|g| g.is_finite() && *g > 0.0);
        gaps.sort_by(f32::total_cmp);

        if gaps.is_empty() {
            let normal_gap = base_font_size * DEFAULT_LEADING_MULTIPLIER;
            let normal_gap_max = normal_gap * (1.0 + NORMAL_GAP_SPREAD);
            return Self {
                gaps,
                normal_gap,
                normal_gap_max,
                paragraph_gap_min: normal_gap_max * PARAGRAPH_GAP_FACTOR,
            };
        }

        let normal_gap = median_sorted(&gaps);
        let normal_limit = normal_gap * (1.0 + NORMAL_GAP_SPREAD);
        let normal_gap_max = gaps
            .iter()
            .copied()
            .filter(|g| *g <= normal_limit)
            .fold(normal_gap, f32::max);
        let paragraph_limit = normal_gap_max * PARAGRAPH_GAP_FACTOR;
        let paragraph_gap_min = gaps
            .iter()
            .copied()
            .find(|g| *g >= paragraph_limit)
            .unwrap_or(paragraph_limit);

        Self {
            gaps,
            normal_gap,
            normal_gap_max,
            paragraph_gap_min,
        }
    }

    /// Enough samples to segment on.
    pub fn is_reliable(&self) -> bool {
        self.gaps.len() >= MIN_RELIABLE_GAPS
    }

    /// Upper bound for a gap that keeps two lines in one visual block.
    pub fn join_limit(&self) -> f32 {
        self.normal_gap_max * GAP_SAFETY_FACTOR
    }
}

/// Page-level gap analysis, global and per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    /// All columns pooled
    pub global: GapStats,
    /// Per column index
    pub per_column: BTreeMap<usize, GapStats>,
}

impl GapAnalysis {
    /// Analyze column-assigned lines.
    pub fn analyze(lines: &[Line], base_font_size: f32) -> Self {
        let mut by_column: BTreeMap<usize, Vec<&Line>> = BTreeMap::new();
        for line in lines {
            by_column.entry(line.column).or_default().push(line);
        }

        let same_row = base_font_size * Y_KEY_TOLERANCE_MULTIPLIER;
        let mut all_gaps = Vec::new();
        let mut per_column = BTreeMap::new();

        for (column, mut column_lines) in by_column {
            column_lines.sort_by(|a, b| a.y.total_cmp(&b.y));
            let gaps: Vec<f32> = column_lines
                .windows(2)
                .map(|w| w[1].y - w[0].y)
                .filter(|g| *g > same_row)
                .collect();
            all_gaps.extend_from_slice(&gaps);
            per_column.insert(column, GapStats::from_gaps(gaps, base_font_size));
        }

        let global = GapStats::from_gaps(all_gaps, base_font_size);
        log::debug!(
            "Gap analysis: normal={:.1}, normal_max={:.1}, paragraph_min={:.1}, columns={}",
            global.normal_gap,
            global.normal_gap_max,
            global.paragraph_gap_min,
            per_column.len()
        );

        Self { global, per_column }
    }

    /// Statistics for a column, falling back to the global ones when the column is too sparse.
    pub fn for_column(&self, column: usize) -> &GapStats {
        match self.per_column.get(&column) {
            Some(stats) if stats.is_reliable() => stats,
            _ => &self.global,
        }
    }
}

/// Segment one column's lines (sorted by baseline) into visual text blocks.
///
/// Returns `None` when the statistics are too sparse to trust.
pub fn visual_blocks(lines: &[Line], stats: &GapStats, base_font_size: f32) -> Option<Vec<Range<usize>>> {
    if !stats.is_reliable() {
        return None;
    }
    if lines.is_empty() {
        return Some(Vec::new());
    }

    let same_row = base_font_size * Y_KEY_TOLERANCE_MULTIPLIER;
    let gaps: Vec<f32> = lines.windows(2).map(|w| w[1].y - w[0].y).collect();

    let mut blocks = Vec::new();
    let mut start = 0;
    for (i, &gap) in gaps.iter().enumerate() {
        let prev = &lines[i];
        let next = &lines[i + 1];

        let split = if gap <= same_row {
            false
        } else if (prev.font_size - next.font_size).abs() > FONT_SIZE_BREAK_DELTA {
            true
        } else if gap >= stats.paragraph_gap_min {
            true
        } else if gap >= stats.join_limit() {
            // Between leading and paragraph spacing: only a local outlier splits.
            is_outlier_gap(&gaps, i, same_row)
        } else {
            false
        };

        if split {
            blocks.push(start..i + 1);
            start = i + 1;
        }
    }
    blocks.push(start..lines.len());

    Some(blocks)
}

/// A gap much larger than both of its neighbors.
pub fn is_outlier_gap(gaps: &[f32], index: usize, same_row: f32) -> bool {
    let Some(&gap) = gaps.get(index) else {
        return false;
    };
    let neighbor = |i: Option<usize>| i.and_then(|i| gaps.get(i)).copied().filter(|g| *g > same_row);
    let prev = neighbor(index.checked_sub(1));
    let next = neighbor(Some(index + 1));
    match (prev, next) {
        (Some(p), Some(n)) => gap > p * OUTLIER_GAP_RATIO && gap > n * OUTLIER_GAP_RATIO,
        (Some(only), None) | (None, Some(only)) => gap > only * OUTLIER_GAP_RATIO,
        (None, None) => false,
    }
}

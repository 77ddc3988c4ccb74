//! Column detection.
//!
//! Line-start X positions are clustered; two neighboring clusters become
//! separate columns only when a visually empty vertical strip (a gutter)
//! runs between them. Indented paragraphs and list items therefore stay in
//! their column, while real multi-column text and table columns split.

use log::debug;

use super::clustering::cluster_values;
use crate::config::{
    COLUMN_MIN_LINES, GUTTER_EDGE_SLACK, GUTTER_MAX_OCCUPANCY_RATIO, MIN_GUTTER_WIDTH,
};
use crate::model::Line;

/// Find empty vertical strips between horizontal extents.
///
/// Sweeps the sorted extent endpoints, tracking how many extents cover each
/// stretch between them. A run of stretches covered by at most
/// `max_occupancy_ratio` of the extents, at least `min_width` wide and with
/// content on both sides, is returned as a `(left, right)` gutter.
pub fn find_gutters(extents: &[(f32, f32)], min_width: f32, max_occupancy_ratio: f32) -> Vec<(f32, f32)> {
    let mut events: Vec<(f32, i32)> = Vec::with_capacity(extents.len() * 2);
    for &(left, right) in extents {
        if left.is_finite() && right.is_finite() && right >= left {
            events.push((left, 1));
            events.push((right, -1));
        }
    }
    if events.len() < 4 {
        return Vec::new();
    }
    // Openings first, so touching extents leave no gap between them.
    events.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let allowed = ((events.len() / 2) as f32 * max_occupancy_ratio) as i32;
    let min_x = events[0].0;
    let mut gutters = Vec::new();
    let mut covered = 0;
    let mut run_start: Option<f32> = None;

    for window in events.windows(2) {
        let (x, delta) = window[0];
        let next_x = window[1].0;
        covered += delta;
        if next_x <= x {
            continue;
        }
        if covered <= allowed {
            run_start.get_or_insert(x);
            continue;
        }
        if let Some(start) = run_start.take() {
            // Leading margin has no content on its left.
            if start > min_x && x - start >= min_width {
                gutters.push((start, x));
            }
        }
    }

    gutters
}

/// Column boundaries of a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    /// X positions separating consecutive columns, ascending
    pub boundaries: Vec<f32>,
}

impl ColumnLayout {
    /// A single column covering the page.
    pub fn single() -> Self {
        Self::default()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Column index for a line starting at `x`.
    pub fn column_for(&self, x: f32) -> usize {
        self.boundaries.iter().take_while(|b| x >= **b).count()
    }
}

/// Assigns lines to columns.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    tolerance: f32,
}

impl ColumnDetector {
    /// Create a detector clustering line starts with `tolerance`.
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Detect column boundaries.
    pub fn detect(&self, lines: &[Line]) -> ColumnLayout {
        let starts: Vec<f32> = lines.iter().map(|l| l.x).collect();
        let strong: Vec<_> = cluster_values(&starts, self.tolerance)
            .into_iter()
            .filter(|c| c.len() >= COLUMN_MIN_LINES)
            .collect();
        if strong.len() < 2 {
            return ColumnLayout::single();
        }

        let extents: Vec<(f32, f32)> = lines.iter().map(|l| (l.x, l.right)).collect();
        let gutters = find_gutters(&extents, MIN_GUTTER_WIDTH, GUTTER_MAX_OCCUPANCY_RATIO);
        debug!(
            "Column candidates: starts={:?}, gutters={:?}",
            strong.iter().map(|c| c.center).collect::<Vec<_>>(),
            gutters
        );

        let mut boundaries = Vec::new();
        for pair in strong.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            let gutter = gutters
                .iter()
                .find(|(g0, g1)| *g0 >= left.max() && *g1 <= right.min() + GUTTER_EDGE_SLACK);
            if let Some(&(g0, g1)) = gutter {
                let boundary = ((g0 + g1) / 2.0).min(right.min());
                if boundaries.last().map_or(true, |b| boundary > *b) {
                    boundaries.push(boundary);
                }
            }
        }

        debug!("Detected {} columns, boundaries={:?}", boundaries.len() + 1, boundaries);
        ColumnLayout { boundaries }
    }

    /// Detect columns and store each line's column index.
    pub fn assign(&self, lines: &mut [Line]) -> ColumnLayout {
        let layout = self.detect(lines);
        for line in lines.iter_mut() {
            line.column = layout.column_for(line.x);
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(x: f32, width: f32, rows: usize) -> Vec<Line> {
        (0..rows)
            .map(|i| {
                let mut line = Line::new("column text", x, 100.0 + i as f32 * 14.0, 10.0);
                line.right = x + width;
                line
            })
            .collect()
    }

    #[test]
    fn test_find_gutters() {
        let extents = [(72.0, 290.0), (72.0, 288.0), (320.0, 540.0), (320.0, 530.0)];
        let gutters = find_gutters(&extents, 12.0, 0.05);
        assert_eq!(gutters.len(), 1);
        let (left, right) = gutters[0];
        assert!(left >= 288.0 && right <= 321.0);
    }

    #[test]
    fn test_find_gutters_crossing_title() {
        let mut extents: Vec<(f32, f32)> = (0..20)
            .flat_map(|_| [(72.0, 290.0), (320.0, 540.0)])
            .collect();
        extents.push((72.0, 540.0));
        // One spanning title out of 41 extents stays under the 5% allowance.
        assert_eq!(find_gutters(&extents, 12.0, 0.05).len(), 1);
        assert!(find_gutters(&extents, 12.0, 0.0).is_empty());
    }

    #[test]
    fn test_find_gutters_far_extent() {
        let mut extents: Vec<(f32, f32)> = (0..10)
            .flat_map(|_| [(72.0, 290.0), (320.0, 540.0)])
            .collect();
        extents.push((1.0e10, 1.0e10 + 36.0));
        // The stray extent neither allocates per point nor hides the real gutter.
        assert_eq!(find_gutters(&extents, 12.0, 0.05), vec![(290.0, 320.0)]);
    }

    #[test]
    fn test_two_columns() {
        let mut lines = text_column(72.0, 220.0, 10);
        lines.extend(text_column(320.0, 220.0, 10));
        let layout = ColumnDetector::new(15.0).assign(&mut lines);
        assert_eq!(layout.column_count(), 2);
        assert_eq!(lines[0].column, 0);
        assert_eq!(lines[15].column, 1);
    }

    #[test]
    fn test_indentation_is_not_a_column() {
        let mut lines = text_column(72.0, 460.0, 6);
        lines.extend(text_column(100.0, 430.0, 4));
        let layout = ColumnDetector::new(15.0).assign(&mut lines);
        assert_eq!(layout, ColumnLayout::single());
        assert!(lines.iter().all(|l| l.column == 0));
    }

    #[test]
    fn test_weak_cluster_ignored() {
        let mut lines = text_column(72.0, 200.0, 10);
        lines.extend(text_column(400.0, 100.0, 2));
        assert_eq!(ColumnDetector::new(15.0).detect(&lines).column_count(), 1);
    }

    #[test]
    fn test_column_for() {
        let layout = ColumnLayout {
            boundaries: vec![300.0, 450.0],
        };
        assert_eq!(layout.column_for(72.0), 0);
        assert_eq!(layout.column_for(300.0), 1);
        assert_eq!(layout.column_for(500.0), 2);
    }
}

//! Line building.
//!
//! Runs are grouped into Y-bands (tolerance relative to font size), then
//! each band is cut wherever a wide horizontal gap or a page gutter separates
//! two runs, so physically separate columns never share a line.

use log::{debug, warn};

use super::columns::find_gutters;
use crate::config::{
    GUTTER_MAX_OCCUPANCY_RATIO, LINE_SPLIT_GAP_MULTIPLIER, LINE_Y_TOLERANCE_RATIO,
    MIN_GUTTER_WIDTH, UNDERLINE_MAX_LENGTH_RATIO, UNDERLINE_MAX_OFFSET_RATIO,
    UNDERLINE_MIN_COVERAGE,
};
use crate::model::{GraphicsData, Line, PageInput, TextRun};

/// Builds visual lines from text runs.
#[derive(Debug, Clone)]
pub struct LineBuilder {
    split_gap: f32,
}

impl LineBuilder {
    /// Create a builder; the split gap scales with the base font size.
    pub fn new(base_font_size: f32) -> Self {
        Self {
            split_gap: base_font_size * LINE_SPLIT_GAP_MULTIPLIER,
        }
    }

    /// Convert a page's text items into view-space runs, skipping invalid ones.
    pub fn runs_from_page(page: &PageInput) -> Vec<TextRun> {
        let mut runs = Vec::with_capacity(page.text_items.len());
        for item in &page.text_items {
            match TextRun::from_item(item, &page.viewport) {
                Ok(run) => runs.push(run.on_page(page.page_num)),
                Err(e) => warn!("Skipping text item: {}", e),
            }
        }
        runs
    }

    /// Group runs into lines, ordered top to bottom, then left to right.
    pub fn build(&self, mut runs: Vec<TextRun>) -> Vec<Line> {
        if runs.is_empty() {
            return Vec::new();
        }

        let extents: Vec<(f32, f32)> = runs.iter().map(|r| (r.x, r.right())).collect();
        let gutters = find_gutters(&extents, MIN_GUTTER_WIDTH, GUTTER_MAX_OCCUPANCY_RATIO);

        runs.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        let mut lines = Vec::new();
        let mut band: Vec<TextRun> = Vec::new();
        let mut band_y = runs[0].y;

        for run in runs {
            let tolerance = run.font_size * LINE_Y_TOLERANCE_RATIO;
            if !band.is_empty() && (run.y - band_y).abs() > tolerance {
                lines.extend(self.split_band(std::mem::take(&mut band), &gutters));
            }
            if band.is_empty() {
                band_y = run.y;
            }
            band.push(run);
        }
        if !band.is_empty() {
            lines.extend(self.split_band(band, &gutters));
        }

        lines.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        debug!("Built {} lines ({} gutters)", lines.len(), gutters.len());
        lines
    }

    fn split_band(&self, mut band: Vec<TextRun>, gutters: &[(f32, f32)]) -> Vec<Line> {
        band.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut lines = Vec::new();
        let mut current: Vec<TextRun> = Vec::new();
        let mut right = f32::MIN;

        for run in band {
            if !current.is_empty() {
                let gap = run.x - right;
                let crosses_gutter = gutters.iter().any(|&(g0, g1)| {
                    let center = (g0 + g1) / 2.0;
                    center > right && center < run.x
                });
                if gap > self.split_gap || crosses_gutter {
                    lines.push(Line::from_runs(std::mem::take(&mut current)));
                    right = f32::MIN;
                }
            }
            right = right.max(run.right());
            current.push(run);
        }
        if !current.is_empty() {
            lines.push(Line::from_runs(current));
        }

        lines
    }

    /// Mark lines that have a short rule just below their baseline.
    pub fn apply_underlines(lines: &mut [Line], graphics: &GraphicsData) {
        if graphics.is_empty() {
            return;
        }
        for line in lines.iter_mut() {
            let underline = graphics
                .underline_for(
                    line.x,
                    line.right,
                    line.y,
                    line.font_size * UNDERLINE_MAX_OFFSET_RATIO,
                    UNDERLINE_MIN_COVERAGE,
                )
                .filter(|rule| rule.length() <= line.width() * UNDERLINE_MAX_LENGTH_RATIO);
            if underline.is_some() {
                line.set_underline();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphicsLine, TextItem, Viewport};

    fn run(text: &str, x: f32, y: f32, width: f32) -> TextRun {
        TextRun::new(text, x, y, width, 10.0)
    }

    #[test]
    fn test_groups_by_baseline() {
        let lines = LineBuilder::new(10.0).build(vec![
            run("world", 110.0, 100.5, 30.0),
            run("Hello", 72.0, 100.0, 30.0),
            run("Next line", 72.0, 114.0, 60.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].runs.len(), 2);
        assert_eq!(lines[0].text, "Hello world");
        assert_eq!(lines[1].text, "Next line");
    }

    #[test]
    fn test_splits_wide_gap() {
        let lines = LineBuilder::new(10.0).build(vec![
            run("Name", 72.0, 100.0, 30.0),
            run("Value", 172.0, 100.0, 30.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Name");
        assert_eq!(lines[1].x, 172.0);
    }

    #[test]
    fn test_splits_on_gutter() {
        // 18pt between the columns is below the split gap but is a gutter on every row.
        let mut runs = Vec::new();
        for i in 0..8 {
            let y = 100.0 + i as f32 * 12.0;
            runs.push(run("left column text", 72.0, y, 200.0));
            runs.push(run("right column text", 290.0, y, 200.0));
        }
        let lines = LineBuilder::new(10.0).build(runs);
        assert_eq!(lines.len(), 16);
    }

    #[test]
    fn test_runs_from_page_skips_invalid() {
        let mut page = PageInput::new(3, Viewport::for_page(612.0, 792.0));
        page.push_text(TextItem::new("Hello", 72.0, 700.0, 30.0, 12.0));
        page.push_text(TextItem::new("   ", 72.0, 680.0, 10.0, 12.0));
        page.push_text(TextItem::new("Bad", f32::NAN, 660.0, 10.0, 12.0));

        let runs = LineBuilder::runs_from_page(&page);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].y, 92.0);
        assert_eq!(runs[0].page_num, 3);
    }

    #[test]
    fn test_underline_inference() {
        let mut lines = vec![
            Line::new("Underlined", 72.0, 100.0, 10.0),
            Line::new("Plain", 72.0, 130.0, 10.0),
        ];
        let width = lines[0].width();
        let graphics = GraphicsData {
            lines: vec![
                GraphicsLine::horizontal(72.0, 72.0 + width, 102.0, 0.5),
                GraphicsLine::horizontal(20.0, 590.0, 132.0, 0.5),
            ],
            rectangles: vec![],
        };
        LineBuilder::apply_underlines(&mut lines, &graphics);
        assert!(lines[0].underline);
        assert!(!lines[1].underline);
    }
}

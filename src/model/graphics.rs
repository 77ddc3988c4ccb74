//! Vector-graphics primitives used as table-border and underline evidence.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Orientation of a border line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Near-horizontal
    Horizontal,
    /// Near-vertical
    Vertical,
}

/// A border-line candidate in page-view coordinates.
///
/// Endpoints are normalized so `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphicsLine {
    /// Start X
    pub x1: f32,
    /// Start Y
    pub y1: f32,
    /// End X
    pub x2: f32,
    /// End Y
    pub y2: f32,
    /// Orientation
    pub orientation: Orientation,
    /// Stroke thickness in view units
    pub thickness: f32,
}

impl GraphicsLine {
    /// A horizontal line at `y` spanning `x1..x2`.
    pub fn horizontal(x1: f32, x2: f32, y: f32, thickness: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y,
            x2: x1.max(x2),
            y2: y,
            orientation: Orientation::Horizontal,
            thickness,
        }
    }

    /// A vertical line at `x` spanning `y1..y2`.
    pub fn vertical(x: f32, y1: f32, y2: f32, thickness: f32) -> Self {
        Self {
            x1: x,
            y1: y1.min(y2),
            x2: x,
            y2: y1.max(y2),
            orientation: Orientation::Vertical,
            thickness,
        }
    }

    /// Length along the main axis.
    pub fn length(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.x2 - self.x1,
            Orientation::Vertical => self.y2 - self.y1,
        }
    }

    /// Position across the main axis (Y for horizontal, X for vertical).
    pub fn position(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => (self.y1 + self.y2) / 2.0,
            Orientation::Vertical => (self.x1 + self.x2) / 2.0,
        }
    }

    /// Bounding box.
    pub fn bbox(&self) -> Rect {
        Rect::from_corners(self.x1, self.y1, self.x2, self.y2)
    }
}

/// A rectangle that is not line-like.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphicsRectangle {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Painted by a fill operator
    pub filled: bool,
}

impl GraphicsRectangle {
    /// Bounding box.
    pub fn bbox(&self) -> Rect {
        Rect::from_corners(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Graphics evidence extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsData {
    /// Border-line candidates
    pub lines: Vec<GraphicsLine>,
    /// Rectangle candidates
    pub rectangles: Vec<GraphicsRectangle>,
}

impl GraphicsData {
    /// No evidence.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there is no evidence at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.rectangles.is_empty()
    }

    /// Horizontal lines.
    pub fn horizontal_lines(&self) -> impl Iterator<Item = &GraphicsLine> {
        self.lines
            .iter()
            .filter(|l| l.orientation == Orientation::Horizontal)
    }

    /// Vertical lines.
    pub fn vertical_lines(&self) -> impl Iterator<Item = &GraphicsLine> {
        self.lines
            .iter()
            .filter(|l| l.orientation == Orientation::Vertical)
    }

    /// Count horizontal and vertical lines touching `area` grown by `margin`.
    ///
    /// Edges of unfilled rectangles enclosing part of the area count as one
    /// line per side.
    pub fn border_lines_near(&self, area: &Rect, margin: f32) -> (usize, usize) {
        let zone = area.expand(margin);
        let mut horizontal = 0;
        let mut vertical = 0;

        for line in &self.lines {
            if !line.bbox().intersects(&zone) {
                continue;
            }
            match line.orientation {
                Orientation::Horizontal => horizontal += 1,
                Orientation::Vertical => vertical += 1,
            }
        }

        for rect in self.rectangles.iter().filter(|r| !r.filled) {
            if rect.bbox().intersects(&zone) {
                horizontal += 2;
                vertical += 2;
            }
        }

        (horizontal, vertical)
    }

    /// Whether enough border lines surround `area` to count as a ruled table.
    pub fn has_table_borders(&self, area: &Rect, margin: f32, min_lines: usize) -> bool {
        let (horizontal, vertical) = self.border_lines_near(area, margin);
        horizontal > 0 && horizontal + vertical >= min_lines
    }

    /// A horizontal line just below a text baseline covering most of `x0..x1`.
    pub fn underline_for(
        &self,
        x0: f32,
        x1: f32,
        baseline: f32,
        max_offset: f32,
        min_coverage: f32,
    ) -> Option<&GraphicsLine> {
        let width = x1 - x0;
        if width <= 0.0 {
            return None;
        }
        self.horizontal_lines().find(|line| {
            let offset = line.position() - baseline;
            let overlap = line.x2.min(x1) - line.x1.max(x0);
            (0.0..=max_offset).contains(&offset) && overlap / width >= min_coverage
        })
    }
}

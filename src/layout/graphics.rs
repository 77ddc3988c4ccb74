//! Graphics extraction.
//!
//! Replays a page's operator list with a graphics-state stack and collects
//! straight border lines and rectangles in page-view coordinates. Nothing
//! here is emitted as output; the result only backs table and underline
//! decisions.

use log::{debug, warn};

use crate::config::{
    LINE_LENGTH_MIN, LINE_LENGTH_RATIO, LINE_THICKNESS_MIN, LINE_THICKNESS_RATIO,
    PAGE_PLAUSIBLE_MARGIN,
};
use crate::geometry::{Matrix, Rect};
use crate::model::{
    GraphicsData, GraphicsLine, GraphicsRectangle, Operator, PathOp, RawOperator, Viewport,
};

/// Path geometry in user space, waiting for a painting operator.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Segment { x1: f32, y1: f32, x2: f32, y2: f32 },
    Rect { x: f32, y: f32, width: f32, height: f32 },
}

impl Shape {
    fn points(&self) -> Vec<(f32, f32)> {
        match *self {
            Shape::Segment { x1, y1, x2, y2 } => vec![(x1, y1), (x2, y2)],
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => vec![
                (x, y),
                (x + width, y),
                (x, y + height),
                (x + width, y + height),
            ],
        }
    }
}

/// How the current path is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Stroke,
    Fill,
    FillStroke,
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            line_width: 1.0,
        }
    }
}

/// Mutable replay state for one operator list.
#[derive(Debug, Default)]
struct Replay {
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Option<Matrix>,
    path: Vec<Shape>,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl Replay {
    fn path_op(&mut self, op: PathOp) {
        match op {
            PathOp::MoveTo(x, y) => {
                self.current = Some((x, y));
                self.subpath_start = Some((x, y));
            }
            PathOp::LineTo(x, y) => {
                if let Some((x1, y1)) = self.current {
                    self.path.push(Shape::Segment { x1, y1, x2: x, y2: y });
                }
                self.current = Some((x, y));
            }
            PathOp::CurveTo(x, y) => {
                // Curves are never borders; only the pen moves.
                self.current = Some((x, y));
            }
            PathOp::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                self.path.push(Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                });
                self.current = Some((x, y));
                self.subpath_start = Some((x, y));
            }
            PathOp::ClosePath => {
                if let (Some((x1, y1)), Some((x2, y2))) = (self.current, self.subpath_start) {
                    if (x1, y1) != (x2, y2) {
                        self.path.push(Shape::Segment { x1, y1, x2, y2 });
                    }
                    self.current = Some((x2, y2));
                }
            }
        }
    }

    fn clear_path(&mut self) -> Vec<Shape> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.path)
    }
}

/// Extracts border evidence from a page's operator list.
#[derive(Debug, Clone)]
pub struct GraphicsExtractor {
    viewport: Viewport,
    viewport_matrix: Matrix,
    thickness_threshold: f32,
    length_threshold: f32,
}

impl GraphicsExtractor {
    /// Create an extractor for a page; thresholds scale with the base font size.
    pub fn new(viewport: &Viewport, base_font_size: f32) -> Self {
        Self {
            viewport: viewport.clone(),
            viewport_matrix: viewport.matrix(),
            thickness_threshold: LINE_THICKNESS_MIN.max(base_font_size * LINE_THICKNESS_RATIO),
            length_threshold: LINE_LENGTH_MIN.max(base_font_size * LINE_LENGTH_RATIO),
        }
    }

    /// Maximum cross-axis extent of a border line.
    pub fn thickness_threshold(&self) -> f32 {
        self.thickness_threshold
    }

    /// Minimum main-axis extent of a border line.
    pub fn length_threshold(&self) -> f32 {
        self.length_threshold
    }

    /// Replay the operators. Malformed operators are skipped; never fails.
    pub fn extract(&self, operators: &[RawOperator]) -> GraphicsData {
        let mut data = GraphicsData::empty();
        let mut replay = Replay::default();
        let mut skipped = 0usize;

        for raw in operators {
            let op = match Operator::decode(raw) {
                Ok(Some(op)) => op,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping graphics operator: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            match op {
                Operator::Save => replay.stack.push(replay.state),
                Operator::Restore => match replay.stack.pop() {
                    Some(state) => replay.state = state,
                    None => warn!("Unbalanced restore ignored"),
                },
                Operator::Concat(m) => {
                    if m.is_finite() {
                        replay.state.ctm = m.multiply(&replay.state.ctm);
                    } else {
                        warn!("Ignoring non-finite transform");
                    }
                }
                Operator::SetLineWidth(width) => replay.state.line_width = width.abs(),
                Operator::Path(step) => replay.path_op(step),
                Operator::ConstructPath(steps) => {
                    for step in steps {
                        replay.path_op(step);
                    }
                }
                Operator::Stroke => self.paint(&mut replay, Paint::Stroke, &mut data),
                Operator::CloseStroke => {
                    replay.path_op(PathOp::ClosePath);
                    self.paint(&mut replay, Paint::Stroke, &mut data);
                }
                Operator::Fill => self.paint(&mut replay, Paint::Fill, &mut data),
                Operator::FillStroke => self.paint(&mut replay, Paint::FillStroke, &mut data),
                Operator::EndPath => {
                    replay.clear_path();
                }
                Operator::BeginText => replay.text_matrix = Some(Matrix::identity()),
                Operator::EndText => replay.text_matrix = None,
                Operator::SetTextMatrix(m) => replay.text_matrix = Some(m),
            }
        }

        debug!(
            "Graphics: {} lines, {} rectangles ({} operators skipped)",
            data.lines.len(),
            data.rectangles.len(),
            skipped
        );
        data
    }

    fn paint(&self, replay: &mut Replay, paint: Paint, data: &mut GraphicsData) {
        let shapes = replay.clear_path();
        let state = replay.state;
        for shape in shapes {
            let Some(matrix) = self.choose_transform(&shape, &state.ctm, replay.text_matrix.as_ref())
            else {
                debug!("Dropping implausible shape {:?}", shape);
                continue;
            };
            match shape {
                Shape::Segment { .. } if paint == Paint::Fill => {}
                Shape::Segment { x1, y1, x2, y2 } => {
                    let thickness = state.line_width * matrix.scale_factor();
                    let (ax, ay) = matrix.transform_point(x1, y1);
                    let (bx, by) = matrix.transform_point(x2, y2);
                    if let Some(line) = self.classify_segment(ax, ay, bx, by, thickness) {
                        data.lines.push(line);
                    }
                }
                Shape::Rect { .. } => {
                    let bbox = view_bbox(&shape, &matrix);
                    if let Some(line) = self.line_like(&bbox) {
                        data.lines.push(line);
                    } else {
                        data.rectangles.push(GraphicsRectangle {
                            x: bbox.x0,
                            y: bbox.y0,
                            width: bbox.width(),
                            height: bbox.height(),
                            filled: paint != Paint::Stroke,
                        });
                    }
                }
            }
        }
    }

    /// Pick the first plausible transform among CTM, text-matrix-relative and direct.
    fn choose_transform(&self, shape: &Shape, ctm: &Matrix, text_matrix: Option<&Matrix>) -> Option<Matrix> {
        let mut candidates = vec![ctm.multiply(&self.viewport_matrix)];
        if let Some(tm) = text_matrix {
            candidates.push(tm.multiply(ctm).multiply(&self.viewport_matrix));
        }
        candidates.push(self.viewport_matrix);

        let points = shape.points();
        candidates.into_iter().find(|m| {
            points.iter().all(|&(x, y)| {
                let (vx, vy) = m.transform_point(x, y);
                self.viewport.is_plausible(vx, vy, PAGE_PLAUSIBLE_MARGIN)
            })
        })
    }

    fn classify_segment(&self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) -> Option<GraphicsLine> {
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        if dy < self.thickness_threshold && dx > self.length_threshold {
            Some(GraphicsLine::horizontal(x1, x2, (y1 + y2) / 2.0, thickness))
        } else if dx < self.thickness_threshold && dy > self.length_threshold {
            Some(GraphicsLine::vertical((x1 + x2) / 2.0, y1, y2, thickness))
        } else {
            None
        }
    }

    /// Thin, long rectangles are drawn borders.
    fn line_like(&self, bbox: &Rect) -> Option<GraphicsLine> {
        let (width, height) = (bbox.width(), bbox.height());
        let mid_x = (bbox.x0 + bbox.x1) / 2.0;
        let mid_y = (bbox.y0 + bbox.y1) / 2.0;
        if height < self.thickness_threshold && width > self.length_threshold {
            Some(GraphicsLine::horizontal(bbox.x0, bbox.x1, mid_y, height))
        } else if width < self.thickness_threshold && height > self.length_threshold {
            Some(GraphicsLine::vertical(mid_x, bbox.y0, bbox.y1, width))
        } else {
            None
        }
    }
}

fn view_bbox(shape: &Shape, matrix: &Matrix) -> Rect {
    let points: Vec<(f32, f32)> = shape
        .points()
        .into_iter()
        .map(|(x, y)| matrix.transform_point(x, y))
        .collect();
    let x0 = points.iter().map(|p| p.0).fold(f32::MAX, f32::min);
    let x1 = points.iter().map(|p| p.0).fold(f32::MIN, f32::max);
    let y0 = points.iter().map(|p| p.1).fold(f32::MAX, f32::min);
    let y1 = points.iter().map(|p| p.1).fold(f32::MIN, f32::max);
    Rect::from_corners(x0, y0, x1, y1)
}

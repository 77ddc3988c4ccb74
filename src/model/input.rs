//! Decoder output consumed by the engine.
//!
//! These types mirror what a PDF content-stream decoder hands over per page:
//! positioned text items in PDF user space, the raw graphics operator list,
//! and the viewport that maps user space to page-view space.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Matrix;

/// A positioned text item as produced by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    /// The text content
    #[serde(rename = "str")]
    pub text: String,
    /// X position of the baseline origin (user space)
    pub x: f32,
    /// Y position of the baseline (user space, grows upward)
    pub y: f32,
    /// Advance width of the text
    #[serde(default)]
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    #[serde(default)]
    pub font_name: String,
    /// 1-indexed page number
    #[serde(default)]
    pub page_num: u32,
}

impl TextItem {
    /// Create a text item.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            font_size,
            font_name: String::new(),
            page_num: 1,
        }
    }

    /// Set the font name and return self.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Set the page number and return self.
    pub fn on_page(mut self, page_num: u32) -> Self {
        self.page_num = page_num;
        self
    }
}

/// An operand of a graphics operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// A single number
    Number(f32),
    /// An array of numbers (path sub-operators, coordinates, matrices)
    Array(Vec<f32>),
    /// A name or string operand
    Name(String),
}

impl Operand {
    /// Numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Array value, if this is an array.
    pub fn as_array(&self) -> Option<&[f32]> {
        match self {
            Operand::Array(values) => Some(values),
            _ => None,
        }
    }
}

/// An undecoded graphics operator: opcode name plus operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOperator {
    /// Operator name (`save`, `moveTo`, `constructPath`, or the PDF spelling `q`, `m`, ...)
    pub op: String,
    /// Operands
    #[serde(default)]
    pub args: Vec<Operand>,
}

impl RawOperator {
    /// Create an operator with numeric operands.
    pub fn new(op: impl Into<String>, args: &[f32]) -> Self {
        Self {
            op: op.into(),
            args: args.iter().copied().map(Operand::Number).collect(),
        }
    }

    /// Create an operator with arbitrary operands.
    pub fn with_operands(op: impl Into<String>, args: Vec<Operand>) -> Self {
        Self {
            op: op.into(),
            args,
        }
    }

    /// Numeric operand at `index`.
    fn number(&self, index: usize) -> Result<f32> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| Error::MissingOperand {
                op: self.op.clone(),
                index,
            })?
            .as_number()
            .ok_or_else(|| Error::invalid_operator(&self.op, format!("operand {index} is not a number")))?;
        if !value.is_finite() {
            return Err(Error::invalid_operator(
                &self.op,
                format!("operand {index} is not finite"),
            ));
        }
        Ok(value)
    }

    /// Six numeric operands, given either inline or as one array.
    fn matrix(&self) -> Result<Matrix> {
        let matrix = match self.args.first() {
            Some(Operand::Array(values)) => Matrix::from_slice(values),
            _ => {
                let mut values = [0.0; 6];
                for (i, slot) in values.iter_mut().enumerate() {
                    *slot = self.number(i)?;
                }
                Matrix::from_slice(&values)
            }
        };
        matrix
            .filter(Matrix::is_finite)
            .ok_or_else(|| Error::invalid_operator(&self.op, "expected six finite numbers"))
    }
}

/// Path construction sub-operator codes used inside `constructPath`.
pub mod path_codes {
    /// Begin a subpath
    pub const MOVE_TO: f32 = 13.0;
    /// Straight segment
    pub const LINE_TO: f32 = 14.0;
    /// Cubic Bézier with two control points
    pub const CURVE_TO: f32 = 15.0;
    /// Cubic Bézier, first control point is the current point
    pub const CURVE_TO2: f32 = 16.0;
    /// Cubic Bézier, second control point is the end point
    pub const CURVE_TO3: f32 = 17.0;
    /// Close the subpath
    pub const CLOSE_PATH: f32 = 18.0;
    /// Rectangle subpath
    pub const RECTANGLE: f32 = 19.0;
}

/// One path-construction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    /// Start a new subpath
    MoveTo(f32, f32),
    /// Straight line to a point
    LineTo(f32, f32),
    /// Curve; only the end point matters for border detection
    CurveTo(f32, f32),
    /// Rectangle subpath
    Rectangle {
        /// Left edge (user space)
        x: f32,
        /// Bottom edge (user space)
        y: f32,
        /// Width
        width: f32,
        /// Height
        height: f32,
    },
    /// Close the current subpath
    ClosePath,
}

/// A decoded graphics operator relevant to border detection.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Push the graphics state
    Save,
    /// Pop the graphics state
    Restore,
    /// Concatenate a matrix to the CTM
    Concat(Matrix),
    /// Path construction
    Path(PathOp),
    /// Several path construction steps at once
    ConstructPath(Vec<PathOp>),
    /// Stroke the current path
    Stroke,
    /// Close and stroke the current path
    CloseStroke,
    /// Fill the current path
    Fill,
    /// Fill and stroke the current path
    FillStroke,
    /// End the path without painting
    EndPath,
    /// Set the stroke line width
    SetLineWidth(f32),
    /// Begin a text object
    BeginText,
    /// End a text object
    EndText,
    /// Set the text matrix
    SetTextMatrix(Matrix),
}

impl Operator {
    /// Decode a raw operator.
    ///
    /// Returns `Ok(None)` for operators that carry no geometry (colors, fonts,
    /// text showing) and an error for relevant operators with bad operands.
    pub fn decode(raw: &RawOperator) -> Result<Option<Operator>> {
        let op = match raw.op.as_str() {
            "save" | "q" => Operator::Save,
            "restore" | "Q" => Operator::Restore,
            "transform" | "concat" | "cm" => Operator::Concat(raw.matrix()?),
            "moveTo" | "m" => Operator::Path(PathOp::MoveTo(raw.number(0)?, raw.number(1)?)),
            "lineTo" | "l" => Operator::Path(PathOp::LineTo(raw.number(0)?, raw.number(1)?)),
            "curveTo" | "c" => Operator::Path(PathOp::CurveTo(raw.number(4)?, raw.number(5)?)),
            "curveTo2" | "curveTo3" | "v" | "y" => {
                Operator::Path(PathOp::CurveTo(raw.number(2)?, raw.number(3)?))
            }
            "rectangle" | "re" => Operator::Path(PathOp::Rectangle {
                x: raw.number(0)?,
                y: raw.number(1)?,
                width: raw.number(2)?,
                height: raw.number(3)?,
            }),
            "closePath" | "h" => Operator::Path(PathOp::ClosePath),
            "constructPath" => Operator::ConstructPath(decode_construct_path(raw)?),
            "stroke" | "S" => Operator::Stroke,
            "closeStroke" | "s" => Operator::CloseStroke,
            "fill" | "eoFill" | "f" | "F" | "f*" => Operator::Fill,
            "fillStroke" | "eoFillStroke" | "closeFillStroke" | "closeEOFillStroke" | "B"
            | "B*" | "b" | "b*" => Operator::FillStroke,
            "endPath" | "n" => Operator::EndPath,
            "setLineWidth" | "w" => Operator::SetLineWidth(raw.number(0)?),
            "beginText" | "BT" => Operator::BeginText,
            "endText" | "ET" => Operator::EndText,
            "setTextMatrix" | "Tm" => Operator::SetTextMatrix(raw.matrix()?),
            _ => return Ok(None),
        };
        Ok(Some(op))
    }
}

/// Decode the `[ops, coords]` operand pair of a `constructPath` operator.
fn decode_construct_path(raw: &RawOperator) -> Result<Vec<PathOp>> {
    let ops = raw
        .args
        .first()
        .and_then(Operand::as_array)
        .ok_or_else(|| Error::invalid_operator(&raw.op, "missing sub-operator array"))?;
    let coords = raw
        .args
        .get(1)
        .and_then(Operand::as_array)
        .ok_or_else(|| Error::invalid_operator(&raw.op, "missing coordinate array"))?;

    let mut path = Vec::with_capacity(ops.len());
    let mut cursor = 0usize;
    let mut take = |count: usize| take_coords(&raw.op, coords, &mut cursor, count);

    for &code in ops {
        let step = if code == path_codes::MOVE_TO {
            let c = take(2)?;
            PathOp::MoveTo(c[0], c[1])
        } else if code == path_codes::LINE_TO {
            let c = take(2)?;
            PathOp::LineTo(c[0], c[1])
        } else if code == path_codes::CURVE_TO {
            let c = take(6)?;
            PathOp::CurveTo(c[4], c[5])
        } else if code == path_codes::CURVE_TO2 || code == path_codes::CURVE_TO3 {
            let c = take(4)?;
            PathOp::CurveTo(c[2], c[3])
        } else if code == path_codes::CLOSE_PATH {
            PathOp::ClosePath
        } else if code == path_codes::RECTANGLE {
            let c = take(4)?;
            PathOp::Rectangle {
                x: c[0],
                y: c[1],
                width: c[2],
                height: c[3],
            }
        } else {
            return Err(Error::invalid_operator(
                &raw.op,
                format!("unknown path code {code}"),
            ));
        };
        path.push(step);
    }

    Ok(path)
}

fn take_coords<'a>(op: &str, coords: &'a [f32], cursor: &mut usize, count: usize) -> Result<&'a [f32]> {
    let slice = coords
        .get(*cursor..*cursor + count)
        .ok_or_else(|| Error::invalid_operator(op, "coordinate array too short"))?;
    if slice.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_operator(op, "non-finite coordinate"));
    }
    *cursor += count;
    Ok(slice)
}

/// Mapping from PDF user space to page-view space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// View width
    pub width: f32,
    /// View height
    pub height: f32,
    /// Affine transform `[a, b, c, d, e, f]`; a y-flip over `height` when absent
    #[serde(default)]
    pub transform: Option<[f32; 6]>,
}

impl Viewport {
    /// Viewport for an unscaled page: flips y so the view grows downward.
    pub fn for_page(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            transform: None,
        }
    }

    /// Viewport with an explicit transform.
    pub fn with_transform(width: f32, height: f32, transform: Matrix) -> Self {
        Self {
            width,
            height,
            transform: Some([
                transform.a,
                transform.b,
                transform.c,
                transform.d,
                transform.e,
                transform.f,
            ]),
        }
    }

    /// The user-space to view-space matrix.
    pub fn matrix(&self) -> Matrix {
        self.transform
            .and_then(|t| Matrix::from_slice(&t))
            .unwrap_or_else(|| Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, self.height))
    }

    /// Map a user-space point into view space.
    pub fn to_view(&self, x: f32, y: f32) -> (f32, f32) {
        self.matrix().transform_point(x, y)
    }

    /// Map a view-space point back into user space.
    pub fn to_user(&self, x: f32, y: f32) -> Result<(f32, f32)> {
        Ok(self.matrix().invert()?.transform_point(x, y))
    }

    /// Whether a view-space point lies on the page, give or take `margin`.
    pub fn is_plausible(&self, x: f32, y: f32, margin: f32) -> bool {
        x.is_finite()
            && y.is_finite()
            && x >= -margin
            && x <= self.width + margin
            && y >= -margin
            && y <= self.height + margin
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::for_page(612.0, 792.0)
    }
}

/// Everything the decoder supplies for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    /// 1-indexed page number
    pub page_num: u32,
    /// User-space to view-space mapping
    #[serde(default)]
    pub viewport: Viewport,
    /// Positioned text items
    #[serde(default)]
    pub text_items: Vec<TextItem>,
    /// Graphics operators
    #[serde(default)]
    pub operator_list: Vec<RawOperator>,
}

impl PageInput {
    /// Create an empty page.
    pub fn new(page_num: u32, viewport: Viewport) -> Self {
        Self {
            page_num,
            viewport,
            text_items: Vec::new(),
            operator_list: Vec::new(),
        }
    }

    /// Add a text item; its page number is set to this page.
    pub fn push_text(&mut self, item: TextItem) {
        self.text_items.push(item.on_page(self.page_num));
    }

    /// Add a graphics operator.
    pub fn push_operator(&mut self, op: RawOperator) {
        self.operator_list.push(op);
    }
}

/// A whole document as supplied by the decoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Pages in document order
    pub pages: Vec<PageInput>,
}

//! Data model for layout reconstruction.
//!
//! Inputs come from the external decoder ([`PageInput`]), flow through
//! [`TextRun`]s, [`Line`]s and [`Block`]s, and leave as [`Element`]s.

mod block;
mod classification;
mod element;
mod graphics;
mod input;
mod line;
mod table;

pub use block::{Block, BlockOrigin, GapAfter};
pub use classification::{
    Algorithm, BlockClassification, Classification, ClassificationResult, Decision, ElementType,
    ListMarker, MarkerStyle,
};
pub use element::{Element, Heading, List, ListItem, Paragraph};
pub use graphics::{GraphicsData, GraphicsLine, GraphicsRectangle, Orientation};
pub use input::{
    path_codes, DocumentInput, Operand, Operator, PageInput, PathOp, RawOperator, TextItem,
    Viewport,
};
pub use line::{font_style, Line, TextRun};
pub use table::Table;

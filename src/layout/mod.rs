//! Page geometry: graphics evidence, lines, columns, gaps and blocks.
//!
//! The stages run in this order for every page:
//!
//! 1. [`graphics::GraphicsExtractor`] replays the operator list into border lines and rectangles.
//! 2. [`lines::LineBuilder`] groups text runs into visual lines.
//! 3. [`columns::ColumnDetector`] assigns every line a column.
//! 4. [`gaps::GapAnalysis`] summarizes the vertical spacing.
//! 5. [`grouper::ElementGrouper`] cuts each column into classified blocks.

pub mod clustering;
pub mod columns;
pub mod gaps;
pub mod graphics;
pub mod grouper;
pub mod lines;

pub use clustering::{cluster_values, Cluster};
pub use columns::{ColumnDetector, ColumnLayout};
pub use gaps::{GapAnalysis, GapStats};
pub use graphics::GraphicsExtractor;
pub use grouper::ElementGrouper;
pub use lines::LineBuilder;

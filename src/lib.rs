//! # pagestruct
//!
//! Layout reconstruction for PDF pages.
//!
//! A PDF page is a bag of positioned glyph runs and vector drawing
//! operators. This library turns that into the structure a reader sees:
//! headings, paragraphs, nested lists and tables, in reading order.
//! Decoding the PDF itself is left to an external decoder that supplies
//! text items, graphics operators and a viewport per page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagestruct::{process, read_input_file, render, JsonFormat};
//!
//! fn main() -> pagestruct::Result<()> {
//!     // Pages decoded elsewhere, saved as JSON
//!     let input = read_input_file("document.json")?;
//!
//!     let layout = process(&input);
//!     println!("{}", render::to_json(&layout, JsonFormat::Pretty)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Multi-column pages**: gutters split columns, reading order follows them
//! - **Classification**: heading, paragraph, list and table scores combined by a rule engine
//! - **Tables**: from text alignment alone, from border lines, or rebuilt across columns
//! - **Lists**: inline "Heading: • a • b" lists, nesting by indentation, resumed numbering
//! - **Parallel processing**: uses Rayon for multi-page documents
//! - **Failure isolation**: a failing page comes back empty instead of aborting the document

pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod lists;
pub mod metrics;
pub mod model;
pub mod page;
pub mod render;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use config::{LayoutOptions, PageSelection};
pub use error::{Error, Result};
pub use geometry::{Matrix, Rect};
pub use metrics::{DocumentStructure, FontStatistics, Metrics};
pub use model::{
    Block, BlockClassification, Classification, ClassificationResult, Decision, DocumentInput,
    Element, ElementType, GraphicsData, Heading, Line, List, ListItem, PageInput, Paragraph,
    RawOperator, Table, TextItem, Viewport,
};
pub use page::{
    CancellationToken, DocumentLayout, LayoutEngine, PageLayout, PageProcessor, PageStatus,
};
pub use render::JsonFormat;
#[cfg(feature = "async")]
pub use source::AsyncPageSource;
pub use source::PageSource;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read decoded pages from a JSON file.
///
/// The file holds a [`DocumentInput`]: `{"pages": [{"pageNum": 1, ...}]}`.
///
/// # Example
///
/// ```no_run
/// use pagestruct::read_input_file;
///
/// let input = read_input_file("document.json").unwrap();
/// println!("Pages: {}", input.pages.len());
/// ```
pub fn read_input_file<P: AsRef<Path>>(path: P) -> Result<DocumentInput> {
    let file = File::open(path)?;
    read_input(BufReader::new(file))
}

/// Read decoded pages as JSON from any reader.
pub fn read_input<R: Read>(reader: R) -> Result<DocumentInput> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reconstruct the layout of a document with default options.
pub fn process(input: &DocumentInput) -> DocumentLayout {
    process_with_options(input, LayoutOptions::default())
}

/// Reconstruct the layout of a document with custom options.
///
/// # Example
///
/// ```no_run
/// use pagestruct::{process_with_options, read_input_file, LayoutOptions, PageSelection};
///
/// let input = read_input_file("document.json").unwrap();
/// let options = LayoutOptions::new()
///     .sequential()
///     .with_pages(PageSelection::Range(1..=5))
///     .with_tables(false);
/// let layout = process_with_options(&input, options);
/// ```
pub fn process_with_options(input: &DocumentInput, options: LayoutOptions) -> DocumentLayout {
    LayoutEngine::new(options).process_document(input)
}

/// Read a JSON input file and render its layout as JSON.
///
/// # Example
///
/// ```no_run
/// use pagestruct::{to_json, JsonFormat};
///
/// let json = to_json("document.json", JsonFormat::Pretty).unwrap();
/// std::fs::write("layout.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let input = read_input_file(path)?;
    render::to_json(&process(&input), format)
}

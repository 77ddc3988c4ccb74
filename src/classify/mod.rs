//! Block classification.
//!
//! Four independent classifiers score every block; the [`decider`] turns
//! the four scores plus document context into one element type. A failing
//! classifier never loses the block: it falls back to a paragraph.

pub mod decider;
pub mod heading;
pub mod list;
pub mod paragraph;
pub mod table;

use std::sync::Arc;

use log::warn;

pub use decider::decide;
pub use heading::classify_heading;
pub use list::{classify_list, parse_marker};
pub use paragraph::classify_paragraph;
pub use table::classify_table;

use crate::config::DEFAULT_LEADING_MULTIPLIER;
use crate::error::Result;
use crate::metrics::{DocumentStructure, Metrics};
use crate::model::{
    Algorithm, Block, BlockClassification, Classification, ClassificationResult, Decision,
    GapAfter, GraphicsData,
};

/// Read-only context shared by the classifiers of one page.
#[derive(Debug, Clone)]
pub struct ClassifierContext<'a> {
    metrics: &'a Metrics,
    graphics: Option<Arc<GraphicsData>>,
    column_tolerance: f32,
    row_tolerance: f32,
}

impl<'a> ClassifierContext<'a> {
    /// Context with the document tolerances and no graphics evidence.
    pub fn new(metrics: &'a Metrics) -> Self {
        Self {
            metrics,
            graphics: None,
            column_tolerance: metrics.column_tolerance(),
            row_tolerance: metrics.row_tolerance(),
        }
    }

    /// Context for a page, picking up its graphics evidence if extracted.
    pub fn for_page(metrics: &'a Metrics, page: u32) -> Self {
        let mut ctx = Self::new(metrics);
        ctx.graphics = metrics.graphics(page);
        ctx
    }

    /// Attach graphics evidence.
    pub fn with_graphics(mut self, graphics: Arc<GraphicsData>) -> Self {
        self.graphics = Some(graphics);
        self
    }

    /// Override the clustering tolerances.
    pub fn with_tolerances(mut self, column_tolerance: f32, row_tolerance: f32) -> Self {
        self.column_tolerance = column_tolerance;
        self.row_tolerance = row_tolerance;
        self
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &'a Metrics {
        self.metrics
    }

    /// Base font size.
    pub fn base_font_size(&self) -> f32 {
        self.metrics.base_font_size()
    }

    /// Document structure.
    pub fn structure(&self) -> DocumentStructure {
        self.metrics.structure()
    }

    /// X clustering tolerance.
    pub fn column_tolerance(&self) -> f32 {
        self.column_tolerance
    }

    /// Y clustering tolerance.
    pub fn row_tolerance(&self) -> f32 {
        self.row_tolerance
    }

    /// Graphics evidence for the page, if any.
    pub fn graphics(&self) -> Option<&GraphicsData> {
        self.graphics.as_deref()
    }

    /// Font size relative to the base font.
    pub fn font_ratio(&self, font_size: f32) -> f32 {
        let base = self.base_font_size();
        if base > 0.0 {
            font_size / base
        } else {
            1.0
        }
    }
}

/// What surrounds a block in its column.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood<'b> {
    /// First block of the document
    pub is_first_block: bool,
    /// Distance to the next block
    pub gap_after: GapAfter,
    /// Next block in the same column
    pub next: Option<&'b Block>,
    /// Typical line spacing of the column
    pub normal_gap: f32,
}

impl<'b> Neighborhood<'b> {
    /// A block with no known neighbors.
    pub fn isolated(base_font_size: f32) -> Self {
        Self {
            is_first_block: false,
            gap_after: GapAfter::PageBreak,
            next: None,
            normal_gap: base_font_size * DEFAULT_LEADING_MULTIPLIER,
        }
    }
}

/// Run all four classifiers and decide.
///
/// Any classifier error degrades the block to a paragraph at the fallback confidence.
pub fn classify_block(block: &Block, ctx: &ClassifierContext<'_>, neighborhood: &Neighborhood<'_>) -> BlockClassification {
    match run_classifiers(block, ctx, neighborhood) {
        Ok(classification) => classification,
        Err(e) => {
            warn!(
                "Classification failed on page {} ({}), falling back to paragraph",
                block.page_num, e
            );
            fallback_classification(&e.to_string())
        }
    }
}

fn run_classifiers(block: &Block, ctx: &ClassifierContext<'_>, neighborhood: &Neighborhood<'_>) -> Result<BlockClassification> {
    let heading = classify_heading(block, ctx, neighborhood)?;
    let paragraph = classify_paragraph(block, ctx)?;
    let list = classify_list(block)?;
    let table = classify_table(&block.lines, ctx)?;
    let decision = decide(block, &heading, &paragraph, &list, &table, ctx);
    Ok(BlockClassification {
        heading,
        paragraph,
        list,
        table,
        decision,
    })
}

/// Zero-confidence results with a paragraph decision.
pub fn fallback_classification(reason: &str) -> BlockClassification {
    BlockClassification {
        heading: ClassificationResult::new(
            Algorithm::Heading,
            0.0,
            Classification::Heading {
                level: 1,
                implicit: false,
            },
        ),
        paragraph: ClassificationResult::new(
            Algorithm::Paragraph,
            0.0,
            Classification::Paragraph { very_long: false },
        ),
        list: ClassificationResult::new(
            Algorithm::List,
            0.0,
            Classification::List {
                ordered: false,
                marker: None,
                nesting_hint: 0,
            },
        ),
        table: ClassificationResult::new(
            Algorithm::Table,
            0.0,
            Classification::Table {
                is_table: false,
                columns: 0,
                rows: 0,
                has_borders: false,
                sub_results: Vec::new(),
            },
        ),
        decision: Decision::fallback(format!("fallback: {reason}")),
    }
}

/// Text ends with sentence punctuation.
pub(crate) fn ends_sentence(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| matches!(c, '.' | '!' | '?' | '。' | '！' | '？'))
}

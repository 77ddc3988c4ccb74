//! Page processing.
//!
//! [`PageProcessor`] runs the whole pipeline for one page: graphics, lines,
//! columns, gaps, blocks, classification, list and table reconstruction,
//! and finally elements in reading order. [`LayoutEngine`] drives it over a
//! document, one task per page.
//!
//! A page never takes the document down with it. Errors and panics inside
//! the pipeline are caught at the page boundary, logged, and the page comes
//! back empty.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classify::{parse_marker, ClassifierContext};
use crate::config::LayoutOptions;
use crate::error::{Error, Result};
use crate::layout::grouper::link_gaps;
use crate::layout::{ColumnDetector, ElementGrouper, GapAnalysis, GraphicsExtractor, LineBuilder};
use crate::lists::{split_list_blocks, Flow, ListEntry, ListGrouper};
use crate::metrics::Metrics;
use crate::model::{
    Block, Classification, DocumentInput, Element, ElementType, Heading, PageInput, Paragraph,
};
use crate::table::{split_table_fragments, ColumnMerger, PlacedTable, TableExtractor};

/// Shared flag that stops pages from starting.
///
/// Pages already running finish normally; every page that has not started
/// when the token is cancelled comes back as [`PageStatus::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }
}

/// How a page ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Processed normally
    #[default]
    Complete,
    /// A stage failed; the page has no elements
    Failed,
    /// Cancelled before it started
    Cancelled,
}

/// Elements of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    /// 1-indexed page number
    pub page_num: u32,
    /// Outcome
    #[serde(default)]
    pub status: PageStatus,
    /// Elements in reading order
    pub elements: Vec<Element>,
}

impl PageLayout {
    /// A processed page.
    pub fn complete(page_num: u32, elements: Vec<Element>) -> Self {
        Self {
            page_num,
            status: PageStatus::Complete,
            elements,
        }
    }

    /// An empty page after a failure.
    pub fn failed(page_num: u32) -> Self {
        Self {
            page_num,
            status: PageStatus::Failed,
            elements: Vec::new(),
        }
    }

    /// An empty page that never started.
    pub fn cancelled(page_num: u32) -> Self {
        Self {
            page_num,
            status: PageStatus::Cancelled,
            elements: Vec::new(),
        }
    }
}

/// Reconstructed layout of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Pages in page order
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// All elements, concatenated in page order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }

    /// Number of elements per type.
    pub fn count_by_type(&self) -> HashMap<ElementType, usize> {
        let mut counts = HashMap::new();
        for element in self.elements() {
            *counts.entry(element.element_type()).or_insert(0) += 1;
        }
        counts
    }

    /// Page numbers that failed.
    pub fn failed_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::Failed)
            .map(|p| p.page_num)
            .collect()
    }

    /// Whether any page was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.pages.iter().any(|p| p.status == PageStatus::Cancelled)
    }
}

/// Runs the pipeline for single pages against shared document metrics.
#[derive(Debug, Clone, Copy)]
pub struct PageProcessor<'a> {
    metrics: &'a Metrics,
    options: &'a LayoutOptions,
}

impl<'a> PageProcessor<'a> {
    /// Create a processor.
    pub fn new(metrics: &'a Metrics, options: &'a LayoutOptions) -> Self {
        Self { metrics, options }
    }

    /// Process one page. Never fails: a failing page comes back empty.
    ///
    /// `document_start` marks the page whose first block opens the document.
    pub fn process(&self, page: &PageInput, document_start: bool) -> PageLayout {
        isolate(page.page_num, || self.layout(page, document_start))
    }

    /// The pipeline itself; errors and panics are the caller's to contain.
    pub fn layout(&self, page: &PageInput, document_start: bool) -> Result<Vec<Element>> {
        let metrics = self.metrics;
        let base = metrics.base_font_size();
        let page_num = page.page_num;

        let graphics = self.options.use_graphics.then(|| {
            let data = GraphicsExtractor::new(&page.viewport, base).extract(&page.operator_list);
            metrics.set_graphics(page_num, data)
        });

        let mut lines = LineBuilder::new(base).build(LineBuilder::runs_from_page(page));
        if lines.is_empty() {
            debug!("Page {} has no text", page_num);
            return Ok(Vec::new());
        }
        if let Some(graphics) = &graphics {
            LineBuilder::apply_underlines(&mut lines, graphics);
        }

        let columns = ColumnDetector::new(metrics.column_tolerance()).assign(&mut lines);
        let gaps = metrics.set_gap_analysis(page_num, GapAnalysis::analyze(&lines, base));
        debug!(
            "Page {}: {} lines in {} columns",
            page_num,
            lines.len(),
            columns.column_count()
        );

        let mut ctx = ClassifierContext::new(metrics);
        if let Some(graphics) = &graphics {
            ctx = ctx.with_graphics(Arc::clone(graphics));
        }

        let grouper = ElementGrouper::new(base);
        let mut blocks = grouper.group(lines, &gaps);
        grouper.classify(&mut blocks, &ctx, &gaps, document_start);

        if self.options.detect_lists {
            blocks = split_list_blocks(blocks);
            link_gaps(&mut blocks);
        }

        let mut tables = Vec::new();
        if self.options.detect_tables {
            blocks = split_table_fragments(blocks, metrics.y_key_tolerance());
            link_gaps(&mut blocks);
            let outcome = ColumnMerger::new(&ctx).merge(blocks);
            tables = outcome.tables;
            blocks = outcome.blocks;
            link_gaps(&mut blocks);
        }

        // Pieces created by the splitters and the merger are still unclassified.
        grouper.classify(&mut blocks, &ctx, &gaps, document_start);

        let extractor = TableExtractor::new(ctx.column_tolerance(), ctx.row_tolerance());
        let flow = self.reading_order(blocks, tables, &extractor);
        let elements = if self.options.detect_lists {
            ListGrouper::new(base).group(flow)
        } else {
            flow.into_iter()
                .filter_map(|piece| match piece {
                    Flow::Element(element) => Some(element),
                    Flow::Item(_) => None,
                })
                .collect()
        };

        debug!("Page {}: {} elements", page_num, elements.len());
        Ok(elements)
    }

    /// Order blocks by column then top, slot merged tables in at their first row.
    fn reading_order(
        &self,
        mut blocks: Vec<Block>,
        mut tables: Vec<PlacedTable>,
        extractor: &TableExtractor,
    ) -> Vec<Flow> {
        blocks.sort_by(|a, b| {
            a.column
                .cmp(&b.column)
                .then_with(|| a.first_baseline().total_cmp(&b.first_baseline()))
        });
        tables.sort_by(|a, b| a.column.cmp(&b.column).then_with(|| a.y.total_cmp(&b.y)));

        let mut flow = Vec::with_capacity(blocks.len() + tables.len());
        let mut tables = tables.into_iter().peekable();
        for block in blocks {
            while let Some(placed) = tables.next_if(|t| {
                (t.column, t.y).partial_cmp(&(block.column, block.first_baseline())) == Some(Ordering::Less)
            }) {
                flow.push(Flow::Element(Element::Table(placed.table)));
            }
            flow.push(self.block_flow(block, extractor));
        }
        flow.extend(tables.map(|t| Flow::Element(Element::Table(t.table))));
        flow
    }

    fn block_flow(&self, block: Block, extractor: &TableExtractor) -> Flow {
        let confidence = block.decision_confidence().unwrap_or(1.0);
        match block.element_type() {
            Some(ElementType::Heading) => {
                let level = block
                    .classification
                    .as_ref()
                    .and_then(|c| match c.heading.classification {
                        Classification::Heading { level, .. } => Some(level),
                        _ => None,
                    })
                    .unwrap_or_else(|| self.metrics.font_stats().heading_level(block.font_size));
                let mut heading = Heading::new(block.text.trim(), level, block.page_num);
                heading.bold = block.bold;
                heading.italic = block.italic;
                heading.underline = block.underline;
                heading.introduces_list = block.followed_by_list;
                heading.confidence = confidence;
                Flow::Element(Element::Heading(heading))
            }
            Some(ElementType::List) if self.options.detect_lists => Flow::Item(list_entry(block)),
            Some(ElementType::Table) if self.options.detect_tables => match extractor.extract(&block) {
                Some(table) => Flow::Element(Element::Table(table)),
                None => {
                    debug!(
                        "Table block on page {} did not yield a grid; keeping it as a paragraph",
                        block.page_num
                    );
                    paragraph(block, confidence)
                }
            },
            _ => paragraph(block, confidence),
        }
    }
}

fn paragraph(block: Block, confidence: f32) -> Flow {
    let mut paragraph = Paragraph::new(block.text.trim(), block.page_num);
    paragraph.bold = block.bold;
    paragraph.italic = block.italic;
    paragraph.confidence = confidence;
    Flow::Element(Element::Paragraph(paragraph))
}

fn list_entry(block: Block) -> ListEntry {
    let (marker, text) = match block.list_marker {
        Some(marker) => (Some(marker), block.text.trim().to_string()),
        None => match parse_marker(&block.text) {
            Some((marker, rest)) => (Some(marker), rest.trim().to_string()),
            None => {
                let marker = block.classification.as_ref().and_then(|c| match &c.list.classification {
                    Classification::List { marker, .. } => marker.clone(),
                    _ => None,
                });
                (marker, block.text.trim().to_string())
            }
        },
    };
    ListEntry {
        ordered: marker.as_ref().is_some_and(|m| m.is_ordered()),
        text,
        marker,
        x: block.x,
        page: block.page_num,
    }
}

/// Run one page's pipeline, turning errors and panics into an empty page.
fn isolate<F>(page_num: u32, run: F) -> PageLayout
where
    F: FnOnce() -> Result<Vec<Element>>,
{
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(elements)) => PageLayout::complete(page_num, elements),
        Ok(Err(e)) => {
            error!("Page {} failed: {}", page_num, e);
            PageLayout::failed(page_num)
        }
        Err(payload) => {
            let e = Error::Page {
                page: page_num,
                message: format!("panicked: {}", panic_message(payload.as_ref())),
            };
            error!("{}", e);
            PageLayout::failed(page_num)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Layout reconstruction for whole documents.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
    cancel: CancellationToken,
}

impl LayoutEngine {
    /// Create an engine.
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this engine's pending pages.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Options in use.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Document metrics for a set of pages, with the option overrides applied.
    pub fn metrics_for(&self, pages: &[PageInput]) -> Metrics {
        Metrics::from_pages(pages).with_options(&self.options)
    }

    /// Process every selected page of a document.
    pub fn process_document(&self, document: &DocumentInput) -> DocumentLayout {
        self.process_pages(&document.pages)
    }

    /// Process every selected page, in page order.
    pub fn process_pages(&self, pages: &[PageInput]) -> DocumentLayout {
        let metrics = self.metrics_for(pages);
        let first_page = pages.iter().map(|p| p.page_num).min();
        let selected: Vec<&PageInput> = pages
            .iter()
            .filter(|p| self.options.pages.includes(p.page_num))
            .collect();
        info!(
            "Processing {} of {} pages (base font {:.1}pt)",
            selected.len(),
            pages.len(),
            metrics.base_font_size()
        );

        let run = |page: &&PageInput| self.process_page(page, &metrics, first_page == Some(page.page_num));
        let mut layouts: Vec<PageLayout> = if self.options.parallel {
            selected.par_iter().map(run).collect()
        } else {
            selected.iter().map(run).collect()
        };
        layouts.sort_by_key(|p| p.page_num);

        let failed = layouts.iter().filter(|p| p.status == PageStatus::Failed).count();
        if failed > 0 {
            warn!("{} of {} pages failed", failed, layouts.len());
        }
        DocumentLayout { pages: layouts }
    }

    /// Process one page against document metrics, honoring cancellation.
    pub fn process_page(&self, page: &PageInput, metrics: &Metrics, document_start: bool) -> PageLayout {
        if self.cancel.is_cancelled() {
            info!("Page {}: {}", page.page_num, Error::Cancelled);
            return PageLayout::cancelled(page.page_num);
        }
        PageProcessor::new(metrics, &self.options).process(page, document_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextItem, Viewport};

    const PAGE_HEIGHT: f32 = 792.0;

    /// A text item placed by its view-space baseline.
    fn item(text: &str, x: f32, y: f32, size: f32) -> TextItem {
        let width = text.chars().count() as f32 * size * 0.5;
        TextItem::new(text, x, PAGE_HEIGHT - y, width, size).with_font("Helvetica")
    }

    fn page(num: u32, items: Vec<TextItem>) -> PageInput {
        let mut page = PageInput::new(num, Viewport::for_page(612.0, PAGE_HEIGHT));
        for item in items {
            page.push_text(item);
        }
        page
    }

    fn body(y: f32) -> Vec<TextItem> {
        vec![
            item("The engine reads positioned text and rebuilds the structure of", 72.0, y, 12.0),
            item("the page from geometry alone, one stage after another, until", 72.0, y + 14.0, 12.0),
            item("every block has been given a type and a place in the output.", 72.0, y + 28.0, 12.0),
        ]
    }

    #[test]
    fn test_heading_then_paragraph() {
        let mut items = vec![item("Introduction", 72.0, 80.0, 20.0)];
        items.extend(body(120.0));
        let doc = DocumentInput {
            pages: vec![page(1, items)],
        };
        let layout = LayoutEngine::new(LayoutOptions::default()).process_document(&doc);

        assert_eq!(layout.pages.len(), 1);
        let elements = &layout.pages[0].elements;
        assert_eq!(elements.len(), 2);
        let Element::Heading(heading) = &elements[0] else {
            panic!("expected heading, got {:?}", elements[0]);
        };
        assert_eq!(heading.text, "Introduction");
        assert!(matches!(elements[1], Element::Paragraph(_)));
    }

    #[test]
    fn test_empty_page() {
        let doc = DocumentInput {
            pages: vec![page(1, Vec::new())],
        };
        let layout = LayoutEngine::new(LayoutOptions::default()).process_document(&doc);
        assert_eq!(layout.pages[0].status, PageStatus::Complete);
        assert!(layout.pages[0].elements.is_empty());
    }

    #[test]
    fn test_pages_in_order_and_selected() {
        let pages: Vec<PageInput> = (1..=4).map(|n| page(n, body(100.0))).collect();
        let doc = DocumentInput { pages };
        let options = LayoutOptions::default().with_pages(crate::config::PageSelection::Pages(vec![2, 4]));
        let layout = LayoutEngine::new(options).process_document(&doc);

        let numbers: Vec<u32> = layout.pages.iter().map(|p| p.page_num).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert!(layout.elements().all(|e| e.page() == 2 || e.page() == 4));
    }

    #[test]
    fn test_cancelled_before_start() {
        let doc = DocumentInput {
            pages: vec![page(1, body(100.0)), page(2, body(100.0))],
        };
        let engine = LayoutEngine::new(LayoutOptions::default().sequential());
        engine.cancellation_token().cancel();
        let layout = engine.process_document(&doc);

        assert!(layout.is_cancelled());
        assert!(layout.pages.iter().all(|p| p.status == PageStatus::Cancelled));
        assert_eq!(layout.element_count(), 0);
    }

    #[test]
    fn test_failures_are_contained() {
        let failed = isolate(3, || Err(crate::error::Error::Other("broken".into())));
        assert_eq!(failed, PageLayout::failed(3));

        let panicked = isolate(4, || panic!("stage exploded"));
        assert_eq!(panicked.status, PageStatus::Failed);
        assert!(panicked.elements.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pages: Vec<PageInput> = (1..=6)
            .map(|n| {
                let mut items = vec![item("Section", 72.0, 80.0, 18.0)];
                items.extend(body(120.0));
                page(n, items)
            })
            .collect();
        let doc = DocumentInput { pages };
        let parallel = LayoutEngine::new(LayoutOptions::default()).process_document(&doc);
        let sequential = LayoutEngine::new(LayoutOptions::default().sequential()).process_document(&doc);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_list_items_become_list() {
        let mut items = vec![item("Requirements:", 72.0, 80.0, 12.0)];
        items.push(item("• A positioned text decoder", 72.0, 100.0, 12.0));
        items.push(item("• Graphics operators for borders", 72.0, 114.0, 12.0));
        items.push(item("• A viewport for every page", 72.0, 128.0, 12.0));
        let doc = DocumentInput {
            pages: vec![page(1, items)],
        };
        let layout = LayoutEngine::new(LayoutOptions::default()).process_document(&doc);
        let lists: Vec<_> = layout
            .elements()
            .filter_map(|e| match e {
                Element::List(l) => Some(l),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].items.len(), 3);
        assert_eq!(lists[0].items[0].text, "A positioned text decoder");
        assert!(!lists[0].ordered);
    }

    #[test]
    fn test_document_layout_counts() {
        let layout = DocumentLayout {
            pages: vec![
                PageLayout::complete(1, vec![Element::Paragraph(Paragraph::new("a", 1))]),
                PageLayout::failed(2),
            ],
        };
        assert_eq!(layout.element_count(), 1);
        assert_eq!(layout.count_by_type().get(&ElementType::Paragraph), Some(&1));
        assert_eq!(layout.failed_pages(), vec![2]);
        assert!(!layout.is_cancelled());
    }
}

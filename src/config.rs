//! Layout options and tuning constants.
//!
//! Every threshold the engine uses lives here as a named constant. Most of
//! them were tuned against real documents; they are reproduced as-is rather
//! than derived.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Fonts and tolerances
// ---------------------------------------------------------------------------

/// Base font size used when a document carries no usable font information.
pub const DEFAULT_BASE_FONT_SIZE: f32 = 12.0;

/// Y tolerance for putting two runs on the same line (fraction of font size).
pub const LINE_Y_TOLERANCE_RATIO: f32 = 0.3;

/// Horizontal gap that splits one Y-band into separate lines (× base font size).
pub const LINE_SPLIT_GAP_MULTIPLIER: f32 = 2.0;

/// Column clustering tolerance (× base font size).
pub const COLUMN_TOLERANCE_MULTIPLIER: f32 = 1.5;

/// Row clustering tolerance (× base font size).
pub const ROW_TOLERANCE_MULTIPLIER: f32 = 0.4;

/// Cell clustering tolerance inside the table extractor (× base font size).
pub const CELL_TOLERANCE_MULTIPLIER: f32 = 1.0;

/// Tolerance for the cross-column normalized Y key (× base font size).
pub const Y_KEY_TOLERANCE_MULTIPLIER: f32 = 0.1;

/// Maximum vertical distance between chained table rows (× base font size).
pub const TABLE_ROW_GAP_MULTIPLIER: f32 = 2.5;

/// Font size difference that always breaks a block.
pub const FONT_SIZE_BREAK_DELTA: f32 = 1.0;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Slack between a gutter's right edge and the next column's line starts (points).
pub const GUTTER_EDGE_SLACK: f32 = 3.0;

/// Minimum width of an empty vertical strip to count as a gutter (points).
pub const MIN_GUTTER_WIDTH: f32 = 12.0;

/// Fraction of lines allowed to cross a gutter (titles, full-width rules).
pub const GUTTER_MAX_OCCUPANCY_RATIO: f32 = 0.05;

/// Minimum number of lines starting in a cluster for it to open a column.
pub const COLUMN_MIN_LINES: usize = 3;

// ---------------------------------------------------------------------------
// Gap analysis
// ---------------------------------------------------------------------------

/// Spread above the median gap still considered normal leading.
pub const NORMAL_GAP_SPREAD: f32 = 0.15;

/// Safety factor applied to `normal_gap_max` when joining lines.
pub const GAP_SAFETY_FACTOR: f32 = 1.1;

/// Minimum ratio between a paragraph gap and the normal leading.
pub const PARAGRAPH_GAP_FACTOR: f32 = 1.25;

/// A gap this many times larger than both neighbours is an outlier.
pub const OUTLIER_GAP_RATIO: f32 = 1.5;

/// A sentence-final line narrower than this share of the widest line ends a paragraph.
pub const SHORT_LINE_RATIO: f32 = 0.8;

/// Default leading when a page has too few lines to measure (× base font size).
pub const DEFAULT_LEADING_MULTIPLIER: f32 = 1.2;

// ---------------------------------------------------------------------------
// Text lengths
// ---------------------------------------------------------------------------

/// Texts at or above this length are always paragraphs.
pub const VERY_LONG_TEXT_MIN: usize = 300;

/// Texts at or above this length can never be headings.
pub const LONG_TEXT_MIN: usize = 150;

/// "Very short" text for the heading-vs-paragraph rule.
pub const VERY_SHORT_TEXT_MAX: usize = 40;

/// "Short" text for the heading-vs-paragraph rule.
pub const SHORT_TEXT_MAX: usize = 80;

/// Maximum length of a list heading ("Options:").
pub const LIST_HEADING_MAX_LENGTH: usize = 100;

/// Maximum length of an implicit heading in a homogeneous document.
pub const IMPLICIT_HEADING_MAX_LENGTH: usize = 80;

/// Next block must be this many times longer than an implicit heading.
pub const IMPLICIT_HEADING_NEXT_RATIO: f32 = 3.0;

/// Gap after an implicit heading, relative to the normal leading.
pub const IMPLICIT_HEADING_GAP_RATIO: f32 = 1.5;

// ---------------------------------------------------------------------------
// Classification and decision
// ---------------------------------------------------------------------------

/// Minimum number of columns for a table.
pub const TABLE_MIN_COLUMNS: usize = 2;

/// Minimum number of rows for a table.
pub const TABLE_MIN_ROWS: usize = 2;

/// Combined table confidence needed to call a block a table.
pub const TABLE_MIN_CONFIDENCE: f32 = 0.6;

/// Table confidence that wins over a higher paragraph confidence.
pub const TABLE_TRUST_CONFIDENCE: f32 = 0.7;

/// Ceiling for tables detected from text alignment alone.
pub const TEXT_ONLY_TABLE_CEILING: f32 = 0.9;

/// Bonus for tables backed by border lines.
pub const GRAPHICS_TABLE_BONUS: f32 = 0.1;

/// Weight of the grid-pattern algorithm in the table vote.
pub const GRID_PATTERN_WEIGHT: f32 = 0.5;

/// Weight of the column-alignment algorithm in the table vote.
pub const COLUMN_ALIGNMENT_WEIGHT: f32 = 0.3;

/// Weight of the row-structure algorithm in the table vote.
pub const ROW_STRUCTURE_WEIGHT: f32 = 0.2;

/// Column-alignment confidence cap.
pub const COLUMN_ALIGNMENT_CAP: f32 = 0.9;

/// Coefficient of variation at which row regularity reaches zero.
pub const ROW_CV_MAX: f32 = 0.5;

/// Average characters per line above which rows look like prose.
pub const ROW_LONG_LINE_CHARS: f32 = 60.0;

/// Average characters per line above which rows get a mild penalty.
pub const ROW_MEDIUM_LINE_CHARS: f32 = 30.0;

/// Minimum list confidence for the List rule.
pub const LIST_MIN_CONFIDENCE: f32 = 0.5;

/// List confidence that wins regardless of paragraph confidence.
pub const LIST_STRONG_CONFIDENCE: f32 = 0.7;

/// How far below paragraph confidence a list may be and still win.
pub const LIST_PARAGRAPH_MARGIN: f32 = 0.15;

/// Heading confidence floor applied to list headings.
pub const LIST_HEADING_CONFIDENCE_FLOOR: f32 = 0.75;

/// Boosted list-heading confidence needed to force a heading.
pub const LIST_HEADING_MIN_CONFIDENCE: f32 = 0.6;

/// Band within which heading and paragraph confidences count as a tie.
pub const CONFIDENCE_GAP_BAND: f32 = 0.15;

/// Heading confidence that is "non-trivial" inside the tie band.
pub const HEADING_NONTRIVIAL_CONFIDENCE: f32 = 0.4;

/// Font ratio that is "slightly larger" than the base font.
pub const SLIGHTLY_LARGER_FONT_RATIO: f32 = 1.05;

/// Font ratio that is "markedly larger" than the base font.
pub const MARKEDLY_LARGER_FONT_RATIO: f32 = 1.2;

/// Confidence assigned when classification or decision fails.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Indentation per nesting level (× base font size).
pub const LIST_INDENT_RATIO: f32 = 0.15;

/// Minimum indentation per nesting level (points).
pub const LIST_INDENT_MIN: f32 = 10.0;

/// Deepest list nesting level.
pub const LIST_MAX_LEVEL: u8 = 5;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Maximum average cell length for a merged table (characters).
pub const TABLE_MAX_AVG_CELL_CHARS: f32 = 30.0;

/// Maximum single cell length for a merged table (characters).
pub const TABLE_MAX_CELL_CHARS: usize = 80;

/// Cells at or below this length are "short".
pub const TABLE_SHORT_CELL_CHARS: usize = 20;

/// Minimum share of short cells in a merged table.
pub const TABLE_MIN_SHORT_CELL_RATIO: f32 = 0.6;

/// Relaxed average cell length when borders are present.
pub const TABLE_RELAXED_AVG_CELL_CHARS: f32 = 60.0;

/// Relaxed single cell length when borders are present.
pub const TABLE_RELAXED_MAX_CELL_CHARS: usize = 200;

/// Table confidence a merged candidate must reach without borders.
pub const TABLE_MERGE_MIN_CONFIDENCE: f32 = 0.5;

/// Table confidence a merged candidate must reach with borders.
pub const TABLE_MERGE_RELAXED_CONFIDENCE: f32 = 0.3;

/// Minimum horizontal + vertical border lines near a table.
pub const TABLE_MIN_BORDER_LINES: usize = 3;

/// Margin around a table area when looking for border lines (points).
pub const TABLE_BORDER_MARGIN: f32 = 6.0;

/// Share of bold text that makes the first row a header.
pub const HEADER_BOLD_RATIO: f32 = 0.5;

/// Words that mark a header row.
pub const HEADER_KEYWORDS: &[&str] = &[
    "name",
    "type",
    "description",
    "value",
    "total",
    "date",
    "id",
    "no.",
    "qty",
    "quantity",
    "price",
    "amount",
    "item",
    "status",
    "version",
    "parameter",
    "default",
];

// ---------------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------------

/// Floor for the thickness under which a segment is a straight border.
pub const LINE_THICKNESS_MIN: f32 = 2.0;

/// Thickness threshold relative to the base font size.
pub const LINE_THICKNESS_RATIO: f32 = 0.25;

/// Floor for the length over which a segment is a border.
pub const LINE_LENGTH_MIN: f32 = 20.0;

/// Length threshold relative to the base font size.
pub const LINE_LENGTH_RATIO: f32 = 2.0;

/// Margin outside the page still considered plausible (points).
pub const PAGE_PLAUSIBLE_MARGIN: f32 = 20.0;

/// Maximum distance of an underline below the baseline (× font size).
pub const UNDERLINE_MAX_OFFSET_RATIO: f32 = 0.4;

/// Share of a line's width an underline must cover.
pub const UNDERLINE_MIN_COVERAGE: f32 = 0.6;

/// Rules longer than this multiple of the line width are separators, not underlines.
pub const UNDERLINE_MAX_LENGTH_RATIO: f32 = 1.5;

/// Options for layout reconstruction.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to process)
    pub pages: PageSelection,

    /// Base font size override; detected from the document when `None`
    pub base_font_size: Option<f32>,

    /// Whether to replay vector graphics for border and underline evidence
    pub use_graphics: bool,

    /// Whether to detect tables
    pub detect_tables: bool,

    /// Whether to split and group lists
    pub detect_lists: bool,

    /// Column tolerance multiplier (× base font size)
    pub column_tolerance_multiplier: f32,

    /// Row tolerance multiplier (× base font size)
    pub row_tolerance_multiplier: f32,

    /// Combined confidence needed to call a block a table
    pub table_min_confidence: f32,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Override the detected base font size.
    pub fn with_base_font_size(mut self, size: f32) -> Self {
        self.base_font_size = Some(size);
        self
    }

    /// Enable or disable graphics evidence.
    pub fn with_graphics(mut self, use_graphics: bool) -> Self {
        self.use_graphics = use_graphics;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }

    /// Enable or disable list splitting and grouping.
    pub fn with_lists(mut self, detect: bool) -> Self {
        self.detect_lists = detect;
        self
    }

    /// Set the column tolerance multiplier.
    pub fn with_column_tolerance(mut self, multiplier: f32) -> Self {
        self.column_tolerance_multiplier = multiplier;
        self
    }

    /// Set the row tolerance multiplier.
    pub fn with_row_tolerance(mut self, multiplier: f32) -> Self {
        self.row_tolerance_multiplier = multiplier;
        self
    }

    /// Set the table confidence threshold.
    pub fn with_table_min_confidence(mut self, confidence: f32) -> Self {
        self.table_min_confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            pages: PageSelection::All,
            base_font_size: None,
            use_graphics: true,
            detect_tables: true,
            detect_lists: true,
            column_tolerance_multiplier: COLUMN_TOLERANCE_MULTIPLIER,
            row_tolerance_multiplier: ROW_TOLERANCE_MULTIPLIER,
            table_min_confidence: TABLE_MIN_CONFIDENCE,
        }
    }
}

/// Page selection for processing.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Process all pages
    #[default]
    All,
    /// Process a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Process specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| invalid())?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}

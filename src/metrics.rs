//! Document-wide metrics shared by every page task.
//!
//! [`Metrics`] is built once per document from font statistics, then shared
//! by reference across pages. The only state written during page processing
//! is the page-keyed graphics and gap-analysis maps, each entry written once
//! by the page that owns it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::{
    LayoutOptions, CELL_TOLERANCE_MULTIPLIER, COLUMN_TOLERANCE_MULTIPLIER, DEFAULT_BASE_FONT_SIZE,
    ROW_TOLERANCE_MULTIPLIER, TABLE_MIN_CONFIDENCE, TABLE_ROW_GAP_MULTIPLIER,
    Y_KEY_TOLERANCE_MULTIPLIER,
};
use crate::layout::gaps::GapAnalysis;
use crate::model::{font_style, GraphicsData, PageInput};

/// Font statistics for heading detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontStatistics {
    /// Body text font size (most common by character count)
    pub body_size: f32,
    /// Font sizes larger than body (potential headings), largest first
    pub heading_sizes: Vec<f32>,
    /// Character count per font size, in 0.1pt buckets
    pub size_histogram: HashMap<i32, usize>,
    /// Text items set in a bold font
    pub bold_items: usize,
    /// All text items
    pub total_items: usize,
}

impl FontStatistics {
    /// Add a font size observation weighted by character count.
    pub fn add_sample(&mut self, size: f32, chars: usize, bold: bool) {
        if !size.is_finite() || size <= 0.0 || chars == 0 {
            return;
        }
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += chars;
        self.total_items += 1;
        if bold {
            self.bold_items += 1;
        }
    }

    /// Calculate body size and heading sizes.
    pub fn analyze(&mut self) {
        if self.size_histogram.is_empty() {
            self.body_size = DEFAULT_BASE_FONT_SIZE;
            self.heading_sizes.clear();
            return;
        }

        // Most characters wins; ties go to the smaller size.
        let body_key = self
            .size_histogram
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
            .map(|(key, _)| *key)
            .unwrap_or((DEFAULT_BASE_FONT_SIZE * 10.0) as i32);
        self.body_size = body_key as f32 / 10.0;

        let mut larger_sizes: Vec<f32> = self
            .size_histogram
            .keys()
            .map(|k| *k as f32 / 10.0)
            .filter(|size| *size > self.body_size + 0.5)
            .collect();
        larger_sizes.sort_by(|a, b| b.total_cmp(a));
        self.heading_sizes = larger_sizes;
    }

    /// Heading level (1-6) for a font size.
    ///
    /// Sizes on the heading ladder map to their rank; anything else sits
    /// one level below the smallest ladder entry.
    pub fn heading_level(&self, font_size: f32) -> u8 {
        for (i, &heading_size) in self.heading_sizes.iter().enumerate() {
            if font_size >= heading_size - 0.5 {
                return (i + 1).min(6) as u8;
            }
        }
        (self.heading_sizes.len() + 1).min(6) as u8
    }

    /// Derive the document structure summary.
    pub fn structure(&self) -> DocumentStructure {
        let homogeneous = self.heading_sizes.is_empty();
        let some_bold = self.bold_items > 0 && self.bold_items * 2 < self.total_items;
        DocumentStructure {
            homogeneous,
            likely_has_headings: !homogeneous || some_bold,
            distinct_sizes: self.size_histogram.len(),
        }
    }
}

/// Document-level structure context used by the classifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// No font size noticeably larger than body text
    pub homogeneous: bool,
    /// Size or weight variation suggests headings exist
    pub likely_has_headings: bool,
    /// Number of distinct font sizes
    pub distinct_sizes: usize,
}

impl DocumentStructure {
    /// Uniform typography with no sign of headings.
    pub fn is_flat(&self) -> bool {
        self.homogeneous && !self.likely_has_headings
    }
}

/// Shared per-document context.
#[derive(Debug)]
pub struct Metrics {
    base_font_size: f32,
    font_stats: FontStatistics,
    structure: DocumentStructure,
    column_tolerance_multiplier: f32,
    row_tolerance_multiplier: f32,
    table_min_confidence: f32,
    graphics: RwLock<HashMap<u32, Arc<GraphicsData>>>,
    gaps: RwLock<HashMap<u32, Arc<GapAnalysis>>>,
}

impl Metrics {
    /// Metrics with a fixed base font size and no statistics.
    ///
    /// Without statistics nothing is known about the typography, so the
    /// structure does not suppress headings.
    pub fn new(base_font_size: f32) -> Self {
        let mut font_stats = FontStatistics::default();
        font_stats.analyze();
        font_stats.body_size = base_font_size;
        Self::from_statistics(font_stats).with_structure(DocumentStructure {
            homogeneous: false,
            likely_has_headings: true,
            distinct_sizes: 0,
        })
    }

    /// Metrics from analyzed font statistics.
    pub fn from_statistics(font_stats: FontStatistics) -> Self {
        let base_font_size = if font_stats.body_size.is_finite() && font_stats.body_size > 0.0 {
            font_stats.body_size
        } else {
            DEFAULT_BASE_FONT_SIZE
        };
        let structure = font_stats.structure();
        Self {
            base_font_size,
            font_stats,
            structure,
            column_tolerance_multiplier: COLUMN_TOLERANCE_MULTIPLIER,
            row_tolerance_multiplier: ROW_TOLERANCE_MULTIPLIER,
            table_min_confidence: TABLE_MIN_CONFIDENCE,
            graphics: RwLock::new(HashMap::new()),
            gaps: RwLock::new(HashMap::new()),
        }
    }

    /// Collect font statistics over every text item of the document.
    pub fn from_pages(pages: &[PageInput]) -> Self {
        let mut stats = FontStatistics::default();
        for page in pages {
            let scale = page.viewport.matrix().scale_factor();
            for item in &page.text_items {
                let (bold, _) = font_style(&item.font_name);
                stats.add_sample(item.font_size * scale, item.text.trim().chars().count(), bold);
            }
        }
        stats.analyze();
        log::debug!(
            "Font statistics: body={:.1}pt, heading sizes={:?}",
            stats.body_size,
            stats.heading_sizes
        );
        Self::from_statistics(stats)
    }

    /// Override the document structure summary.
    pub fn with_structure(mut self, structure: DocumentStructure) -> Self {
        self.structure = structure;
        self
    }

    /// Apply the tunables carried by layout options.
    pub fn with_options(mut self, options: &LayoutOptions) -> Self {
        if let Some(size) = options.base_font_size.filter(|s| s.is_finite() && *s > 0.0) {
            self.base_font_size = size;
        }
        self.column_tolerance_multiplier = options.column_tolerance_multiplier;
        self.row_tolerance_multiplier = options.row_tolerance_multiplier;
        self.table_min_confidence = options.table_min_confidence;
        self
    }

    /// Base font size used to scale every tolerance.
    pub fn base_font_size(&self) -> f32 {
        self.base_font_size
    }

    /// Font statistics.
    pub fn font_stats(&self) -> &FontStatistics {
        &self.font_stats
    }

    /// Document structure summary.
    pub fn structure(&self) -> DocumentStructure {
        self.structure
    }

    /// Tolerance for clustering X positions into columns.
    pub fn column_tolerance(&self) -> f32 {
        self.base_font_size * self.column_tolerance_multiplier
    }

    /// Tolerance for clustering Y positions into rows.
    pub fn row_tolerance(&self) -> f32 {
        self.base_font_size * self.row_tolerance_multiplier
    }

    /// Tolerance for assigning items to table cells.
    pub fn cell_tolerance(&self) -> f32 {
        self.base_font_size * CELL_TOLERANCE_MULTIPLIER
    }

    /// Rounding step for normalized Y keys.
    pub fn y_key_tolerance(&self) -> f32 {
        self.base_font_size * Y_KEY_TOLERANCE_MULTIPLIER
    }

    /// Largest vertical gap between consecutive rows of one table.
    pub fn row_gap_tolerance(&self) -> f32 {
        self.base_font_size * TABLE_ROW_GAP_MULTIPLIER
    }

    /// Minimum combined confidence for a table verdict.
    pub fn table_min_confidence(&self) -> f32 {
        self.table_min_confidence
    }

    /// Record graphics evidence for a page.
    pub fn set_graphics(&self, page: u32, data: GraphicsData) -> Arc<GraphicsData> {
        let data = Arc::new(data);
        self.graphics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page, Arc::clone(&data));
        data
    }

    /// Graphics evidence for a page, if extracted.
    pub fn graphics(&self, page: u32) -> Option<Arc<GraphicsData>> {
        self.graphics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&page)
            .cloned()
    }

    /// Record the gap analysis of a page.
    pub fn set_gap_analysis(&self, page: u32, analysis: GapAnalysis) -> Arc<GapAnalysis> {
        let analysis = Arc::new(analysis);
        self.gaps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page, Arc::clone(&analysis));
        analysis
    }

    /// Gap analysis of a page, if computed.
    pub fn gap_analysis(&self, page: u32) -> Option<Arc<GapAnalysis>> {
        self.gaps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&page)
            .cloned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_FONT_SIZE)
    }
}

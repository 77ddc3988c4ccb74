//! Classifier outputs.
//!
//! Every classifier returns a [`ClassificationResult`]: which algorithm
//! produced it, a confidence in `[0, 1]`, a typed [`Classification`] payload
//! and a free-form detail map for diagnostics.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The algorithm that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Heading classifier
    Heading,
    /// Paragraph classifier
    Paragraph,
    /// List classifier
    List,
    /// Combined table vote
    Table,
    /// Table sub-algorithm: X/Y grid clustering
    GridPattern,
    /// Table sub-algorithm: line-start alignment
    ColumnAlignment,
    /// Table sub-algorithm: row gap regularity
    RowStructure,
}

impl Algorithm {
    /// Stable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Heading => "heading",
            Algorithm::Paragraph => "paragraph",
            Algorithm::List => "list",
            Algorithm::Table => "table",
            Algorithm::GridPattern => "grid-pattern",
            Algorithm::ColumnAlignment => "column-alignment",
            Algorithm::RowStructure => "row-structure",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style of a list marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// •, -, *, ...
    #[default]
    Bullet,
    /// 1, 2, 3, ...
    Decimal,
    /// a, b, c, ...
    LowerAlpha,
    /// A, B, C, ...
    UpperAlpha,
    /// i, ii, iii, ...
    LowerRoman,
    /// I, II, III, ...
    UpperRoman,
}

/// A list marker found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMarker {
    /// The marker as written (e.g. "•", "3.", "b)")
    pub glyph: String,
    /// Marker style
    pub style: MarkerStyle,
}

impl ListMarker {
    /// A bullet marker.
    pub fn bullet(glyph: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
            style: MarkerStyle::Bullet,
        }
    }

    /// A numbered/lettered marker.
    pub fn numbered(glyph: impl Into<String>, style: MarkerStyle) -> Self {
        Self {
            glyph: glyph.into(),
            style,
        }
    }

    /// Whether the marker belongs to an ordered list.
    pub fn is_ordered(&self) -> bool {
        self.style != MarkerStyle::Bullet
    }
}

/// Typed payload of a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// Heading candidate
    Heading {
        /// Proposed level (1-6)
        level: u8,
        /// Promoted in a document with uniform font sizes
        implicit: bool,
    },
    /// Paragraph candidate
    Paragraph {
        /// Text exceeded the very-long threshold
        very_long: bool,
    },
    /// List candidate
    List {
        /// Ordered list
        ordered: bool,
        /// Leading marker, if any
        marker: Option<ListMarker>,
        /// Indentation-based nesting hint
        nesting_hint: u8,
    },
    /// Table candidate
    Table {
        /// Combined confidence cleared the table threshold
        is_table: bool,
        /// Detected column count
        columns: usize,
        /// Detected row count
        rows: usize,
        /// Border lines were found around the block
        has_borders: bool,
        /// Per sub-algorithm results
        sub_results: Vec<ClassificationResult>,
    },
}

/// A classifier's verdict on one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Producing algorithm
    pub algorithm: Algorithm,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Typed payload
    pub classification: Classification,
    /// Free-form diagnostics
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ClassificationResult {
    /// Create a result. Confidence must already lie in `[0, 1]`.
    pub fn new(algorithm: Algorithm, confidence: f32, classification: Classification) -> Self {
        debug_assert!(
            (-1e-4..=1.0 + 1e-4).contains(&confidence),
            "{algorithm} confidence out of range: {confidence}"
        );
        Self {
            algorithm,
            confidence: confidence.clamp(0.0, 1.0),
            classification,
            details: BTreeMap::new(),
        }
    }

    /// Attach a diagnostic value.
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Whether a table result cleared the table threshold.
    pub fn is_table(&self) -> bool {
        matches!(
            self.classification,
            Classification::Table { is_table: true, .. }
        )
    }

    /// Sub-results of a table result.
    pub fn sub_results(&self) -> &[ClassificationResult] {
        match &self.classification {
            Classification::Table { sub_results, .. } => sub_results,
            _ => &[],
        }
    }
}

/// Final element type of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// Heading
    Heading,
    /// Paragraph
    Paragraph,
    /// List (item)
    List,
    /// Table
    Table,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Heading => "heading",
            ElementType::Paragraph => "paragraph",
            ElementType::List => "list",
            ElementType::Table => "table",
        };
        f.write_str(name)
    }
}

/// The decider's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Chosen type
    pub element_type: ElementType,
    /// Confidence of the choice
    pub confidence: f32,
    /// Which rule fired
    pub reason: String,
}

impl Decision {
    /// Create a decision.
    pub fn new(element_type: ElementType, confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            element_type,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    /// The fallback for blocks that could not be classified.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::new(
            ElementType::Paragraph,
            crate::config::FALLBACK_CONFIDENCE,
            reason,
        )
    }
}

/// All four classifier outputs for a block plus the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockClassification {
    /// Heading classifier result
    pub heading: ClassificationResult,
    /// Paragraph classifier result
    pub paragraph: ClassificationResult,
    /// List classifier result
    pub list: ClassificationResult,
    /// Table classifier result
    pub table: ClassificationResult,
    /// Final decision
    pub decision: Decision,
}

impl BlockClassification {
    /// All four results, in heading/paragraph/list/table order.
    pub fn results(&self) -> [&ClassificationResult; 4] {
        [&self.heading, &self.paragraph, &self.list, &self.table]
    }
}

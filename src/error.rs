//! Error types for pagestruct library.

use std::io;
use thiserror::Error;

/// Result type alias for pagestruct operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction.
///
/// Most of these never reach the caller: every pipeline stage catches its
/// own failures and degrades (skip the operator, fall back to a paragraph,
/// drop graphics evidence, return an empty page).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A graphics operator could not be decoded.
    #[error("Invalid operator '{op}': {reason}")]
    InvalidOperator {
        /// Operator name as supplied by the decoder
        op: String,
        /// What was wrong with it
        reason: String,
    },

    /// A graphics operator is missing a required operand.
    #[error("Operator '{op}' is missing operand {index}")]
    MissingOperand {
        /// Operator name
        op: String,
        /// Zero-based operand index
        index: usize,
    },

    /// A transformation matrix has no inverse.
    #[error("Transformation matrix is not invertible")]
    SingularMatrix,

    /// A text item carries unusable geometry or no text.
    #[error("Invalid text item on page {page}: {reason}")]
    InvalidTextItem {
        /// 1-indexed page number
        page: u32,
        /// What was wrong with it
        reason: String,
    },

    /// A block has no lines or no text to classify.
    #[error("Cannot classify an empty block")]
    EmptyBlock,

    /// Processing a page failed.
    #[error("Page {page}: {message}")]
    Page {
        /// 1-indexed page number
        page: u32,
        /// Failure description
        message: String,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Processing was cancelled before the page started.
    #[error("Processing cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidOperator`].
    pub fn invalid_operator(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidOperator {
            op: op.into(),
            reason: reason.into(),
        }
    }
}

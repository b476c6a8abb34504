//! Error types shared by the canvas, preprocessing filters and renderers.
//!
//! Every error is raised synchronously at the call that violates a
//! precondition. None of them describe transient conditions, so callers
//! should not retry.

use std::path::PathBuf;

/// Errors produced by dapple operations.
#[derive(Debug, thiserror::Error)]
pub enum DappleError {
    /// Color array (or raw data) does not match the bitmap shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// A region does not lie inside the bitmap.
    #[error(
        "region ({x1}, {y1}, {x2}, {y2}) out of bounds for canvas of size {width}x{height}"
    )]
    OutOfBounds {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
        width: usize,
        height: usize,
    },

    /// Two operands disagree on the dimension they are joined along.
    #[error("{dimension} must match: {left} vs {right}")]
    DimensionMismatch {
        dimension: &'static str,
        left: usize,
        right: usize,
    },

    /// A configuration value is outside its valid domain.
    #[error("unsupported {option}: {value}")]
    UnsupportedOption { option: &'static str, value: String },

    /// A font file could not be read or parsed.
    #[error("failed to load font '{}': {message}", path.display())]
    FontLoad { path: PathBuf, message: String },

    /// Fewer than two glyphs of the selected set could be rendered.
    #[error("no glyphs available for glyph set '{glyph_set}'")]
    NoGlyphs { glyph_set: &'static str },

    /// Writing to the output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DappleError {
    pub(crate) fn unsupported(option: &'static str, value: impl ToString) -> Self {
        DappleError::UnsupportedOption {
            option,
            value: value.to_string(),
        }
    }
}

/// Result alias for dapple operations.
pub type Result<T> = std::result::Result<T, DappleError>;

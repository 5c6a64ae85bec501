//! Error types for qhist-core.

use thiserror::Error;

/// Result type alias for qhist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for qhist operations.
///
/// Every variant is a construction-time failure. Events or cells that fall
/// outside a histogram are dropped silently and never produce an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bin boundaries are missing, NaN or not strictly ascending.
    #[error("invalid bin boundaries: {0}")]
    InvalidBoundaries(String),

    /// Projection direction is zero or not finite.
    #[error("invalid projection direction: ({x}, {y}, {z})")]
    InvalidDirection { x: f64, y: f64, z: f64 },

    /// The three axis directions are linearly dependent.
    #[error("axis directions are linearly dependent (relative determinant {determinant:e})")]
    SingularBasis { determinant: f64 },

    /// Parallel coordinate arrays of an event list disagree in length.
    #[error("event list length mismatch: {codes} codes but {coords} coordinates")]
    LengthMismatch { codes: usize, coords: usize },

    /// Page ranges do not tile the histogram exactly once.
    #[error("invalid page partition: {0}")]
    InvalidPartition(String),

    /// Histogram dimensions whose cell buffer cannot be addressed.
    #[error("histogram of {pages}x{rows}x{cols} cells is too large")]
    HistogramTooLarge {
        pages: usize,
        rows: usize,
        cols: usize,
    },

    /// Histogram configuration rejected, e.g. zero segments.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

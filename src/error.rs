//! Buffer Errors
//!
//! Only two error classes are produced by the proxy itself: construction
//! failures reported by the native runtime, and dimension indices rejected
//! before they reach it. Release never fails.

use std::fmt;

use thiserror::Error;

/// Which per-dimension query was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionQuery {
    Min,
    Extent,
    Stride,
}

impl fmt::Display for DimensionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionQuery::Min => write!(f, "min"),
            DimensionQuery::Extent => write!(f, "extent"),
            DimensionQuery::Stride => write!(f, "stride"),
        }
    }
}

/// Error type for buffer operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The native runtime refused the element type / shape combination
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// Dimension index outside `[0, dimensions)`
    #[error(
        "Attempted to access {query} {index} on a buffer with {dimensions} dimensions \
         (index {index}, dimensions {dimensions})"
    )]
    DimensionOutOfBounds {
        query: DimensionQuery,
        index: usize,
        dimensions: usize,
    },

    /// Loading the native library or resolving one of its entry points failed
    #[error("Native library error: {0}")]
    Library(String),

    /// An element type name could not be parsed
    #[error("Invalid element type: {0}")]
    InvalidElementType(String),
}

/// Result alias used throughout the crate
pub type BufferResult<T> = Result<T, BufferError>;

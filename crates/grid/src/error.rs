//! Grid and carrier errors.

pub type Result<T> = std::result::Result<T, GridError>;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Grids support one to three space axes.
    #[error("unsupported grid rank {0} (expected 1 to 3)")]
    UnsupportedRank(usize),

    /// Stepping dimensions must derive from a time dimension.
    #[error("dimension `{dimension}` cannot step over non-time parent `{parent}`")]
    InvalidParent { dimension: String, parent: String },

    /// Restored bytes do not match the carrier's storage size.
    #[error("buffer byte length mismatch: expected {expected}, got {actual}")]
    ByteLengthMismatch { expected: usize, actual: usize },

    /// Coordinate slice length does not cover every point.
    #[error("coordinate count mismatch: expected {expected} values, got {actual}")]
    CoordinateCount { expected: usize, actual: usize },

    /// Grid reconstruction with inconsistent parts.
    #[error("grid has {dims} dimensions for {axes} shape axes")]
    DimensionCount { dims: usize, axes: usize },
}

//! Error types for rasterization

use thiserror::Error;

/// Rasterization error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("scanline storage could not reserve {requested} bytes")]
    StorageAllocation { requested: usize },

    #[error("pixel data holds {actual} values, expected {expected}")]
    DataSize { expected: usize, actual: usize },
}

/// Result type for raster operations
pub type Result<T> = std::result::Result<T, RasterError>;

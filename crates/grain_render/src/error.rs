//! Error types for the renderer

use grain_core::ShapeError;
use grain_raster::RasterError;
use thiserror::Error;

/// Largest accepted canvas side, exclusive
pub const MAX_DIMENSION: u32 = 1 << 16;

/// Renderer error
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(
        "image size of {width}x{height} pixels is too large. It must be less than 2^16 in each direction"
    )]
    ImageTooLarge { width: u32, height: u32 },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("failed to parse renderer config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize renderer config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, RenderError>;

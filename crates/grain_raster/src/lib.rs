//! Grain Raster
//!
//! CPU scanline rasterization with analytic anti-aliasing.
//!
//! The flow for one fill is:
//!
//! 1. Feed flattened geometry into a [`Rasterizer`]
//! 2. [`Rasterizer::sweep`] computes per-scanline coverage and hands each run
//!    of covered pixels to a [`SpanSink`]
//! 3. The sink is either a scanline renderer ([`SolidRenderer`],
//!    [`SpanRenderer`]) blending into a [`PixelBuffer`], an [`AlphaMask`], or a
//!    [`ScanlineStorage`] that records spans for later replay
//!
//! # Example
//!
//! ```rust
//! use grain_core::Path;
//! use grain_raster::{PixelBuffer, Rasterizer, Rgba8, SolidRenderer};
//!
//! let mut buffer = PixelBuffer::new(10, 10);
//! let mut rasterizer = Rasterizer::new();
//! rasterizer.add_path(&mut Path::rectangle(2.0, 2.0, 8.0, 8.0).iter());
//!
//! let clip = buffer.bounds();
//! let mut renderer = SolidRenderer::new(&mut buffer, Rgba8::new(255, 0, 0, 255), clip);
//! rasterizer.sweep(&mut renderer);
//!
//! assert_eq!(buffer.pixel(5, 5), Some(Rgba8::new(255, 0, 0, 255)));
//! ```

pub mod error;
pub mod mask;
pub mod pixel;
pub mod rasterizer;
pub mod renderer;
pub mod scanline;
pub mod span;

pub use error::{RasterError, Result};
pub use mask::AlphaMask;
pub use pixel::{PixelBuffer, Rgba8};
pub use rasterizer::{Coverage, FillRule, Rasterizer, SpanSink};
pub use renderer::{SolidRenderer, SpanRenderer};
pub use scanline::ScanlineStorage;
pub use span::{GouraudSpan, ImageSpan, Interpolation, PatternSpan, SpanGenerator, StencilSpan};

//! Grain Renderer
//!
//! An RGBA canvas that draws vector paths, markers, images, text bitmaps,
//! path collections, quad meshes and Gouraud triangles with anti-aliasing.
//!
//! Coordinates passed to draw calls are display coordinates: origin at the
//! bottom-left, y up, in pixels. The canvas stores rows top to bottom, so
//! every call appends a vertical flip before rasterizing. Stroke widths and
//! dash lengths are in points and scale with the canvas dpi.
//!
//! # Example
//!
//! ```rust
//! use grain_core::{Affine, Color, Path};
//! use grain_render::{GraphicsContext, Renderer};
//!
//! let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
//! let square = Path::rectangle(2.0, 2.0, 8.0, 8.0);
//! let gc = GraphicsContext::new().with_line_width(0.0);
//!
//! renderer
//!     .draw_path(&gc, &square, &Affine::IDENTITY, Some(Color::RED))
//!     .unwrap();
//!
//! let center = renderer.pixel(5, 5).unwrap();
//! assert_eq!((center.r, center.a), (255, 255));
//! assert_eq!(renderer.pixel(0, 0).unwrap().a, 0);
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod gc;
pub mod gouraud;
pub mod image;
pub mod region;
pub mod renderer;

pub use collection::{OffsetPosition, PathCollection, QuadMesh, QuadMeshCell, QuadMeshCells};
pub use config::RendererConfig;
pub use error::{RenderError, Result, MAX_DIMENSION};
pub use gc::{ClipPath, Dashes, GraphicsContext, Hatch};
pub use region::BufferRegion;
pub use renderer::Renderer;

pub use grain_path::{LineCap, LineJoin, SketchParams, SnapMode};
pub use grain_raster::{Interpolation, Rgba8};

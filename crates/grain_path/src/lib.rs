//! Grain Path Pipeline
//!
//! Lazy [`PathSource`](grain_core::PathSource) adaptors that prepare raw
//! path geometry for the rasterizer. Each stage wraps the previous one and is
//! itself a source, so a chain is walked one vertex at a time and can be
//! rewound to walk it again (once for the fill, once for the stroke).
//!
//! # Stages
//!
//! Applied in this order by [`path_pipeline`]:
//!
//! 1. [`TransformedPath`] - affine transform
//! 2. [`NanRemover`] - non-finite vertices become pen-up breaks
//! 3. [`PathClipper`] - coarse line clipping against the canvas
//! 4. [`PathSnapper`] - pixel-center snapping of rectilinear paths
//! 5. [`PathSimplifier`] - collapse of nearly collinear runs
//! 6. [`CurveFlattener`] - Bézier subdivision into line segments
//! 7. [`Sketch`] - hand-drawn wobble
//!
//! The outline generators [`Dasher`] and [`Stroker`] sit after the pipeline
//! when a path is stroked.

pub mod clip;
pub mod curve;
pub mod dash;
pub mod nan;
pub mod pipeline;
pub mod simplify;
pub mod sketch;
pub mod snap;
pub mod stroke;
pub mod transform;

pub use clip::PathClipper;
pub use curve::{CurveFlattener, DEFAULT_CURVE_TOLERANCE};
pub use dash::{DashPattern, Dasher};
pub use nan::NanRemover;
pub use pipeline::{path_pipeline, PathPipeline, PipelineOptions};
pub use simplify::PathSimplifier;
pub use sketch::{Sketch, SketchParams};
pub use snap::{PathSnapper, SnapMode, DEFAULT_SNAP_MAX_VERTICES};
pub use stroke::{LineCap, LineJoin, StrokeStyle, Stroker, DEFAULT_MITER_LIMIT};
pub use transform::TransformedPath;

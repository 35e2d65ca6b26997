//! Stage composition
//!
//! Every draw call runs the same chain of stages; a call that does not need a
//! stage builds it disabled, so all variants share one concrete type.

use grain_core::{Affine, Path, PathSource};

use crate::clip::PathClipper;
use crate::curve::{CurveFlattener, DEFAULT_CURVE_TOLERANCE};
use crate::nan::NanRemover;
use crate::simplify::PathSimplifier;
use crate::sketch::{Sketch, SketchParams};
use crate::snap::{PathSnapper, SnapMode, DEFAULT_SNAP_MAX_VERTICES};
use crate::transform::TransformedPath;

/// Full pipeline type: transform, NaN removal, clip, snap, simplify, curve, sketch
pub type PathPipeline<S> =
    Sketch<CurveFlattener<PathSimplifier<PathSnapper<PathClipper<NanRemover<TransformedPath<S>>>>>>>;

/// Per-call stage configuration
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOptions {
    /// Canvas size, used by the clipper
    pub width: f64,
    pub height: f64,
    pub remove_nans: bool,
    pub clip: bool,
    pub snap_mode: SnapMode,
    pub snap_max_vertices: usize,
    /// Device stroke width, decides the snap offset
    pub stroke_width: f64,
    pub simplify: bool,
    pub simplify_threshold: f64,
    pub curve_tolerance: f64,
    pub sketch: Option<SketchParams>,
    pub sketch_segment_length: f64,
    /// Vertex count of the source path
    pub total_vertices: usize,
    /// Whether the source path contains Bézier segments
    pub has_curves: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            remove_nans: true,
            clip: false,
            snap_mode: SnapMode::Off,
            snap_max_vertices: DEFAULT_SNAP_MAX_VERTICES,
            stroke_width: 0.0,
            simplify: false,
            simplify_threshold: grain_core::path::DEFAULT_SIMPLIFY_THRESHOLD,
            curve_tolerance: DEFAULT_CURVE_TOLERANCE,
            sketch: None,
            sketch_segment_length: 1.0,
            total_vertices: 0,
            has_curves: false,
        }
    }
}

impl PipelineOptions {
    /// Options carrying the hints of `path` on a `width` x `height` canvas.
    pub fn for_path(path: &Path, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            total_vertices: path.total_vertices(),
            has_curves: path.has_curves(),
            simplify_threshold: path.simplify_threshold(),
            ..Self::default()
        }
    }
}

/// Build the full stage chain over `source`.
pub fn path_pipeline<S: PathSource>(
    source: S,
    transform: Affine,
    options: &PipelineOptions,
) -> PathPipeline<S> {
    let transformed = TransformedPath::new(source, transform);
    let nan_removed = NanRemover::new(transformed, options.remove_nans, options.has_curves);
    let clipped = PathClipper::new(
        nan_removed,
        options.clip && !options.has_curves,
        options.width,
        options.height,
    );
    let snapped = PathSnapper::with_limit(
        clipped,
        options.snap_mode,
        options.total_vertices,
        options.stroke_width,
        options.snap_max_vertices,
    );
    let simplified = PathSimplifier::new(
        snapped,
        options.simplify && !options.has_curves,
        options.simplify_threshold,
    );
    let curved = CurveFlattener::with_tolerance(simplified, options.curve_tolerance);
    let sketch = options.sketch.unwrap_or_default();
    Sketch::new(curved, sketch).with_segment_length(options.sketch_segment_length)
}

//! Pixel snapping
//!
//! Rounds vertices of rectilinear paths to pixel centers so that thin
//! axis-aligned strokes land on whole pixels instead of smearing over two.

use grain_core::{PathCommand, PathSource, Vertex};

/// Paths with more vertices than this never auto-snap
pub const DEFAULT_SNAP_MAX_VERTICES: usize = 1024;

/// Segments closer than this to axis-aligned count as rectilinear
const AXIS_EPSILON: f64 = 1e-4;

/// Snapping policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SnapMode {
    /// Snap only paths that look rectilinear
    #[default]
    Auto,
    On,
    Off,
}

/// Rounds vertex coordinates to pixel centers when snapping applies
#[derive(Clone, Debug)]
pub struct PathSnapper<S> {
    source: S,
    snap: bool,
    snap_value: f64,
}

impl<S: PathSource> PathSnapper<S> {
    pub fn new(source: S, mode: SnapMode, total_vertices: usize, stroke_width: f64) -> Self {
        Self::with_limit(source, mode, total_vertices, stroke_width, DEFAULT_SNAP_MAX_VERTICES)
    }

    /// `max_vertices` bounds the `Auto` heuristic.
    pub fn with_limit(
        mut source: S,
        mode: SnapMode,
        total_vertices: usize,
        stroke_width: f64,
        max_vertices: usize,
    ) -> Self {
        let snap = should_snap(&mut source, mode, total_vertices, max_vertices);
        let snap_value = if ((stroke_width + 0.5).floor() as i64) % 2 != 0 {
            0.5
        } else {
            0.0
        };
        tracing::trace!(?mode, total_vertices, snap, snap_value, "snap decision");
        Self {
            source,
            snap,
            snap_value,
        }
    }

    pub fn is_snapping(&self) -> bool {
        self.snap
    }
}

fn should_snap<S: PathSource>(
    source: &mut S,
    mode: SnapMode,
    total_vertices: usize,
    max_vertices: usize,
) -> bool {
    match mode {
        SnapMode::On => true,
        SnapMode::Off => false,
        SnapMode::Auto => {
            if total_vertices > max_vertices {
                return false;
            }

            source.rewind();
            let mut last: Option<(f64, f64)> = None;
            let mut rectilinear = true;
            while let Some(v) = source.next_vertex() {
                match v.cmd {
                    PathCommand::Curve3 | PathCommand::Curve4 => {
                        rectilinear = false;
                        break;
                    }
                    PathCommand::LineTo => {
                        if let Some((lx, ly)) = last {
                            if (v.x - lx).abs() >= AXIS_EPSILON && (v.y - ly).abs() >= AXIS_EPSILON {
                                rectilinear = false;
                                break;
                            }
                        }
                        last = Some((v.x, v.y));
                    }
                    PathCommand::MoveTo => last = Some((v.x, v.y)),
                    PathCommand::Close => {}
                }
            }
            source.rewind();
            rectilinear
        }
    }
}

impl<S: PathSource> PathSource for PathSnapper<S> {
    fn rewind(&mut self) {
        self.source.rewind();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        let mut v = self.source.next_vertex()?;
        if self.snap && v.cmd.is_vertex() {
            v.x = (v.x + 0.5).floor() + self.snap_value;
            v.y = (v.y + 0.5).floor() + self.snap_value;
        }
        Some(v)
    }
}

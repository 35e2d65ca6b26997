//! Non-finite vertex removal
//!
//! NaN and infinite coordinates are pen-up markers. A sub-path interrupted by
//! one resumes with a `MoveTo` at the next usable vertex, and its `Close` is
//! dropped since the start it refers to is no longer connected.

use grain_core::{PathCommand, PathSource, Vertex};
use smallvec::SmallVec;

/// Drops non-finite vertices so the rasterizer never sees them
///
/// Paths without curves are filtered per vertex. With curves, a whole segment
/// is dropped when any of its points is non-finite; drawing resumes at the
/// segment end if that end is finite.
#[derive(Clone, Debug)]
pub struct NanRemover<S> {
    source: S,
    enabled: bool,
    has_curves: bool,
    queue: SmallVec<[Vertex; 4]>,
    queue_pos: usize,
    needs_move: bool,
    broken: bool,
    subpath_valid: bool,
}

impl<S: PathSource> NanRemover<S> {
    pub fn new(source: S, enabled: bool, has_curves: bool) -> Self {
        Self {
            source,
            enabled,
            has_curves,
            queue: SmallVec::new(),
            queue_pos: 0,
            needs_move: false,
            broken: false,
            subpath_valid: false,
        }
    }

    fn reset_state(&mut self) {
        self.queue.clear();
        self.queue_pos = 0;
        self.needs_move = false;
        self.broken = false;
        self.subpath_valid = false;
    }

    fn next_polyline_vertex(&mut self) -> Option<Vertex> {
        loop {
            let v = self.source.next_vertex()?;

            if v.cmd == PathCommand::Close {
                if self.subpath_valid && !self.broken {
                    return Some(v);
                }
                continue;
            }

            if v.cmd == PathCommand::MoveTo {
                self.broken = false;
                self.subpath_valid = false;
            }

            if !v.is_finite() {
                self.needs_move = true;
                self.broken = true;
                continue;
            }

            self.subpath_valid = true;
            if self.needs_move {
                self.needs_move = false;
                return Some(Vertex::move_to(v.x, v.y));
            }
            return Some(v);
        }
    }

    /// Refill the queue with the next usable segment. Returns false at the end.
    fn fill_curve_queue(&mut self) -> bool {
        self.queue.clear();
        self.queue_pos = 0;

        loop {
            let Some(first) = self.source.next_vertex() else {
                return false;
            };

            if first.cmd == PathCommand::Close {
                if self.subpath_valid && !self.broken {
                    self.queue.push(first);
                    return true;
                }
                continue;
            }

            if first.cmd == PathCommand::MoveTo {
                self.broken = false;
                self.subpath_valid = false;
            }

            let extra = match first.cmd {
                PathCommand::Curve3 => 1,
                PathCommand::Curve4 => 2,
                _ => 0,
            };

            let mut segment: SmallVec<[Vertex; 3]> = SmallVec::new();
            segment.push(first);
            for _ in 0..extra {
                match self.source.next_vertex() {
                    Some(v) => segment.push(v),
                    None => return false,
                }
            }

            let end = segment[segment.len() - 1];

            if segment.iter().all(Vertex::is_finite) {
                self.subpath_valid = true;
                if self.needs_move && first.cmd != PathCommand::MoveTo {
                    // Start point lost; pick up the pen at the segment end.
                    self.queue.push(Vertex::move_to(end.x, end.y));
                } else {
                    self.queue.extend(segment);
                }
                self.needs_move = false;
                return true;
            }

            self.broken = true;
            if end.is_finite() {
                self.needs_move = false;
                self.subpath_valid = true;
                self.queue.push(Vertex::move_to(end.x, end.y));
                return true;
            }
            self.needs_move = true;
        }
    }
}

impl<S: PathSource> PathSource for NanRemover<S> {
    fn rewind(&mut self) {
        self.source.rewind();
        self.reset_state();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if !self.enabled {
            return self.source.next_vertex();
        }
        if !self.has_curves {
            return self.next_polyline_vertex();
        }

        if self.queue_pos >= self.queue.len() && !self.fill_curve_queue() {
            return None;
        }
        let v = self.queue[self.queue_pos];
        self.queue_pos += 1;
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::{collect_vertices, Path, Point};

    #[test]
    fn test_nan_midpoint_splits_subpath() {
        let path = Path::polyline(&[(0.0, 0.0), (1.0, 0.0), (f64::NAN, 5.0), (2.0, 2.0), (3.0, 2.0)]);
        let out = collect_vertices(&mut NanRemover::new(path.iter(), true, false));
        assert_eq!(
            out,
            vec![
                Vertex::move_to(0.0, 0.0),
                Vertex::line_to(1.0, 0.0),
                Vertex::move_to(2.0, 2.0),
                Vertex::line_to(3.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_broken_subpath_drops_close() {
        let path = Path::polygon(&[(0.0, 0.0), (4.0, 0.0), (f64::INFINITY, 0.0), (4.0, 4.0)]);
        let out = collect_vertices(&mut NanRemover::new(path.iter(), true, false));
        assert!(out.iter().all(|v| v.cmd != PathCommand::Close));
        assert_eq!(out[2], Vertex::move_to(4.0, 4.0));
    }

    #[test]
    fn test_intact_subpath_keeps_close() {
        let path = Path::rectangle(0.0, 0.0, 2.0, 2.0);
        let out = collect_vertices(&mut NanRemover::new(path.iter(), true, false));
        assert_eq!(out.last().map(|v| v.cmd), Some(PathCommand::Close));
    }

    #[test]
    fn test_curve_segment_with_nan_dropped() {
        let path = Path::builder()
            .move_to(0.0, 0.0)
            .quad_to(f64::NAN, 1.0, 2.0, 0.0)
            .line_to(3.0, 0.0)
            .build();
        let out = collect_vertices(&mut NanRemover::new(path.iter(), true, true));
        assert_eq!(
            out,
            vec![
                Vertex::move_to(0.0, 0.0),
                Vertex::move_to(2.0, 0.0),
                Vertex::line_to(3.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_disabled_passes_through() {
        let path = Path::new(vec![Point::new(f64::NAN, 0.0)]);
        let out = collect_vertices(&mut NanRemover::new(path.iter(), false, false));
        assert_eq!(out.len(), 1);
    }
}

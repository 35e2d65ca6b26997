//! Coarse line clipping
//!
//! Bounds coordinate magnitudes of stroke-only polylines before they reach the
//! rasterizer. Exact clipping happens later against the rasterizer clip box;
//! this stage only cuts segments against a slightly padded canvas rectangle.

use grain_core::{PathCommand, PathSource, Point, Rect, Vertex};
use smallvec::SmallVec;

/// Liang–Barsky clip of the segment `p0 -> p1` against `rect`.
///
/// Returns the visible part, or `None` when the segment misses the rectangle.
pub fn clip_line_segment(p0: Point, p1: Point, rect: &Rect) -> Option<(Point, Point)> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let edges = [
        (-dx, p0.x - rect.x1),
        (dx, rect.x2 - p0.x),
        (-dy, p0.y - rect.y1),
        (dy, rect.y2 - p0.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }

    let a = if t0 > 0.0 { p0.lerp(p1, t0) } else { p0 };
    let b = if t1 < 1.0 { p0.lerp(p1, t1) } else { p1 };
    Some((a, b))
}

/// Clips line segments against a rectangle, lifting the pen between visible
/// pieces
#[derive(Clone, Debug)]
pub struct PathClipper<S> {
    source: S,
    enabled: bool,
    rect: Rect,
    queue: SmallVec<[Vertex; 4]>,
    queue_pos: usize,
    last: Option<Point>,
    start: Point,
    pen: Option<Point>,
    subpath_clipped: bool,
}

impl<S: PathSource> PathClipper<S> {
    /// Clipper for a `width` x `height` canvas, padded by one pixel on each side.
    pub fn new(source: S, enabled: bool, width: f64, height: f64) -> Self {
        Self::with_rect(source, enabled, Rect::new(-1.0, -1.0, width + 1.0, height + 1.0))
    }

    pub fn with_rect(source: S, enabled: bool, rect: Rect) -> Self {
        Self {
            source,
            enabled,
            rect,
            queue: SmallVec::new(),
            queue_pos: 0,
            last: None,
            start: Point::ZERO,
            pen: None,
            subpath_clipped: false,
        }
    }

    /// Clip `last -> to` and queue the visible part.
    fn push_segment(&mut self, from: Point, to: Point) {
        match clip_line_segment(from, to, &self.rect) {
            None => {
                self.subpath_clipped = true;
                self.pen = None;
            }
            Some((a, b)) => {
                if a != from || b != to {
                    self.subpath_clipped = true;
                }
                if self.pen != Some(a) {
                    self.queue.push(Vertex::move_to(a.x, a.y));
                }
                self.queue.push(Vertex::line_to(b.x, b.y));
                self.pen = if b == to { Some(b) } else { None };
            }
        }
    }

    fn fill_queue(&mut self) -> bool {
        self.queue.clear();
        self.queue_pos = 0;

        while self.queue.is_empty() {
            let Some(v) = self.source.next_vertex() else {
                return false;
            };
            let p = v.point();

            match v.cmd {
                PathCommand::MoveTo => {
                    self.last = Some(p);
                    self.start = p;
                    self.pen = None;
                    self.subpath_clipped = false;
                }
                PathCommand::LineTo => match self.last {
                    None => {
                        self.last = Some(p);
                        self.start = p;
                    }
                    Some(from) => {
                        self.last = Some(p);
                        self.push_segment(from, p);
                    }
                },
                PathCommand::Close => {
                    if self.subpath_clipped {
                        if let Some(from) = self.last {
                            let start = self.start;
                            self.push_segment(from, start);
                        }
                    } else if self.pen.is_some() {
                        self.queue.push(v);
                    }
                    self.last = Some(self.start);
                    self.pen = None;
                }
                PathCommand::Curve3 | PathCommand::Curve4 => {
                    // Curves are never clipped; keep the pen where it is.
                    if self.pen.is_none() {
                        if let Some(from) = self.last {
                            self.queue.push(Vertex::move_to(from.x, from.y));
                        }
                    }
                    self.queue.push(v);
                    self.last = Some(p);
                    self.pen = Some(p);
                }
            }
        }
        true
    }
}

impl<S: PathSource> PathSource for PathClipper<S> {
    fn rewind(&mut self) {
        self.source.rewind();
        self.queue.clear();
        self.queue_pos = 0;
        self.last = None;
        self.pen = None;
        self.subpath_clipped = false;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if !self.enabled {
            return self.source.next_vertex();
        }
        if self.queue_pos >= self.queue.len() && !self.fill_queue() {
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
    use grain_core::{collect_vertices, Path};

    #[test]
    fn test_clip_line_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) = clip_line_segment(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), &rect).unwrap();
        assert_eq!(a, Point::new(0.0, 5.0));
        assert_eq!(b, Point::new(10.0, 5.0));
        assert!(clip_line_segment(Point::new(-5.0, -5.0), Point::new(-1.0, 20.0), &rect).is_none());
    }

    #[test]
    fn test_inside_path_unchanged() {
        let path = Path::polyline(&[(1.0, 1.0), (5.0, 1.0), (5.0, 5.0)]);
        let out = collect_vertices(&mut PathClipper::new(path.iter(), true, 10.0, 10.0));
        assert_eq!(
            out,
            vec![
                Vertex::move_to(1.0, 1.0),
                Vertex::line_to(5.0, 1.0),
                Vertex::line_to(5.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_reentry_lifts_pen() {
        let path = Path::polyline(&[(5.0, 5.0), (100.0, 5.0), (5.0, 6.0)]);
        let out = collect_vertices(&mut PathClipper::new(path.iter(), true, 10.0, 10.0));
        assert_eq!(out[0], Vertex::move_to(5.0, 5.0));
        assert_eq!(out[1].cmd, PathCommand::LineTo);
        assert!((out[1].x - 11.0).abs() < 1e-9);
        assert_eq!(out[2].cmd, PathCommand::MoveTo);
        assert_eq!(out[3], Vertex::line_to(5.0, 6.0));
        assert!(out.iter().all(|v| v.x <= 11.0 + 1e-9));
    }

    #[test]
    fn test_clipped_close_becomes_line() {
        let path = Path::polygon(&[(5.0, 5.0), (50.0, 5.0), (5.0, 8.0)]);
        let out = collect_vertices(&mut PathClipper::new(path.iter(), true, 10.0, 10.0));
        assert!(out.iter().all(|v| v.cmd != PathCommand::Close));
        assert_eq!(out.last(), Some(&Vertex::line_to(5.0, 5.0)));
    }
}

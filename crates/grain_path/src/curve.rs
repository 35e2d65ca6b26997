//! Bézier flattening by recursive subdivision

use grain_core::{PathCommand, PathSource, Point, Vertex};
use lyon::geom::{point, CubicBezierSegment, QuadraticBezierSegment};

/// Maximum control point distance from the chord, in device pixels
pub const DEFAULT_CURVE_TOLERANCE: f64 = 0.25;

const MAX_DEPTH: u32 = 32;

type GeomPoint = lyon::geom::Point<f64>;

fn to_geom(p: Point) -> GeomPoint {
    point(p.x, p.y)
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn distance_to_chord(p: GeomPoint, a: GeomPoint, b: GeomPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

fn flatten_quad(seg: &QuadraticBezierSegment<f64>, tolerance: f64, depth: u32, out: &mut Vec<Vertex>) {
    if depth >= MAX_DEPTH || distance_to_chord(seg.ctrl, seg.from, seg.to) <= tolerance {
        out.push(Vertex::line_to(seg.to.x, seg.to.y));
        return;
    }
    let (a, b) = seg.split(0.5);
    flatten_quad(&a, tolerance, depth + 1, out);
    flatten_quad(&b, tolerance, depth + 1, out);
}

fn flatten_cubic(seg: &CubicBezierSegment<f64>, tolerance: f64, depth: u32, out: &mut Vec<Vertex>) {
    let flat = distance_to_chord(seg.ctrl1, seg.from, seg.to) <= tolerance
        && distance_to_chord(seg.ctrl2, seg.from, seg.to) <= tolerance;
    if depth >= MAX_DEPTH || flat {
        out.push(Vertex::line_to(seg.to.x, seg.to.y));
        return;
    }
    let (a, b) = seg.split(0.5);
    flatten_cubic(&a, tolerance, depth + 1, out);
    flatten_cubic(&b, tolerance, depth + 1, out);
}

/// Replaces `Curve3`/`Curve4` segments with `LineTo` approximations
#[derive(Clone, Debug)]
pub struct CurveFlattener<S> {
    source: S,
    tolerance: f64,
    pending: Vec<Vertex>,
    pending_pos: usize,
    last: Point,
    start: Point,
}

impl<S: PathSource> CurveFlattener<S> {
    pub fn new(source: S) -> Self {
        Self::with_tolerance(source, DEFAULT_CURVE_TOLERANCE)
    }

    pub fn with_tolerance(source: S, tolerance: f64) -> Self {
        Self {
            source,
            tolerance: tolerance.max(1e-6),
            pending: Vec::new(),
            pending_pos: 0,
            last: Point::ZERO,
            start: Point::ZERO,
        }
    }

    fn flatten(&mut self, first: Vertex) -> Option<()> {
        self.pending.clear();
        self.pending_pos = 0;
        let from = to_geom(self.last);

        match first.cmd {
            PathCommand::Curve3 => {
                let end = self.source.next_vertex()?;
                let seg = QuadraticBezierSegment {
                    from,
                    ctrl: to_geom(first.point()),
                    to: to_geom(end.point()),
                };
                flatten_quad(&seg, self.tolerance, 0, &mut self.pending);
                self.last = end.point();
            }
            _ => {
                let ctrl2 = self.source.next_vertex()?;
                let end = self.source.next_vertex()?;
                let seg = CubicBezierSegment {
                    from,
                    ctrl1: to_geom(first.point()),
                    ctrl2: to_geom(ctrl2.point()),
                    to: to_geom(end.point()),
                };
                flatten_cubic(&seg, self.tolerance, 0, &mut self.pending);
                self.last = end.point();
            }
        }
        Some(())
    }
}

impl<S: PathSource> PathSource for CurveFlattener<S> {
    fn rewind(&mut self) {
        self.source.rewind();
        self.pending.clear();
        self.pending_pos = 0;
        self.last = Point::ZERO;
        self.start = Point::ZERO;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if self.pending_pos < self.pending.len() {
            let v = self.pending[self.pending_pos];
            self.pending_pos += 1;
            return Some(v);
        }

        let v = self.source.next_vertex()?;
        match v.cmd {
            PathCommand::MoveTo => {
                self.last = v.point();
                self.start = v.point();
                Some(v)
            }
            PathCommand::LineTo => {
                self.last = v.point();
                Some(v)
            }
            PathCommand::Close => {
                self.last = self.start;
                Some(v)
            }
            PathCommand::Curve3 | PathCommand::Curve4 => {
                self.flatten(v)?;
                self.next_vertex()
            }
        }
    }
}

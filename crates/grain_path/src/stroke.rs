//! Stroke outline generation
//!
//! Converts a flattened polyline into closed outline polygons that, filled
//! with the nonzero rule, cover the stroke. An open sub-path yields one loop
//! (left side forward, end cap, right side back, start cap); a closed sub-path
//! yields two loops of opposite orientation, one per side.

use grain_core::{PathCommand, PathSource, Point, Vertex, VertexList};
use std::f64::consts::PI;

/// Default miter length limit, as a multiple of half the stroke width
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

/// Points closer than this are treated as coincident
const COINCIDENT_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    /// Extends the line by half the width
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke style, widths in device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Joins whose miter would exceed `miter_limit * width / 2` are beveled
    pub miter_limit: f64,
    /// Scale for round join/cap approximation; higher is finer
    pub approximation_scale: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: DEFAULT_MITER_LIMIT,
            approximation_scale: 1.0,
        }
    }
}

impl StrokeStyle {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.line_join = join;
        self
    }

    pub fn with_miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = limit;
        self
    }
}

/// Stroke outline generator over a flattened source
#[derive(Clone, Debug)]
pub struct Stroker<S> {
    source: S,
    style: StrokeStyle,
    output: VertexList,
    generated: bool,
}

impl<S: PathSource> Stroker<S> {
    pub fn new(source: S, style: StrokeStyle) -> Self {
        Self {
            source,
            style,
            output: VertexList::new(),
            generated: false,
        }
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    fn generate(&mut self) {
        self.output.clear();
        self.source.rewind();

        let mut points: Vec<Point> = Vec::new();
        let mut subpaths = 0usize;

        while let Some(v) = self.source.next_vertex() {
            match v.cmd {
                PathCommand::MoveTo => {
                    subpaths += self.finish_subpath(&mut points, false);
                    points.push(v.point());
                }
                PathCommand::Close => {
                    subpaths += self.finish_subpath(&mut points, true);
                }
                _ => {
                    let p = v.point();
                    let distinct = points
                        .last()
                        .map_or(true, |last| last.distance(p) > COINCIDENT_EPSILON);
                    if distinct {
                        points.push(p);
                    }
                }
            }
        }
        subpaths += self.finish_subpath(&mut points, false);

        tracing::trace!(
            subpaths,
            vertices = self.output.len(),
            width = self.style.width,
            "stroke outline generated"
        );
        self.generated = true;
    }

    /// Emit outlines for the collected sub-path and reset it. Returns the
    /// number of sub-paths stroked.
    fn finish_subpath(&mut self, points: &mut Vec<Point>, mut closed: bool) -> usize {
        let start = points.first().copied();
        if closed && points.len() > 1 {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if first.distance(*last) <= COINCIDENT_EPSILON {
                    points.pop();
                }
            }
        }
        if closed && points.len() < 3 {
            closed = false;
        }

        let stroked = if points.len() >= 2 && self.style.width > 0.0 {
            let outliner = Outliner {
                style: &self.style,
                hw: self.style.width * 0.5,
            };
            if closed {
                outliner.closed(points, &mut self.output);
            } else {
                outliner.open(points, &mut self.output);
            }
            1
        } else {
            0
        };

        points.clear();
        // A sub-path continuing after Close starts again at its first point.
        if closed {
            if let Some(start) = start {
                points.push(start);
            }
        }
        stroked
    }
}

impl<S: PathSource> PathSource for Stroker<S> {
    fn rewind(&mut self) {
        self.generated = false;
        self.output.clear();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if !self.generated {
            self.generate();
        }
        self.output.next_vertex()
    }
}

struct Outliner<'a> {
    style: &'a StrokeStyle,
    hw: f64,
}

impl Outliner<'_> {
    fn open(&self, pts: &[Point], out: &mut VertexList) {
        let n = pts.len();
        let mut ring = Vec::with_capacity(n * 4);

        self.cap(&mut ring, pts[0], pts[1]);
        for i in 1..n - 1 {
            self.join(&mut ring, pts[i - 1], pts[i], pts[i + 1]);
        }
        self.cap(&mut ring, pts[n - 1], pts[n - 2]);
        for i in (1..n - 1).rev() {
            self.join(&mut ring, pts[i + 1], pts[i], pts[i - 1]);
        }
        emit_ring(&ring, out);
    }

    fn closed(&self, pts: &[Point], out: &mut VertexList) {
        let n = pts.len();
        let mut ring = Vec::with_capacity(n * 3);

        for i in 0..n {
            self.join(&mut ring, pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n]);
        }
        emit_ring(&ring, out);

        ring.clear();
        for i in (0..n).rev() {
            self.join(&mut ring, pts[(i + 1) % n], pts[i], pts[(i + n - 1) % n]);
        }
        emit_ring(&ring, out);
    }

    /// Left normal of `a -> b`, scaled to half the width.
    fn normal(&self, a: Point, b: Point) -> (f64, f64) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        (-dy / len * self.hw, dx / len * self.hw)
    }

    fn cap(&self, ring: &mut Vec<Point>, end: Point, prev: Point) {
        let (nx, ny) = self.normal(prev, end);
        // Unit direction scaled by half width equals the normal rotated back.
        let (ux, uy) = (ny, -nx);

        match self.style.line_cap {
            LineCap::Butt => {
                ring.push(Point::new(end.x + nx, end.y + ny));
                ring.push(Point::new(end.x - nx, end.y - ny));
            }
            LineCap::Square => {
                ring.push(Point::new(end.x + nx + ux, end.y + ny + uy));
                ring.push(Point::new(end.x - nx + ux, end.y - ny + uy));
            }
            LineCap::Round => {
                let a1 = ny.atan2(nx);
                self.arc(ring, end, a1, a1 - PI);
            }
        }
    }

    fn join(&self, ring: &mut Vec<Point>, prev: Point, p: Point, next: Point) {
        let (n1x, n1y) = self.normal(prev, p);
        let (n2x, n2y) = self.normal(p, next);
        let d1 = (p.x - prev.x, p.y - prev.y);
        let d2 = (next.x - p.x, next.y - p.y);
        let cross = d1.0 * d2.1 - d1.1 * d2.0;
        let dot = d1.0 * d2.0 + d1.1 * d2.1;
        let scale = (d1.0.hypot(d1.1)) * (d2.0.hypot(d2.1));

        if cross.abs() <= 1e-12 * scale && dot > 0.0 {
            ring.push(Point::new(p.x + n1x, p.y + n1y));
            return;
        }

        if cross > 0.0 {
            // Inner side of the turn.
            ring.push(Point::new(p.x + n1x, p.y + n1y));
            ring.push(p);
            ring.push(Point::new(p.x + n2x, p.y + n2y));
            return;
        }

        match self.style.line_join {
            LineJoin::Bevel => self.bevel(ring, p, (n1x, n1y), (n2x, n2y)),
            LineJoin::Round => {
                let a1 = n1y.atan2(n1x);
                let mut a2 = n2y.atan2(n2x);
                if a2 > a1 {
                    a2 -= 2.0 * PI;
                }
                self.arc(ring, p, a1, a2);
            }
            LineJoin::Miter => {
                let hw2 = self.hw * self.hw;
                let denom = hw2 + n1x * n2x + n1y * n2y;
                if denom <= hw2 * 1e-12 {
                    self.bevel(ring, p, (n1x, n1y), (n2x, n2y));
                    return;
                }
                let k = hw2 / denom;
                let mx = (n1x + n2x) * k;
                let my = (n1y + n2y) * k;
                if mx.hypot(my) <= self.style.miter_limit * self.hw {
                    ring.push(Point::new(p.x + mx, p.y + my));
                } else {
                    self.bevel(ring, p, (n1x, n1y), (n2x, n2y));
                }
            }
        }
    }

    fn bevel(&self, ring: &mut Vec<Point>, p: Point, n1: (f64, f64), n2: (f64, f64)) {
        ring.push(Point::new(p.x + n1.0, p.y + n1.1));
        ring.push(Point::new(p.x + n2.0, p.y + n2.1));
    }

    /// Arc around `center` from angle `a1` down to `a2` (clockwise sweep).
    fn arc(&self, ring: &mut Vec<Point>, center: Point, a1: f64, a2: f64) {
        let hw = self.hw;
        let da = (hw / (hw + 0.125 / self.style.approximation_scale)).acos() * 2.0;
        let da = if da.is_finite() && da > 1e-3 { da } else { 1e-3 };

        ring.push(Point::new(center.x + a1.cos() * hw, center.y + a1.sin() * hw));
        let mut a = a1 - da;
        while a > a2 + da * 0.25 {
            ring.push(Point::new(center.x + a.cos() * hw, center.y + a.sin() * hw));
            a -= da;
        }
        ring.push(Point::new(center.x + a2.cos() * hw, center.y + a2.sin() * hw));
    }
}

fn emit_ring(ring: &[Point], out: &mut VertexList) {
    let Some((first, rest)) = ring.split_first() else {
        return;
    };
    out.move_to(first.x, first.y);
    for p in rest {
        out.line_to(p.x, p.y);
    }
    out.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::{collect_vertices, Path};

    fn outline(path: &Path, style: StrokeStyle) -> Vec<Vertex> {
        collect_vertices(&mut Stroker::new(path.iter(), style))
    }

    fn bounds(verts: &[Vertex]) -> (f64, f64, f64, f64) {
        verts
            .iter()
            .filter(|v| v.cmd != PathCommand::Close)
            .fold((f64::MAX, f64::MAX, f64::MIN, f64::MIN), |b, v| {
                (b.0.min(v.x), b.1.min(v.y), b.2.max(v.x), b.3.max(v.y))
            })
    }

    #[test]
    fn test_butt_segment_is_rectangle() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = outline(&path, StrokeStyle::new(2.0));
        assert_eq!(out.len(), 5);
        assert_eq!(bounds(&out), (0.0, -1.0, 10.0, 1.0));
    }

    #[test]
    fn test_square_cap_extends() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = outline(&path, StrokeStyle::new(2.0).with_cap(LineCap::Square));
        assert_eq!(bounds(&out), (-1.0, -1.0, 11.0, 1.0));
    }

    #[test]
    fn test_round_cap_extends() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = outline(&path, StrokeStyle::new(4.0).with_cap(LineCap::Round));
        let (x1, _, x2, _) = bounds(&out);
        assert!((x1 + 2.0).abs() < 0.2);
        assert!((x2 - 12.0).abs() < 0.2);
    }

    #[test]
    fn test_miter_corner() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, -10.0)]);
        let out = outline(&path, StrokeStyle::new(2.0));
        let (_, _, x2, y2) = bounds(&out);
        assert!((x2 - 11.0).abs() < 1e-9);
        assert!((y2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sharp_miter_falls_back_to_bevel() {
        let path = Path::polyline(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.5)]);
        let out = outline(&path, StrokeStyle::new(2.0));
        let (_, _, x2, _) = bounds(&out);
        assert!(x2 < 10.0 + DEFAULT_MITER_LIMIT);
    }

    #[test]
    fn test_closed_path_two_loops() {
        let path = Path::rectangle(0.0, 0.0, 10.0, 10.0);
        let out = outline(&path, StrokeStyle::new(2.0));
        let closes = out.iter().filter(|v| v.cmd == PathCommand::Close).count();
        assert_eq!(closes, 2);
        assert_eq!(bounds(&out), (-1.0, -1.0, 11.0, 11.0));
    }

    #[test]
    fn test_degenerate_subpath_produces_nothing() {
        let path = Path::polyline(&[(3.0, 3.0), (3.0, 3.0)]);
        assert!(outline(&path, StrokeStyle::new(2.0)).is_empty());
    }
}

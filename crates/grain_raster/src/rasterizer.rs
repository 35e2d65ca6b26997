//! Scanline polygon rasterizer
//!
//! Polygons are reduced to a list of non-horizontal edges clipped to the clip
//! box. Sweeping walks the rows top to bottom, accumulates the signed area
//! each active edge contributes to every cell of the row, and turns the
//! running sum into an 8-bit coverage per pixel.
//!
//! Clipping keeps winding intact: the part of an edge left or right of the
//! clip box is folded onto the box border as a vertical edge, so pixels
//! inside still see the right winding number.

use grain_core::{PathCommand, PathSource, PixelRect, Point};

/// How overlapping sub-paths combine into coverage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// How fractional coverage is quantized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Coverage {
    /// Exact area coverage, 0..=255
    #[default]
    AntiAliased,
    /// Pixels at least half covered are fully on, the rest off
    Binary,
}

/// Receives runs of covered pixels
///
/// `covers[i]` is the coverage of pixel `(x + i, y)`. Every cover in a run is
/// nonzero.
pub trait SpanSink {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]);
}

impl<T: SpanSink + ?Sized> SpanSink for &mut T {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
        (**self).blend_span(y, x, covers)
    }
}

/// Clip box used when none is set
const UNBOUNDED: i32 = 1 << 20;

#[derive(Clone, Copy, Debug)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    /// +1 for edges going down, -1 for edges going up
    dir: f32,
}

impl Edge {
    fn x_at(&self, y: f64) -> f64 {
        let dy = self.y1 - self.y0;
        self.x0 + (self.x1 - self.x0) * (y - self.y0) / dy
    }
}

/// Anti-aliased scanline rasterizer
#[derive(Clone, Debug)]
pub struct Rasterizer {
    edges: Vec<Edge>,
    clip: PixelRect,
    fill_rule: FillRule,
    coverage: Coverage,
    start: Option<Point>,
    current: Option<Point>,
    accumulator: Vec<f32>,
    covers: Vec<u8>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            clip: PixelRect::new(-UNBOUNDED, -UNBOUNDED, UNBOUNDED, UNBOUNDED),
            fill_rule: FillRule::NonZero,
            coverage: Coverage::AntiAliased,
            start: None,
            current: None,
            accumulator: Vec::new(),
            covers: Vec::new(),
        }
    }

    /// Drop all geometry. Clip box, fill rule and coverage mode are kept.
    pub fn reset(&mut self) {
        self.edges.clear();
        self.start = None;
        self.current = None;
    }

    /// Restrict output to the half-open pixel box. Affects edges added after
    /// the call.
    pub fn clip_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.clip = PixelRect::new(x1, y1, x2, y2).normalized();
    }

    pub fn reset_clipping(&mut self) {
        self.clip = PixelRect::new(-UNBOUNDED, -UNBOUNDED, UNBOUNDED, UNBOUNDED);
    }

    pub fn clip(&self) -> PixelRect {
        self.clip
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.fill_rule = fill_rule;
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    pub fn set_coverage(&mut self, coverage: Coverage) {
        self.coverage = coverage;
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Start a new sub-path, closing the previous one.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.close_polygon();
        let p = Point::new(x, y);
        self.start = Some(p);
        self.current = Some(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y);
        match self.current {
            Some(from) => {
                self.add_edge(from, p);
                self.current = Some(p);
            }
            None => self.move_to(x, y),
        }
    }

    /// Add the closing edge of the current sub-path.
    pub fn close_polygon(&mut self) {
        if let (Some(start), Some(current)) = (self.start, self.current) {
            self.add_edge(current, start);
            self.current = Some(start);
        }
    }

    /// Append every vertex of `source`. Curve control points are taken as
    /// line vertices, so curves should be flattened first.
    pub fn add_path<S: PathSource + ?Sized>(&mut self, source: &mut S) {
        source.rewind();
        while let Some(v) = source.next_vertex() {
            match v.cmd {
                PathCommand::MoveTo => self.move_to(v.x, v.y),
                PathCommand::Close => self.close_polygon(),
                _ => self.line_to(v.x, v.y),
            }
        }
    }

    /// Pixel bounds of the clipped geometry.
    pub fn bounds(&self) -> Option<PixelRect> {
        let mut edges = self.edges.iter();
        let first = edges.next()?;
        let (mut x1, mut x2) = (first.x0.min(first.x1), first.x0.max(first.x1));
        let (mut y1, mut y2) = (first.y0, first.y1);
        for e in edges {
            x1 = x1.min(e.x0).min(e.x1);
            x2 = x2.max(e.x0).max(e.x1);
            y1 = y1.min(e.y0);
            y2 = y2.max(e.y1);
        }
        let rect = PixelRect::new(
            x1.floor() as i32,
            y1.floor() as i32,
            x2.ceil() as i32,
            y2.ceil() as i32,
        )
        .intersect(&self.clip);
        (!rect.is_empty()).then_some(rect)
    }

    fn add_edge(&mut self, p0: Point, p1: Point) {
        if !p0.is_finite() || !p1.is_finite() || p0.y == p1.y {
            return;
        }
        let (top, bottom, dir) = if p0.y < p1.y {
            (p0, p1, 1.0)
        } else {
            (p1, p0, -1.0)
        };

        let cy1 = self.clip.y1 as f64;
        let cy2 = self.clip.y2 as f64;
        if bottom.y <= cy1 || top.y >= cy2 {
            return;
        }
        let mut edge = Edge {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
            dir,
        };
        if edge.y0 < cy1 {
            edge.x0 = edge.x_at(cy1);
            edge.y0 = cy1;
        }
        if edge.y1 > cy2 {
            edge.x1 = edge.x_at(cy2);
            edge.y1 = cy2;
        }
        self.split_at_clip_x(edge);
    }

    fn split_at_clip_x(&mut self, edge: Edge) {
        let cx1 = self.clip.x1 as f64;
        let cx2 = self.clip.x2 as f64;
        let dx = edge.x1 - edge.x0;

        let mut cuts: [f64; 4] = [0.0, 1.0, 1.0, 1.0];
        let mut n = 1;
        if dx != 0.0 {
            for cx in [cx1, cx2] {
                let t = (cx - edge.x0) / dx;
                if t > 0.0 && t < 1.0 {
                    cuts[n] = t;
                    n += 1;
                }
            }
        }
        cuts[n] = 1.0;
        cuts[1..n].sort_by(f64::total_cmp);

        let dy = edge.y1 - edge.y0;
        for w in cuts[..=n].windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let y0 = edge.y0 + dy * t0;
            let y1 = if t1 >= 1.0 { edge.y1 } else { edge.y0 + dy * t1 };
            if y1 <= y0 {
                continue;
            }
            let mut x0 = edge.x0 + dx * t0;
            let mut x1 = if t1 >= 1.0 { edge.x1 } else { edge.x0 + dx * t1 };
            let mid = 0.5 * (x0 + x1);
            if mid < cx1 {
                x0 = cx1;
                x1 = cx1;
            } else if mid > cx2 {
                x0 = cx2;
                x1 = cx2;
            } else {
                x0 = x0.clamp(cx1, cx2);
                x1 = x1.clamp(cx1, cx2);
            }
            self.edges.push(Edge {
                x0,
                y0,
                x1,
                y1,
                dir: edge.dir,
            });
        }
    }

    /// Compute coverage for every row and hand the covered runs to `sink`.
    ///
    /// Any open sub-path is closed first. Geometry is kept, so the same shape
    /// can be swept into several sinks.
    pub fn sweep<K: SpanSink + ?Sized>(&mut self, sink: &mut K) {
        self.close_polygon();
        if self.edges.is_empty() {
            return;
        }
        self.edges.sort_by(|a, b| a.y0.total_cmp(&b.y0));

        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for e in &self.edges {
            min_x = min_x.min(e.x0).min(e.x1);
            max_x = max_x.max(e.x0).max(e.x1);
            min_y = min_y.min(e.y0);
            max_y = max_y.max(e.y1);
        }

        let origin_x = min_x.floor() as i32;
        let width = (max_x.ceil() as i32 - origin_x + 2).max(1) as usize;
        self.accumulator.clear();
        self.accumulator.resize(width, 0.0);

        let row_start = (min_y.floor() as i32).max(self.clip.y1);
        let row_end = (max_y.ceil() as i32).min(self.clip.y2);
        tracing::trace!(
            edges = self.edges.len(),
            rows = row_end - row_start,
            width,
            "sweeping rasterizer"
        );

        let mut active: Vec<usize> = Vec::new();
        let mut next = 0;
        for y in row_start..row_end {
            let top = y as f64;
            let bottom = top + 1.0;
            while next < self.edges.len() && self.edges[next].y0 < bottom {
                active.push(next);
                next += 1;
            }
            active.retain(|&i| self.edges[i].y1 > top);
            if active.is_empty() {
                continue;
            }

            let mut lo = usize::MAX;
            let mut hi = 0;
            for &i in &active {
                let e = self.edges[i];
                let ya = e.y0.max(top);
                let yb = e.y1.min(bottom);
                if yb <= ya {
                    continue;
                }
                let xa = if ya == e.y0 { e.x0 } else { e.x_at(ya) };
                let xb = if yb == e.y1 { e.x1 } else { e.x_at(yb) };
                let d = (yb - ya) as f32 * e.dir;
                let (l, h) = accumulate(&mut self.accumulator, origin_x, xa, xb, d);
                lo = lo.min(l);
                hi = hi.max(h);
            }
            if lo > hi {
                continue;
            }
            self.emit_row(sink, y, origin_x, lo, hi);
        }
    }

    fn emit_row<K: SpanSink + ?Sized>(
        &mut self,
        sink: &mut K,
        y: i32,
        origin_x: i32,
        lo: usize,
        hi: usize,
    ) {
        let mut acc = 0.0f32;
        let mut run_x = 0;
        self.covers.clear();
        for i in lo..=hi {
            acc += self.accumulator[i];
            self.accumulator[i] = 0.0;
            let x = origin_x + i as i32;
            let cover = if x >= self.clip.x1 && x < self.clip.x2 {
                self.quantize(acc)
            } else {
                0
            };
            if cover == 0 {
                if !self.covers.is_empty() {
                    sink.blend_span(y, run_x, &self.covers);
                    self.covers.clear();
                }
                continue;
            }
            if self.covers.is_empty() {
                run_x = x;
            }
            self.covers.push(cover);
        }
        if !self.covers.is_empty() {
            sink.blend_span(y, run_x, &self.covers);
            self.covers.clear();
        }
    }

    fn quantize(&self, area: f32) -> u8 {
        let a = area.abs();
        let c = match self.fill_rule {
            FillRule::NonZero => a.min(1.0),
            FillRule::EvenOdd => {
                let folded = a % 2.0;
                if folded > 1.0 {
                    2.0 - folded
                } else {
                    folded
                }
            }
        };
        match self.coverage {
            Coverage::AntiAliased => (c * 255.0 + 0.5) as u8,
            Coverage::Binary => {
                if c >= 0.5 {
                    255
                } else {
                    0
                }
            }
        }
    }
}

/// Add the area one edge piece inside a single row contributes to each cell.
/// `d` is the signed height of the piece. Returns the touched index range.
fn accumulate(acc: &mut [f32], origin_x: i32, xa: f64, xb: f64, d: f32) -> (usize, usize) {
    let (x0, x1) = if xa < xb { (xa, xb) } else { (xb, xa) };
    let x0 = (x0 - origin_x as f64) as f32;
    let x1 = (x1 - origin_x as f64) as f32;
    let last = acc.len() - 1;

    let x0floor = x0.floor();
    let x0i = (x0floor.max(0.0) as usize).min(last);
    let x1ceil = x1.ceil();
    let x1i = (x1ceil.max(0.0) as usize).min(last);

    if x1i <= x0i + 1 {
        // Piece stays within one cell
        let xmf = 0.5 * (x0 + x1) - x0floor;
        acc[x0i] += d - d * xmf;
        let right = (x0i + 1).min(last);
        acc[right] += d * xmf;
        return (x0i, right);
    }

    let s = (x1 - x0).recip();
    let x0f = x0 - x0floor;
    let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
    let x1f = x1 - x1ceil + 1.0;
    let am = 0.5 * s * x1f * x1f;
    acc[x0i] += d * a0;
    if x1i == x0i + 2 {
        acc[x0i + 1] += d * (1.0 - a0 - am);
    } else {
        let a1 = s * (1.5 - x0f);
        acc[x0i + 1] += d * (a1 - a0);
        for cell in &mut acc[x0i + 2..x1i - 1] {
            *cell += d * s;
        }
        let a2 = a1 + (x1i - x0i - 3) as f32 * s;
        acc[x1i - 1] += d * (1.0 - a2 - am);
    }
    acc[x1i] += d * am;
    (x0i, x1i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::Path;
    use std::collections::BTreeMap;

    /// Collects coverage into a map keyed by (x, y)
    #[derive(Default)]
    struct Covers(BTreeMap<(i32, i32), u8>);

    impl SpanSink for Covers {
        fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
            for (i, &c) in covers.iter().enumerate() {
                assert!(c > 0);
                self.0.insert((x + i as i32, y), c);
            }
        }
    }

    impl Covers {
        fn at(&self, x: i32, y: i32) -> u8 {
            self.0.get(&(x, y)).copied().unwrap_or(0)
        }
    }

    fn sweep(ras: &mut Rasterizer) -> Covers {
        let mut covers = Covers::default();
        ras.sweep(&mut covers);
        covers
    }

    #[test]
    fn test_pixel_aligned_rect_is_fully_covered() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(2.0, 3.0, 6.0, 5.0).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.0.len(), 8);
        assert!(covers.0.values().all(|&c| c == 255));
        assert_eq!(covers.at(2, 3), 255);
        assert_eq!(covers.at(5, 4), 255);
        assert_eq!(covers.at(6, 4), 0);
    }

    #[test]
    fn test_half_pixel_edges_give_half_coverage() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(1.5, 0.0, 3.5, 1.0).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(1, 0), 128);
        assert_eq!(covers.at(2, 0), 255);
        assert_eq!(covers.at(3, 0), 128);
    }

    #[test]
    fn test_winding_direction_does_not_matter() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::polygon(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(1, 1), 255);
    }

    #[test]
    fn test_diagonal_area() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::polygon(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)]).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(0, 0), 255);
        // Diagonal cells are half covered
        assert_eq!(covers.at(3, 0), 128);
        assert_eq!(covers.at(1, 2), 128);
        assert_eq!(covers.at(3, 3), 0);
    }

    #[test]
    fn test_even_odd_leaves_hole() {
        let path = Path::builder()
            .move_to(0.0, 0.0)
            .line_to(6.0, 0.0)
            .line_to(6.0, 6.0)
            .line_to(0.0, 6.0)
            .close()
            .move_to(2.0, 2.0)
            .line_to(4.0, 2.0)
            .line_to(4.0, 4.0)
            .line_to(2.0, 4.0)
            .close()
            .build();

        let mut ras = Rasterizer::new();
        ras.add_path(&mut path.iter());
        assert_eq!(sweep(&mut ras).at(3, 3), 255);

        ras.set_fill_rule(FillRule::EvenOdd);
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(3, 3), 0);
        assert_eq!(covers.at(1, 1), 255);
    }

    #[test]
    fn test_clip_box_limits_output() {
        let mut ras = Rasterizer::new();
        ras.clip_box(2, 2, 4, 4);
        ras.add_path(&mut Path::rectangle(-10.0, -10.0, 10.0, 10.0).iter());
        let covers = sweep(&mut ras);
        let keys: Vec<_> = covers.0.keys().copied().collect();
        assert_eq!(keys, vec![(2, 2), (2, 3), (3, 2), (3, 3)]);
        assert!(covers.0.values().all(|&c| c == 255));
        assert_eq!(ras.bounds(), Some(PixelRect::new(2, 2, 4, 4)));
    }

    #[test]
    fn test_clipped_diagonal_keeps_winding() {
        // Triangle whose slanted edge leaves the clip box on the left
        let tri = Path::polygon(&[(-4.0, 0.0), (8.0, 0.0), (8.0, 12.0)]);
        let mut unclipped = Rasterizer::new();
        unclipped.add_path(&mut tri.iter());
        let full = sweep(&mut unclipped);

        let mut clipped = Rasterizer::new();
        clipped.clip_box(0, 0, 6, 6);
        clipped.add_path(&mut tri.iter());
        let part = sweep(&mut clipped);

        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(part.at(x, y), full.at(x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_binary_coverage() {
        let mut ras = Rasterizer::new();
        ras.set_coverage(Coverage::Binary);
        ras.add_path(&mut Path::rectangle(0.4, 0.0, 2.6, 1.0).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(0, 0), 255);
        assert_eq!(covers.at(1, 0), 255);
        assert_eq!(covers.at(2, 0), 255);

        ras.reset();
        ras.add_path(&mut Path::rectangle(0.6, 0.0, 2.4, 1.0).iter());
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(0, 0), 0);
        assert_eq!(covers.at(2, 0), 0);
    }

    #[test]
    fn test_open_path_is_closed() {
        let mut ras = Rasterizer::new();
        ras.move_to(0.0, 0.0);
        ras.line_to(3.0, 0.0);
        ras.line_to(3.0, 3.0);
        ras.line_to(0.0, 3.0);
        let covers = sweep(&mut ras);
        assert_eq!(covers.at(1, 1), 255);
    }

    #[test]
    fn test_reset_drops_geometry() {
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 3.0, 3.0).iter());
        ras.reset();
        assert!(ras.is_empty());
        assert_eq!(ras.bounds(), None);
        assert!(sweep(&mut ras).0.is_empty());
    }
}

//! Dash generation
//!
//! Cuts every sub-path into open dash sub-paths. The pattern restarts at the
//! configured phase for each sub-path.

use grain_core::{PathCommand, PathSource, Point, Vertex, VertexList};

/// Dash lengths in device pixels
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashPattern {
    /// `(on, off)` pairs
    pub dashes: Vec<(f64, f64)>,
    /// Distance into the pattern at which each sub-path starts
    pub offset: f64,
}

impl DashPattern {
    pub fn new(dashes: Vec<(f64, f64)>, offset: f64) -> Self {
        Self { dashes, offset }
    }

    pub fn is_solid(&self) -> bool {
        self.period() <= 0.0
    }

    pub fn period(&self) -> f64 {
        self.dashes.iter().map(|(on, off)| on.max(0.0) + off.max(0.0)).sum()
    }

    /// Flattened on/off lengths.
    fn lengths(&self) -> Vec<f64> {
        self.dashes
            .iter()
            .flat_map(|&(on, off)| [on.max(0.0), off.max(0.0)])
            .collect()
    }
}

/// Position within a dash pattern
struct DashCursor<'a> {
    lengths: &'a [f64],
    index: usize,
    remaining: f64,
}

impl<'a> DashCursor<'a> {
    fn start(lengths: &'a [f64], period: f64, offset: f64) -> Self {
        let mut phase = offset.rem_euclid(period);
        if phase >= period {
            phase = 0.0;
        }
        let mut index = 0;
        for _ in 0..lengths.len() {
            if phase < lengths[index] {
                break;
            }
            phase -= lengths[index];
            index = (index + 1) % lengths.len();
        }
        Self {
            lengths,
            index,
            remaining: (lengths[index] - phase).max(0.0),
        }
    }

    fn is_on(&self) -> bool {
        self.index % 2 == 0
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.lengths.len();
        self.remaining = self.lengths[self.index];
    }
}

/// Splits sub-paths into dashes
#[derive(Clone, Debug)]
pub struct Dasher<S> {
    source: S,
    pattern: DashPattern,
    output: VertexList,
    generated: bool,
}

impl<S: PathSource> Dasher<S> {
    pub fn new(source: S, pattern: DashPattern) -> Self {
        Self {
            source,
            pattern,
            output: VertexList::new(),
            generated: false,
        }
    }

    fn generate(&mut self) {
        self.output.clear();
        self.source.rewind();

        let mut points: Vec<Point> = Vec::new();
        while let Some(v) = self.source.next_vertex() {
            match v.cmd {
                PathCommand::MoveTo => {
                    self.dash_subpath(&points);
                    points.clear();
                    points.push(v.point());
                }
                PathCommand::Close => {
                    if let Some(&start) = points.first() {
                        points.push(start);
                        self.dash_subpath(&points);
                        points.clear();
                        points.push(start);
                    }
                }
                _ => points.push(v.point()),
            }
        }
        self.dash_subpath(&points);
        self.generated = true;
    }

    fn dash_subpath(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        let lengths = self.pattern.lengths();
        let mut cursor = DashCursor::start(&lengths, self.pattern.period(), self.pattern.offset);
        let mut pen_down = false;

        for seg in points.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let seg_len = a.distance(b);
            if seg_len <= 0.0 {
                continue;
            }
            let (ux, uy) = ((b.x - a.x) / seg_len, (b.y - a.y) / seg_len);
            let at = |t: f64| Point::new(a.x + ux * t, a.y + uy * t);
            let mut t = 0.0;

            while seg_len - t > 1e-12 {
                let step = cursor.remaining.min(seg_len - t);
                let from = at(t);
                let to = at(t + step);
                if cursor.is_on() {
                    if !pen_down {
                        self.output.move_to(from.x, from.y);
                        pen_down = true;
                    }
                    self.output.line_to(to.x, to.y);
                }
                t += step;
                cursor.remaining -= step;
                if cursor.remaining <= 1e-12 {
                    pen_down = false;
                    cursor.advance();
                    // Zero-length dashes become dots.
                    while cursor.remaining <= 0.0 {
                        if cursor.is_on() {
                            let p = at(t);
                            self.output.move_to(p.x, p.y);
                            self.output.line_to(p.x, p.y);
                        }
                        cursor.advance();
                    }
                }
            }
        }
    }
}

impl<S: PathSource> PathSource for Dasher<S> {
    fn rewind(&mut self) {
        self.source.rewind();
        self.generated = false;
        self.output.clear();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        if self.pattern.is_solid() {
            return self.source.next_vertex();
        }
        if !self.generated {
            self.generate();
        }
        self.output.next_vertex()
    }
}

//! Path representation and the lazy vertex protocol
//!
//! A [`Path`] is an immutable vertex array with an optional per-vertex code
//! array. Everything downstream consumes it through [`PathSource`], a
//! restartable forward-only sequence of [`Vertex`] values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::array::{ArrayView, ShapeError};
use crate::geometry::Point;

/// Default perpendicular tolerance (device pixels) used by path simplification
pub const DEFAULT_SIMPLIFY_THRESHOLD: f64 = 1.0 / 9.0;

/// Paths with fewer vertices than this are never simplified by default
pub const SIMPLIFY_MIN_VERTICES: usize = 128;

// ─────────────────────────────────────────────────────────────────────────────
// Codes and commands
// ─────────────────────────────────────────────────────────────────────────────

/// Per-vertex code as stored in a code array
///
/// `Curve3` spans two vertices (control, end) and `Curve4` three (two
/// controls, end); every vertex of the group carries the curve code.
/// `ClosePoly` ignores its coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PathCode {
    Stop = 0,
    MoveTo = 1,
    LineTo = 2,
    Curve3 = 3,
    Curve4 = 4,
    ClosePoly = 0x4f,
}

impl PathCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stop),
            1 => Some(Self::MoveTo),
            2 => Some(Self::LineTo),
            3 => Some(Self::Curve3),
            4 => Some(Self::Curve4),
            0x4f => Some(Self::ClosePoly),
            _ => None,
        }
    }

    /// Vertices consumed by one segment with this code.
    pub fn num_vertices(self) -> usize {
        match self {
            Self::Curve3 => 2,
            Self::Curve4 => 3,
            _ => 1,
        }
    }

    pub fn is_curve(self) -> bool {
        matches!(self, Self::Curve3 | Self::Curve4)
    }
}

/// Command attached to an emitted vertex
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PathCommand {
    #[default]
    MoveTo,
    LineTo,
    /// One of the two vertices of a quadratic segment
    Curve3,
    /// One of the three vertices of a cubic segment
    Curve4,
    Close,
}

impl PathCommand {
    pub fn is_curve(self) -> bool {
        matches!(self, Self::Curve3 | Self::Curve4)
    }

    /// Commands that carry a meaningful coordinate.
    pub fn is_vertex(self) -> bool {
        !matches!(self, Self::Close)
    }
}

/// A point tagged with its command
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub cmd: PathCommand,
}

impl Vertex {
    pub const fn new(x: f64, y: f64, cmd: PathCommand) -> Self {
        Self { x, y, cmd }
    }

    pub const fn move_to(x: f64, y: f64) -> Self {
        Self::new(x, y, PathCommand::MoveTo)
    }

    pub const fn line_to(x: f64, y: f64) -> Self {
        Self::new(x, y, PathCommand::LineTo)
    }

    pub const fn close() -> Self {
        Self::new(0.0, 0.0, PathCommand::Close)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PathSource
// ─────────────────────────────────────────────────────────────────────────────

/// Lazy, restartable vertex sequence
///
/// `next_vertex` returning `None` marks the end of the path. `rewind` restarts
/// from the first vertex; a source walked twice yields the same vertices.
pub trait PathSource {
    fn rewind(&mut self);
    fn next_vertex(&mut self) -> Option<Vertex>;
}

impl<S: PathSource + ?Sized> PathSource for &mut S {
    fn rewind(&mut self) {
        (**self).rewind()
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        (**self).next_vertex()
    }
}

impl<S: PathSource + ?Sized> PathSource for Box<S> {
    fn rewind(&mut self) {
        (**self).rewind()
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        (**self).next_vertex()
    }
}

/// Rewind `source` and drain it into a vector.
pub fn collect_vertices<S: PathSource + ?Sized>(source: &mut S) -> Vec<Vertex> {
    source.rewind();
    let mut out = Vec::new();
    while let Some(v) = source.next_vertex() {
        out.push(v);
    }
    out
}

/// Owned vertex list, used for generated geometry
#[derive(Clone, Debug, Default)]
pub struct VertexList {
    vertices: Vec<Vertex>,
    cursor: usize,
}

impl VertexList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            cursor: 0,
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.cursor = 0;
    }

    pub fn push(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.push(Vertex::move_to(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.push(Vertex::line_to(x, y));
    }

    pub fn close(&mut self) {
        self.push(Vertex::close());
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl PathSource for VertexList {
    fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        let v = self.vertices.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path
// ─────────────────────────────────────────────────────────────────────────────

static NEXT_PATH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token of a [`Path`], shared by its clones
///
/// Used as the clip-path cache key in place of pointer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathId(u64);

impl PathId {
    fn next() -> Self {
        Self(NEXT_PATH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Immutable path: vertices, optional codes and rendering hints
#[derive(Clone, Debug)]
pub struct Path {
    id: PathId,
    vertices: Arc<[Point]>,
    codes: Option<Arc<[PathCode]>>,
    should_simplify: bool,
    simplify_threshold: f64,
    has_curves: bool,
}

impl Path {
    /// Polyline path: first vertex moves, the rest draw lines.
    pub fn new(vertices: Vec<Point>) -> Self {
        let should_simplify = vertices.len() >= SIMPLIFY_MIN_VERTICES;
        Self {
            id: PathId::next(),
            vertices: vertices.into(),
            codes: None,
            should_simplify,
            simplify_threshold: DEFAULT_SIMPLIFY_THRESHOLD,
            has_curves: false,
        }
    }

    pub fn with_codes(vertices: Vec<Point>, codes: Vec<PathCode>) -> Result<Self, ShapeError> {
        if vertices.len() != codes.len() {
            return Err(ShapeError::LengthMismatch {
                first: "vertices".to_string(),
                second: "codes".to_string(),
            });
        }
        let has_curves = codes.iter().any(|c| c.is_curve());
        let should_simplify = vertices.len() >= SIMPLIFY_MIN_VERTICES && !has_curves;
        Ok(Self {
            id: PathId::next(),
            vertices: vertices.into(),
            codes: Some(codes.into()),
            should_simplify,
            simplify_threshold: DEFAULT_SIMPLIFY_THRESHOLD,
            has_curves,
        })
    }

    /// Build from an Nx2 vertex array and an optional raw code array.
    pub fn from_arrays(vertices: &ArrayView<'_, f64>, codes: Option<&[u8]>) -> Result<Self, ShapeError> {
        vertices.expect_shape_or_empty("vertices", &[None, Some(2)])?;
        let points: Vec<Point> = (0..vertices.len())
            .map(|i| {
                let row = vertices.row(i);
                Point::new(row[0], row[1])
            })
            .collect();

        match codes {
            None => Ok(Self::new(points)),
            Some(raw) => {
                let parsed = raw
                    .iter()
                    .map(|&c| PathCode::from_u8(c))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| ShapeError::Mismatch {
                        argument: "codes".to_string(),
                        expected: "valid path codes".to_string(),
                        actual: vec![raw.len()],
                    })?;
                Self::with_codes(points, parsed)
            }
        }
    }

    pub fn polyline(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&p| p.into()).collect())
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        let mut builder = PathBuilder::new();
        for (i, &(x, y)) in points.iter().enumerate() {
            builder = if i == 0 {
                builder.move_to(x, y)
            } else {
                builder.line_to(x, y)
            };
        }
        if !points.is_empty() {
            builder = builder.close();
        }
        builder.build()
    }

    /// Closed axis-aligned rectangle between two corners.
    pub fn rectangle(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::polygon(&[(x1, y1), (x2, y1), (x2, y2), (x1, y2)])
    }

    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn codes(&self) -> Option<&[PathCode]> {
        self.codes.as_deref()
    }

    pub fn total_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn has_curves(&self) -> bool {
        self.has_curves
    }

    pub fn should_simplify(&self) -> bool {
        self.should_simplify
    }

    pub fn simplify_threshold(&self) -> f64 {
        self.simplify_threshold
    }

    /// Override the simplification hint. Paths with curves never simplify.
    pub fn with_simplify(mut self, should_simplify: bool) -> Self {
        self.should_simplify = should_simplify && !self.has_curves;
        self
    }

    pub fn with_simplify_threshold(mut self, threshold: f64) -> Self {
        self.simplify_threshold = threshold;
        self
    }

    pub fn iter(&self) -> PathIter<'_> {
        PathIter {
            path: self,
            index: 0,
        }
    }
}

/// [`PathSource`] over a borrowed [`Path`]
#[derive(Clone, Debug)]
pub struct PathIter<'a> {
    path: &'a Path,
    index: usize,
}

impl<'a> PathIter<'a> {
    pub fn path(&self) -> &'a Path {
        self.path
    }
}

impl PathSource for PathIter<'_> {
    fn rewind(&mut self) {
        self.index = 0;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        let point = *self.path.vertices.get(self.index)?;
        let cmd = match &self.path.codes {
            None if self.index == 0 => PathCommand::MoveTo,
            None => PathCommand::LineTo,
            Some(codes) => match codes[self.index] {
                PathCode::Stop => return None,
                PathCode::MoveTo => PathCommand::MoveTo,
                PathCode::LineTo => PathCommand::LineTo,
                PathCode::Curve3 => PathCommand::Curve3,
                PathCode::Curve4 => PathCommand::Curve4,
                PathCode::ClosePoly => PathCommand::Close,
            },
        };
        self.index += 1;
        Some(Vertex::new(point.x, point.y, cmd))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for constructing paths
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    vertices: Vec<Point>,
    codes: Vec<PathCode>,
    start: Point,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.start = Point::new(x, y);
        self.push(self.start, PathCode::MoveTo);
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.push(Point::new(x, y), PathCode::LineTo);
        self
    }

    pub fn quad_to(mut self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.push(Point::new(cx, cy), PathCode::Curve3);
        self.push(Point::new(x, y), PathCode::Curve3);
        self
    }

    pub fn cubic_to(mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> Self {
        self.push(Point::new(c1x, c1y), PathCode::Curve4);
        self.push(Point::new(c2x, c2y), PathCode::Curve4);
        self.push(Point::new(x, y), PathCode::Curve4);
        self
    }

    /// Circle approximated by four cubic arcs.
    pub fn circle(self, cx: f64, cy: f64, r: f64) -> Self {
        const K: f64 = 0.552_284_749_830_793_6;
        let k = K * r;
        self.move_to(cx + r, cy)
            .cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)
            .cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)
            .cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)
            .cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)
            .close()
    }

    pub fn close(mut self) -> Self {
        let start = self.start;
        self.push(start, PathCode::ClosePoly);
        self
    }

    fn push(&mut self, point: Point, code: PathCode) {
        self.vertices.push(point);
        self.codes.push(code);
    }

    pub fn build(self) -> Path {
        let has_curves = self.codes.iter().any(|c| c.is_curve());
        let should_simplify = self.vertices.len() >= SIMPLIFY_MIN_VERTICES && !has_curves;
        Path {
            id: PathId::next(),
            vertices: self.vertices.into(),
            codes: Some(self.codes.into()),
            should_simplify,
            simplify_threshold: DEFAULT_SIMPLIFY_THRESHOLD,
            has_curves,
        }
    }
}

//! Geometry primitives
//!
//! All device math runs in `f64`; only coverage and color channels drop to
//! lower precision further down the pipeline.

// ─────────────────────────────────────────────────────────────────────────────
// Point
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_squared(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Affine transform
// ─────────────────────────────────────────────────────────────────────────────

/// 2D affine transformation
///
/// Composition reads left to right: `a.then(&b)` applies `a` first and `b`
/// second, which is how device transforms get appended after user transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f64; 6],
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Counter-clockwise rotation by `angle` radians (in a y-up frame).
    pub fn rotation(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    pub fn rotation_degrees(angle: f64) -> Self {
        Self::rotation(angle.to_radians())
    }

    /// Build from a row-major 3x3 matrix. Only the top two rows are read.
    pub fn from_matrix3(m: &[f64]) -> Option<Self> {
        if m.len() < 6 {
            return None;
        }
        Some(Self::new(m[0], m[3], m[1], m[4], m[2], m[5]))
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(a * point.x + c * point.y + tx, b * point.x + d * point.y + ty)
    }

    pub fn transform_xy(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.transform_point(Point::new(x, y));
        (p.x, p.y)
    }

    /// Concatenate: the result applies `self` first, then `other`.
    pub fn then(&self, other: &Affine) -> Affine {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine {
            elements: [
                a2 * a1 + c2 * b1,
                b2 * a1 + d2 * b1,
                a2 * c1 + c2 * d1,
                b2 * c1 + d2 * d1,
                a2 * tx1 + c2 * ty1 + tx2,
                b2 * tx1 + d2 * ty1 + ty2,
            ],
        }
    }

    /// Translate before applying `self`.
    pub fn pre_translate(&self, x: f64, y: f64) -> Affine {
        Affine::translation(x, y).then(self)
    }

    pub fn then_translate(&self, x: f64, y: f64) -> Affine {
        self.then(&Affine::translation(x, y))
    }

    pub fn then_scale(&self, sx: f64, sy: f64) -> Affine {
        self.then(&Affine::scale(sx, sy))
    }

    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv = 1.0 / det;
        Some(Affine::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * ty - d * tx) * inv,
            (b * tx - a * ty) * inv,
        ))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Bitwise equality of all six scalars; distinguishes `0.0` from `-0.0`
    /// and treats identical NaN payloads as equal.
    pub fn bitwise_eq(&self, other: &Affine) -> bool {
        self.elements
            .iter()
            .zip(other.elements.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Uniform scale factor estimate, used for curve approximation.
    pub fn scale_factor(&self) -> f64 {
        let [a, b, c, d, _, _] = self.elements;
        let x = (a * a + b * b).sqrt();
        let y = (c * c + d * d).sqrt();
        ((x + y) * 0.5).max(f64::EPSILON)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rectangles
// ─────────────────────────────────────────────────────────────────────────────

/// Floating point rectangle given by two corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// All four coordinates exactly zero, the "no clip" sentinel.
    pub fn is_zero(&self) -> bool {
        self.x1 == 0.0 && self.y1 == 0.0 && self.x2 == 0.0 && self.y2 == 0.0
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Inclusive hit test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }
}

/// Integer pixel rectangle, half-open: `x1..x2` by `y1..y2`, y down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> PixelRect {
        PixelRect::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_then_applies_left_to_right() {
        let t = Affine::translation(10.0, 0.0).then(&Affine::scale(2.0, 2.0));
        let p = t.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(22.0, 2.0));

        let u = Affine::scale(2.0, 2.0).then(&Affine::translation(10.0, 0.0));
        let q = u.transform_point(Point::new(1.0, 1.0));
        assert_eq!(q, Point::new(12.0, 2.0));
    }

    #[test]
    fn test_invert() {
        let t = Affine::rotation(0.3)
            .then(&Affine::scale(2.0, 3.0))
            .then_translate(5.0, -7.0);
        let inv = t.invert().unwrap();
        let p = Point::new(3.5, -1.25);
        let back = inv.transform_point(t.transform_point(p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);

        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_device_flip() {
        let height = 100.0;
        let flip = Affine::IDENTITY.then_scale(1.0, -1.0).then_translate(0.0, height);
        assert_eq!(flip.transform_point(Point::new(5.0, 0.0)), Point::new(5.0, 100.0));
        assert_eq!(flip.transform_point(Point::new(5.0, 100.0)), Point::new(5.0, 0.0));
    }

    #[test]
    fn test_from_matrix3() {
        let m = [1.0, 0.0, 4.0, 0.0, 2.0, 5.0, 0.0, 0.0, 1.0];
        let t = Affine::from_matrix3(&m).unwrap();
        assert_eq!(t.transform_point(Point::new(1.0, 1.0)), Point::new(5.0, 7.0));
    }

    #[test]
    fn test_bitwise_eq() {
        let a = Affine::translation(0.0, 1.0);
        let b = Affine::translation(-0.0, 1.0);
        assert_eq!(a, b);
        assert!(!a.bitwise_eq(&b));
        assert!(a.bitwise_eq(&a.clone()));
    }

    #[test]
    fn test_pixel_rect() {
        let r = PixelRect::new(4, 5, 1, 2).normalized();
        assert_eq!(r, PixelRect::new(1, 2, 4, 5));
        assert_eq!(r.width(), 3);
        assert!(r.contains(1, 2));
        assert!(!r.contains(4, 2));

        let clipped = r.intersect(&PixelRect::new(2, 0, 10, 3));
        assert_eq!(clipped, PixelRect::new(2, 2, 4, 3));
        assert!(PixelRect::new(5, 0, 5, 10).is_empty());
    }
}

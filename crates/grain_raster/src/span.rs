//! Span generators
//!
//! A generator produces the color of each pixel in a horizontal span. Colors
//! are sampled at pixel centers.

use grain_core::{Affine, Color, Point, VertexList};

use crate::pixel::{PixelBuffer, Rgba8};

/// Per-pixel color source for [`SpanRenderer`](crate::SpanRenderer)
pub trait SpanGenerator {
    /// Fill `out` with the colors of pixels `(x, y)` to `(x + out.len() - 1, y)`.
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]);
}

impl<G: SpanGenerator + ?Sized> SpanGenerator for &mut G {
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]) {
        (**self).generate(x, y, out)
    }
}

fn to_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Weighted sum of the four texels around (u, v) with pixel centers at half
/// coordinates. `fetch` returns zeroes outside the source.
fn bilinear<const N: usize>(u: f64, v: f64, fetch: impl Fn(i64, i64) -> [f32; N]) -> [f32; N] {
    let u = u - 0.5;
    let v = v - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = (u - x0) as f32;
    let fy = (v - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];
    let mut out = [0.0f32; N];
    for (x, y, w) in taps {
        if w == 0.0 {
            continue;
        }
        for (o, s) in out.iter_mut().zip(fetch(x, y)) {
            *o += s * w;
        }
    }
    out
}

/// Smoothly shaded triangle
#[derive(Clone, Debug)]
pub struct GouraudSpan {
    points: [Point; 3],
    colors: [[f32; 4]; 3],
    det: f64,
}

impl GouraudSpan {
    /// `None` when the triangle has no area or a non-finite vertex.
    pub fn new(points: [Point; 3], colors: [Color; 3]) -> Option<Self> {
        if !points.iter().all(Point::is_finite) {
            return None;
        }
        let [p0, p1, p2] = points;
        let det = (p1.x - p0.x) * (p2.y - p0.y) - (p1.y - p0.y) * (p2.x - p0.x);
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        Some(Self {
            points,
            colors: colors.map(|c| c.to_array()),
            det,
        })
    }

    fn weights(&self, x: f64, y: f64) -> [f64; 3] {
        let [p0, p1, p2] = self.points;
        let (dx, dy) = (x - p0.x, y - p0.y);
        let w1 = (dx * (p2.y - p0.y) - dy * (p2.x - p0.x)) / self.det;
        let w2 = ((p1.x - p0.x) * dy - (p1.y - p0.y) * dx) / self.det;
        let mut w = [1.0 - w1 - w2, w1, w2].map(|v| v.clamp(0.0, 1.0));
        let sum: f64 = w.iter().sum();
        if sum > 0.0 {
            for v in &mut w {
                *v /= sum;
            }
        }
        w
    }

    pub fn color_at(&self, x: f64, y: f64) -> Rgba8 {
        let w = self.weights(x, y);
        let mut c = [0.0f32; 4];
        for (weight, color) in w.iter().zip(&self.colors) {
            for (channel, value) in c.iter_mut().zip(color) {
                *channel += *weight as f32 * value;
            }
        }
        Rgba8::new(to_channel(c[0]), to_channel(c[1]), to_channel(c[2]), to_channel(c[3]))
    }

    /// Outline of the triangle grown by half a pixel, so that adjacent
    /// triangles leave no seams.
    pub fn dilated_path(&self) -> VertexList {
        const GROW: f64 = 0.5;
        const MAX_MITER: f64 = 2.0;

        let sign = if self.det > 0.0 { 1.0 } else { -1.0 };
        let p = self.points;
        let normals: [Point; 3] = std::array::from_fn(|i| {
            let a = p[i];
            let b = p[(i + 1) % 3];
            let len = a.distance(b).max(f64::EPSILON);
            Point::new(sign * (b.y - a.y) / len, -sign * (b.x - a.x) / len)
        });

        let mut out = VertexList::new();
        for j in 0..3 {
            let prev = (j + 2) % 3;
            // Offset lines of edges prev -> j and j -> next meet near p[j]
            let a = Point::new(p[prev].x + normals[prev].x * GROW, p[prev].y + normals[prev].y * GROW);
            let u = Point::new(p[j].x - p[prev].x, p[j].y - p[prev].y);
            let b = Point::new(p[j].x + normals[j].x * GROW, p[j].y + normals[j].y * GROW);
            let v = Point::new(p[(j + 1) % 3].x - p[j].x, p[(j + 1) % 3].y - p[j].y);

            let cross = u.x * v.y - u.y * v.x;
            let mut q = if cross.abs() > 1e-12 {
                let s = ((b.x - a.x) * v.y - (b.y - a.y) * v.x) / cross;
                Point::new(a.x + u.x * s, a.y + u.y * s)
            } else {
                b
            };
            let dist = q.distance(p[j]);
            if dist > MAX_MITER {
                let k = MAX_MITER / dist;
                q = Point::new(p[j].x + (q.x - p[j].x) * k, p[j].y + (q.y - p[j].y) * k);
            }
            if j == 0 {
                out.move_to(q.x, q.y);
            } else {
                out.line_to(q.x, q.y);
            }
        }
        out.close();
        out
    }
}

impl SpanGenerator for GouraudSpan {
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]) {
        let cy = y as f64 + 0.5;
        for (i, px) in out.iter_mut().enumerate() {
            *px = self.color_at(x as f64 + i as f64 + 0.5, cy);
        }
    }
}

/// Image resampling filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Samples a transformed image
#[derive(Clone, Debug)]
pub struct ImageSpan<'a> {
    image: &'a PixelBuffer,
    inverse: Affine,
    interpolation: Interpolation,
    alpha: f32,
}

impl<'a> ImageSpan<'a> {
    /// `image_to_device` places image pixel space on the canvas. `None` when
    /// it cannot be inverted.
    pub fn new(image: &'a PixelBuffer, image_to_device: Affine, interpolation: Interpolation) -> Option<Self> {
        Some(Self {
            image,
            inverse: image_to_device.invert()?,
            interpolation,
            alpha: 1.0,
        })
    }

    /// Multiply every sampled alpha by `alpha`.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    fn texel(&self, x: i64, y: i64) -> Option<Rgba8> {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return None;
        }
        self.image.pixel(x as i32, y as i32)
    }

    fn sample(&self, u: f64, v: f64) -> Rgba8 {
        let px = match self.interpolation {
            Interpolation::Nearest => self
                .texel(u.floor() as i64, v.floor() as i64)
                .unwrap_or(Rgba8::TRANSPARENT),
            Interpolation::Bilinear => {
                let [r, g, b, a] = bilinear(u, v, |x, y| match self.texel(x, y) {
                    Some(p) => {
                        let a = p.a as f32 / 255.0;
                        [p.r as f32 * a, p.g as f32 * a, p.b as f32 * a, a]
                    }
                    None => [0.0; 4],
                });
                if a <= 0.0 {
                    Rgba8::TRANSPARENT
                } else {
                    let un = |c: f32| (c / a / 255.0).clamp(0.0, 1.0);
                    Rgba8::new(to_channel(un(r)), to_channel(un(g)), to_channel(un(b)), to_channel(a))
                }
            }
        };
        if self.alpha < 1.0 {
            px.with_alpha((px.a as f32 * self.alpha + 0.5) as u8)
        } else {
            px
        }
    }
}

impl SpanGenerator for ImageSpan<'_> {
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]) {
        let cy = y as f64 + 0.5;
        for (i, px) in out.iter_mut().enumerate() {
            let (u, v) = self.inverse.transform_xy(x as f64 + i as f64 + 0.5, cy);
            *px = self.sample(u, v);
        }
    }
}

/// Repeats a tile across the canvas, anchored at the canvas origin
#[derive(Clone, Debug)]
pub struct PatternSpan<'a> {
    tile: &'a PixelBuffer,
}

impl<'a> PatternSpan<'a> {
    pub fn new(tile: &'a PixelBuffer) -> Self {
        Self { tile }
    }
}

impl SpanGenerator for PatternSpan<'_> {
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]) {
        let w = self.tile.width() as i32;
        let h = self.tile.height() as i32;
        if w == 0 || h == 0 {
            out.fill(Rgba8::TRANSPARENT);
            return;
        }
        let ty = y.rem_euclid(h);
        for (i, px) in out.iter_mut().enumerate() {
            let tx = (x + i as i32).rem_euclid(w);
            *px = self.tile.pixel(tx, ty).unwrap_or(Rgba8::TRANSPARENT);
        }
    }
}

/// Paints one color through a transformed grayscale stencil
#[derive(Clone, Debug)]
pub struct StencilSpan<'a> {
    stencil: &'a [u8],
    width: u32,
    height: u32,
    inverse: Affine,
    color: Rgba8,
}

impl<'a> StencilSpan<'a> {
    /// `stencil` is `width * height` gray values, top row first. `None` when
    /// the sizes disagree or the transform cannot be inverted.
    pub fn new(
        stencil: &'a [u8],
        width: u32,
        height: u32,
        stencil_to_device: Affine,
        color: Rgba8,
    ) -> Option<Self> {
        if stencil.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            stencil,
            width,
            height,
            inverse: stencil_to_device.invert()?,
            color,
        })
    }

    fn value(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.stencil[y as usize * self.width as usize + x as usize] as f32
    }
}

impl SpanGenerator for StencilSpan<'_> {
    fn generate(&mut self, x: i32, y: i32, out: &mut [Rgba8]) {
        let cy = y as f64 + 0.5;
        for (i, px) in out.iter_mut().enumerate() {
            let (u, v) = self.inverse.transform_xy(x as f64 + i as f64 + 0.5, cy);
            let [gray] = bilinear(u, v, |sx, sy| [self.value(sx, sy)]);
            let alpha = self.color.a as f32 * gray / 255.0;
            *px = self.color.with_alpha((alpha + 0.5).clamp(0.0, 255.0) as u8);
        }
    }
}

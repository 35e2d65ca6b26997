//! RGBA pixel buffer
//!
//! Pixels are stored row-major, top row first, with straight (not
//! premultiplied) alpha. A source with alpha `sa` over a destination with
//! alpha `da` blends as
//!
//! ```text
//! out_a = sa + da * (1 - sa)
//! out_c = (sc * sa + dc * da * (1 - sa)) / out_a
//! ```

use bytemuck::{Pod, Zeroable};
use grain_core::{Color, PixelRect};

use crate::error::{RasterError, Result};

/// 8-bit RGBA pixel, straight alpha
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let [r, g, b, a] = color.to_rgba8();
        Self { r, g, b, a }
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Blend `src` over `dst` with an extra 8-bit coverage factor.
#[inline]
pub fn blend_pixel(dst: &mut Rgba8, src: Rgba8, cover: u8) {
    let sa = (src.a as f32 * cover as f32) / (255.0 * 255.0);
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        *dst = src;
        return;
    }

    let da = dst.a as f32 / 255.0;
    let dst_weight = da * (1.0 - sa);
    let out_a = sa + dst_weight;
    let mix = |s: u8, d: u8| ((s as f32 * sa + d as f32 * dst_weight) / out_a + 0.5) as u8;

    *dst = Rgba8 {
        r: mix(src.r, dst.r),
        g: mix(src.g, dst.g),
        b: mix(src.b, dst.b),
        a: (out_a * 255.0 + 0.5) as u8,
    };
}

/// Owned width x height RGBA raster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelBuffer {
    /// Fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba8::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RasterError::DataSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba8] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn row(&self, y: u32) -> &[Rgba8] {
        let w = self.width as usize;
        let start = y as usize * w;
        self.pixels.get(start..start + w).unwrap_or(&[])
    }

    pub fn clear(&mut self, color: Rgba8) {
        self.pixels.fill(color);
    }

    /// Horizontal span of `covers.len()` pixels starting at (x, y), assumed
    /// to lie inside the buffer.
    fn span_mut(&mut self, x: i32, y: i32, len: usize) -> &mut [Rgba8] {
        let start = y as usize * self.width as usize + x as usize;
        &mut self.pixels[start..start + len]
    }

    /// Blend one color over a span with per-pixel coverage.
    pub fn blend_solid_hspan(&mut self, x: i32, y: i32, color: Rgba8, covers: &[u8]) {
        for (dst, &cover) in self.span_mut(x, y, covers.len()).iter_mut().zip(covers) {
            blend_pixel(dst, color, cover);
        }
    }

    /// Blend per-pixel colors over a span with per-pixel coverage.
    pub fn blend_color_hspan(&mut self, x: i32, y: i32, colors: &[Rgba8], covers: &[u8]) {
        let len = covers.len().min(colors.len());
        let span = self.span_mut(x, y, len);
        for ((dst, &src), &cover) in span.iter_mut().zip(colors).zip(covers) {
            blend_pixel(dst, src, cover);
        }
    }

    /// Copy `rect` out of the buffer. Pixels outside the buffer read as zero.
    pub fn copy_rect_to(&self, rect: PixelRect) -> Vec<Rgba8> {
        let w = rect.width() as usize;
        let h = rect.height() as usize;
        let mut out = vec![Rgba8::TRANSPARENT; w * h];

        let visible = rect.intersect(&self.bounds());
        if visible.is_empty() {
            return out;
        }
        for y in visible.y1..visible.y2 {
            let src_start = y as usize * self.width as usize + visible.x1 as usize;
            let len = visible.width() as usize;
            let dst_start = (y - rect.y1) as usize * w + (visible.x1 - rect.x1) as usize;
            out[dst_start..dst_start + len].copy_from_slice(&self.pixels[src_start..src_start + len]);
        }
        out
    }

    /// Copy `src_rect` of a `src_width`-wide pixel block into the buffer with
    /// its top-left corner at (dest_x, dest_y). Parts falling outside either
    /// the source block or the buffer are skipped.
    pub fn copy_rect_from(
        &mut self,
        src: &[Rgba8],
        src_width: u32,
        src_rect: PixelRect,
        dest_x: i32,
        dest_y: i32,
    ) {
        if src_width == 0 {
            return;
        }
        let src_height = (src.len() / src_width as usize) as u32;
        let src_rect = src_rect.intersect(&PixelRect::from_size(src_width, src_height));
        if src_rect.is_empty() {
            return;
        }

        let dx = dest_x - src_rect.x1;
        let dy = dest_y - src_rect.y1;
        let dest = src_rect.offset(dx, dy).intersect(&self.bounds());
        if dest.is_empty() {
            return;
        }

        let len = dest.width() as usize;
        for y in dest.y1..dest.y2 {
            let sy = (y - dy) as usize;
            let sx = (dest.x1 - dx) as usize;
            let src_start = sy * src_width as usize + sx;
            let dst_start = y as usize * self.width as usize + dest.x1 as usize;
            self.pixels[dst_start..dst_start + len].copy_from_slice(&src[src_start..src_start + len]);
        }
    }

    /// Blend a whole pixel block at (dest_x, dest_y) with a uniform coverage,
    /// restricted to `clip`.
    pub fn blend_from(
        &mut self,
        src: &[Rgba8],
        src_width: u32,
        dest_x: i32,
        dest_y: i32,
        cover: u8,
        clip: PixelRect,
    ) {
        if src_width == 0 || cover == 0 {
            return;
        }
        let src_height = (src.len() / src_width as usize) as u32;
        let dest = PixelRect::new(
            dest_x,
            dest_y,
            dest_x + src_width as i32,
            dest_y + src_height as i32,
        )
        .intersect(&clip)
        .intersect(&self.bounds());
        if dest.is_empty() {
            return;
        }

        let len = dest.width() as usize;
        for y in dest.y1..dest.y2 {
            let src_start = (y - dest_y) as usize * src_width as usize + (dest.x1 - dest_x) as usize;
            let row = &src[src_start..src_start + len];
            for (dst, &px) in self.span_mut(dest.x1, y, len).iter_mut().zip(row) {
                blend_pixel(dst, px, cover);
            }
        }
    }

    /// Bounding box of pixels with nonzero alpha, `None` when all are clear.
    pub fn content_extents(&self) -> Option<PixelRect> {
        let w = self.width as usize;
        let mut bounds: Option<PixelRect> = None;
        for (y, row) in self.pixels.chunks(w.max(1)).enumerate() {
            let Some(first) = row.iter().position(|p| p.a != 0) else {
                continue;
            };
            let last = row.iter().rposition(|p| p.a != 0).unwrap_or(first);
            let (x1, x2, y) = (first as i32, last as i32 + 1, y as i32);
            bounds = Some(match bounds {
                None => PixelRect::new(x1, y, x2, y + 1),
                Some(b) => PixelRect::new(b.x1.min(x1), b.y1, b.x2.max(x2), y + 1),
            });
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_replaces() {
        let mut dst = Rgba8::new(255, 255, 255, 0);
        blend_pixel(&mut dst, Rgba8::new(255, 0, 0, 255), 255);
        assert_eq!(dst, Rgba8::new(255, 0, 0, 255));
    }

    #[test]
    fn test_blend_over_transparent_keeps_color() {
        let mut dst = Rgba8::new(255, 255, 255, 0);
        blend_pixel(&mut dst, Rgba8::new(0, 0, 255, 255), 128);
        assert_eq!(dst, Rgba8::new(0, 0, 255, 128));
    }

    #[test]
    fn test_blend_half_over_opaque() {
        let mut dst = Rgba8::new(0, 0, 0, 255);
        blend_pixel(&mut dst, Rgba8::new(255, 255, 255, 255), 128);
        assert_eq!(dst.a, 255);
        assert!((dst.r as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_zero_cover_is_noop() {
        let mut dst = Rgba8::new(1, 2, 3, 4);
        blend_pixel(&mut dst, Rgba8::new(255, 255, 255, 255), 0);
        assert_eq!(dst, Rgba8::new(1, 2, 3, 4));
    }

    #[test]
    fn test_copy_rect_round_trip() {
        let mut buf = PixelBuffer::new(6, 6);
        for (i, p) in buf.pixels_mut().iter_mut().enumerate() {
            *p = Rgba8::new(i as u8, 0, 0, 255);
        }
        let before = buf.clone();
        let rect = PixelRect::new(1, 2, 5, 6);
        let saved = buf.copy_rect_to(rect);
        buf.clear(Rgba8::TRANSPARENT);
        buf.copy_rect_from(&saved, 4, PixelRect::new(0, 0, 4, 4), 1, 2);
        assert_eq!(buf.row(3), before.row(3));
        assert_eq!(buf.pixel(0, 3), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_copy_rect_outside_reads_zero() {
        let mut buf = PixelBuffer::new(2, 2);
        buf.clear(Rgba8::new(9, 9, 9, 9));
        let out = buf.copy_rect_to(PixelRect::new(-1, -1, 1, 1));
        assert_eq!(out, vec![Rgba8::TRANSPARENT, Rgba8::TRANSPARENT, Rgba8::TRANSPARENT, Rgba8::new(9, 9, 9, 9)]);
    }

    #[test]
    fn test_blend_from_clips() {
        let mut buf = PixelBuffer::new(4, 4);
        let src = vec![Rgba8::new(0, 255, 0, 255); 9];
        buf.blend_from(&src, 3, 2, 2, 255, PixelRect::new(0, 0, 3, 4));
        assert_eq!(buf.pixel(2, 2), Some(Rgba8::new(0, 255, 0, 255)));
        assert_eq!(buf.pixel(3, 2), Some(Rgba8::TRANSPARENT));
        assert_eq!(buf.pixel(2, 3), Some(Rgba8::new(0, 255, 0, 255)));
    }

    #[test]
    fn test_content_extents() {
        let mut buf = PixelBuffer::new(8, 8);
        assert_eq!(buf.content_extents(), None);
        buf.set_pixel(2, 3, Rgba8::new(0, 0, 0, 10));
        buf.set_pixel(5, 6, Rgba8::new(0, 0, 0, 10));
        assert_eq!(buf.content_extents(), Some(PixelRect::new(2, 3, 6, 7)));
    }
}

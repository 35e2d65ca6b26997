//! Scanline renderers
//!
//! Span sinks that blend coverage into a [`PixelBuffer`], either with one
//! solid color or with per-pixel colors from a [`SpanGenerator`]. Both clip to
//! a pixel box and optionally gate coverage through an [`AlphaMask`].

use grain_core::PixelRect;

use crate::mask::AlphaMask;
use crate::pixel::{PixelBuffer, Rgba8};
use crate::rasterizer::SpanSink;
use crate::span::SpanGenerator;

/// Trim a span to `clip`, returning the new start x and covers.
fn clip_span<'c>(clip: &PixelRect, y: i32, x: i32, covers: &'c [u8]) -> Option<(i32, &'c [u8])> {
    if y < clip.y1 || y >= clip.y2 {
        return None;
    }
    let end = x + covers.len() as i32;
    let start = x.max(clip.x1);
    let stop = end.min(clip.x2);
    if start >= stop {
        return None;
    }
    let from = (start - x) as usize;
    let to = (stop - x) as usize;
    Some((start, &covers[from..to]))
}

/// Blends a single color
pub struct SolidRenderer<'a> {
    buffer: &'a mut PixelBuffer,
    color: Rgba8,
    clip: PixelRect,
    mask: Option<&'a AlphaMask>,
    scratch: Vec<u8>,
}

impl<'a> SolidRenderer<'a> {
    pub fn new(buffer: &'a mut PixelBuffer, color: Rgba8, clip: PixelRect) -> Self {
        let clip = clip.intersect(&buffer.bounds());
        Self {
            buffer,
            color,
            clip,
            mask: None,
            scratch: Vec::new(),
        }
    }

    pub fn with_mask(mut self, mask: Option<&'a AlphaMask>) -> Self {
        self.mask = mask;
        self
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.color = color;
    }

    pub fn color(&self) -> Rgba8 {
        self.color
    }
}

impl SpanSink for SolidRenderer<'_> {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
        if self.color.a == 0 {
            return;
        }
        let Some((x, covers)) = clip_span(&self.clip, y, x, covers) else {
            return;
        };
        match self.mask {
            Some(mask) => {
                self.scratch.clear();
                self.scratch.extend_from_slice(covers);
                mask.apply(x, y, &mut self.scratch);
                self.buffer.blend_solid_hspan(x, y, self.color, &self.scratch);
            }
            None => self.buffer.blend_solid_hspan(x, y, self.color, covers),
        }
    }
}

/// Blends colors produced per pixel by a generator
pub struct SpanRenderer<'a, G> {
    buffer: &'a mut PixelBuffer,
    generator: G,
    clip: PixelRect,
    mask: Option<&'a AlphaMask>,
    colors: Vec<Rgba8>,
    scratch: Vec<u8>,
}

impl<'a, G: SpanGenerator> SpanRenderer<'a, G> {
    pub fn new(buffer: &'a mut PixelBuffer, generator: G, clip: PixelRect) -> Self {
        let clip = clip.intersect(&buffer.bounds());
        Self {
            buffer,
            generator,
            clip,
            mask: None,
            colors: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn with_mask(mut self, mask: Option<&'a AlphaMask>) -> Self {
        self.mask = mask;
        self
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }
}

impl<G: SpanGenerator> SpanSink for SpanRenderer<'_, G> {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
        let Some((x, covers)) = clip_span(&self.clip, y, x, covers) else {
            return;
        };
        self.colors.clear();
        self.colors.resize(covers.len(), Rgba8::TRANSPARENT);
        self.generator.generate(x, y, &mut self.colors);

        match self.mask {
            Some(mask) => {
                self.scratch.clear();
                self.scratch.extend_from_slice(covers);
                mask.apply(x, y, &mut self.scratch);
                self.buffer.blend_color_hspan(x, y, &self.colors, &self.scratch);
            }
            None => self.buffer.blend_color_hspan(x, y, &self.colors, covers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rasterizer;
    use grain_core::Path;

    struct Gradient;

    impl SpanGenerator for Gradient {
        fn generate(&mut self, x: i32, _y: i32, out: &mut [Rgba8]) {
            for (i, px) in out.iter_mut().enumerate() {
                *px = Rgba8::new(((x + i as i32) * 10) as u8, 0, 0, 255);
            }
        }
    }

    #[test]
    fn test_solid_respects_clip() {
        let mut buffer = PixelBuffer::new(8, 8);
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 8.0, 8.0).iter());
        let mut renderer =
            SolidRenderer::new(&mut buffer, Rgba8::new(0, 0, 255, 255), PixelRect::new(2, 2, 4, 4));
        ras.sweep(&mut renderer);
        assert_eq!(buffer.pixel(2, 2), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(buffer.pixel(4, 2), Some(Rgba8::TRANSPARENT));
        assert_eq!(buffer.pixel(2, 1), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_solid_with_mask() {
        let mut mask = AlphaMask::new(8, 8);
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 3.0, 8.0).iter());
        ras.sweep(&mut mask);

        let mut buffer = PixelBuffer::new(8, 8);
        let clip = buffer.bounds();
        ras.reset();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 8.0, 8.0).iter());
        let mut renderer =
            SolidRenderer::new(&mut buffer, Rgba8::new(0, 255, 0, 255), clip).with_mask(Some(&mask));
        ras.sweep(&mut renderer);
        assert_eq!(buffer.pixel(1, 1), Some(Rgba8::new(0, 255, 0, 255)));
        assert_eq!(buffer.pixel(5, 1), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn test_span_renderer_uses_generator() {
        let mut buffer = PixelBuffer::new(4, 1);
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(0.0, 0.0, 4.0, 1.0).iter());
        let clip = buffer.bounds();
        ras.sweep(&mut SpanRenderer::new(&mut buffer, Gradient, clip));
        assert_eq!(buffer.pixel(3, 0), Some(Rgba8::new(30, 0, 0, 255)));
    }
}

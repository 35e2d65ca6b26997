//! 8-bit alpha mask
//!
//! Rendering into the mask accumulates coverage like an alpha-only canvas.
//! Renderers holding a mask scale their covers by the mask value under each
//! pixel, which is how arbitrary clip paths are applied.

use grain_core::PixelRect;

use crate::rasterizer::SpanSink;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// Empty mask, every pixel blocked.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mask value at (x, y), zero outside the mask.
    pub fn value(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Scale `covers` of the span starting at (x, y) by the mask.
    pub fn apply(&self, x: i32, y: i32, covers: &mut [u8]) {
        for (i, cover) in covers.iter_mut().enumerate() {
            let m = self.value(x + i as i32, y) as u32;
            *cover = ((*cover as u32 * m + 127) / 255) as u8;
        }
    }
}

impl SpanSink for AlphaMask {
    fn blend_span(&mut self, y: i32, x: i32, covers: &[u8]) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let row = y as usize * self.width as usize;
        for (i, &cover) in covers.iter().enumerate() {
            let px = x + i as i32;
            if px < 0 || px >= self.width as i32 {
                continue;
            }
            let dst = &mut self.data[row + px as usize];
            let add = ((255 - *dst as u32) * cover as u32 + 127) / 255;
            *dst = (*dst as u32 + add) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rasterizer;
    use grain_core::Path;

    #[test]
    fn test_rendered_mask_gates_covers() {
        let mut mask = AlphaMask::new(8, 8);
        let mut ras = Rasterizer::new();
        ras.add_path(&mut Path::rectangle(2.0, 2.0, 6.0, 6.0).iter());
        ras.sweep(&mut mask);

        assert_eq!(mask.value(3, 3), 255);
        assert_eq!(mask.value(1, 1), 0);
        assert_eq!(mask.value(-1, 3), 0);

        let mut covers = [255u8, 255, 255, 128];
        mask.apply(0, 3, &mut covers);
        assert_eq!(covers, [0, 0, 255, 128]);
    }

    #[test]
    fn test_partial_coverage_accumulates() {
        let mut mask = AlphaMask::new(2, 1);
        mask.blend_span(0, 0, &[128]);
        assert_eq!(mask.value(0, 0), 128);
        mask.blend_span(0, 0, &[128]);
        assert_eq!(mask.value(0, 0), 192);
    }
}

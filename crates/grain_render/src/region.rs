//! Saved canvas regions

use grain_core::PixelRect;
use grain_raster::Rgba8;

/// Owned snapshot of a pixel rectangle of a canvas
///
/// The rectangle is in canvas rows (y down). Parts that were outside the
/// canvas when copied hold transparent black and are skipped on restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferRegion {
    rect: PixelRect,
    pixels: Vec<Rgba8>,
}

impl BufferRegion {
    pub(crate) fn new(rect: PixelRect, pixels: Vec<Rgba8>) -> Self {
        debug_assert_eq!(pixels.len(), (rect.width().max(0) * rect.height().max(0)) as usize);
        Self { rect, pixels }
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// `(x1, y1, x2, y2)` of the region.
    pub fn extents(&self) -> (i32, i32, i32, i32) {
        (self.rect.x1, self.rect.y1, self.rect.x2, self.rect.y2)
    }

    pub fn width(&self) -> u32 {
        self.rect.width().max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.rect.height().max(0) as u32
    }

    pub fn stride(&self) -> usize {
        self.width() as usize * 4
    }

    /// Move the region so that a plain restore writes it at (x, y).
    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.rect = self.rect.offset(x - self.rect.x1, y - self.rect.y1);
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixels as ARGB bytes.
    pub fn to_argb(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| [p.a, p.r, p.g, p.b])
            .collect()
    }
}

//! Raster draw calls: RGBA images and grayscale text stencils

use grain_core::{Affine, ArrayView, VertexList};
use grain_raster::{Coverage, ImageSpan, Interpolation, PixelBuffer, Rgba8, SpanRenderer, StencilSpan};

use crate::error::Result;
use crate::gc::GraphicsContext;
use crate::renderer::Renderer;

/// Outline of a `width` x `height` rectangle at the origin, mapped by `transform`.
fn image_outline(width: usize, height: usize, transform: &Affine) -> VertexList {
    let (w, h) = (width as f64, height as f64);
    let mut outline = VertexList::new();
    for (i, (x, y)) in [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].into_iter().enumerate() {
        let (x, y) = transform.transform_xy(x, y);
        if i == 0 {
            outline.move_to(x, y);
        } else {
            outline.line_to(x, y);
        }
    }
    outline.close();
    outline
}

/// Copy an H x W x 4 byte array into a pixel buffer. Data row 0 is the
/// bottom of the image, so rows are reversed into buffer order.
fn to_pixel_buffer(image: &ArrayView<'_, u8>) -> Result<PixelBuffer> {
    image.expect_shape("image", &[None, None, Some(4)])?;
    let width = image.dim(1);
    let pixels: &[Rgba8] = bytemuck::cast_slice(image.data());
    let flipped = if width == 0 {
        Vec::new()
    } else {
        pixels.chunks_exact(width).rev().flatten().copied().collect()
    };
    Ok(PixelBuffer::from_pixels(
        width as u32,
        image.dim(0) as u32,
        flipped,
    )?)
}

impl Renderer {
    /// Blend an RGBA image (H x W x 4, bottom row first) with its bottom-left
    /// corner at display position (x, y), scaled by the context alpha.
    pub fn draw_image(
        &mut self,
        gc: &GraphicsContext<'_>,
        x: f64,
        y: f64,
        image: &ArrayView<'_, u8>,
    ) -> Result<()> {
        let source = to_pixel_buffer(image)?;
        if source.width() == 0 || source.height() == 0 {
            return Ok(());
        }
        tracing::debug!(
            "draw_image: {}x{} at ({}, {})",
            source.width(),
            source.height(),
            x,
            y
        );

        let left = x as i32;
        let top = (self.height() as f64 - (y + source.height() as f64)) as i32;
        let alpha = gc.alpha.clamp(0.0, 1.0);

        let mut scope = self.begin_draw(gc);
        if !scope.has_clip_path {
            let clip = scope.clip;
            scope.buffer.blend_from(
                source.pixels(),
                source.width(),
                left,
                top,
                (alpha * 255.0) as u8,
                clip,
            );
            return Ok(());
        }

        let placement = Affine::translation(left as f64, top as f64);
        let Some(span) = ImageSpan::new(&source, placement, Interpolation::Nearest) else {
            return Ok(());
        };
        let r: &mut Renderer = &mut scope;
        r.rasterizer.set_coverage(Coverage::AntiAliased);
        r.rasterizer.add_path(&mut image_outline(
            source.width() as usize,
            source.height() as usize,
            &placement,
        ));
        let mut renderer =
            SpanRenderer::new(&mut r.buffer, span.with_alpha(alpha), r.clip).with_mask(r.mask.as_ref());
        r.rasterizer.sweep(&mut renderer);
        Ok(())
    }

    /// Draw an RGBA image resampled into the display box `(x, y, w, h)`,
    /// which is then mapped by `transform`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image_transformed(
        &mut self,
        gc: &GraphicsContext<'_>,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        transform: &Affine,
        image: &ArrayView<'_, u8>,
        interpolation: Interpolation,
    ) -> Result<()> {
        let source = to_pixel_buffer(image)?;
        if source.width() == 0 || source.height() == 0 {
            return Ok(());
        }
        let (iw, ih) = (source.width() as f64, source.height() as f64);
        let placement = self.to_device(
            &Affine::scale(1.0, -1.0)
                .then_translate(0.0, ih)
                .then_scale(w / iw, h / ih)
                .then_translate(x, y)
                .then(transform),
        );
        let Some(span) = ImageSpan::new(&source, placement, interpolation) else {
            tracing::warn!("draw_image_transformed: singular placement, nothing drawn");
            return Ok(());
        };
        tracing::debug!("draw_image_transformed: {}x{} into {}x{}", iw, ih, w, h);

        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;
        let r: &mut Renderer = &mut scope;
        r.rasterizer.set_coverage(Coverage::AntiAliased);
        r.rasterizer.add_path(&mut image_outline(
            source.width() as usize,
            source.height() as usize,
            &placement,
        ));
        let mask = r.mask.as_ref().filter(|_| has_clip_path);
        let mut renderer =
            SpanRenderer::new(&mut r.buffer, span.with_alpha(gc.alpha), r.clip).with_mask(mask);
        r.rasterizer.sweep(&mut renderer);
        Ok(())
    }

    /// Paint the context color through a grayscale H x W glyph bitmap.
    ///
    /// (x, y) is the canvas pixel of the bitmap's bottom-left corner and the
    /// bitmap is rotated counter-clockwise by `angle` degrees around it.
    pub fn draw_text_image(
        &mut self,
        gc: &GraphicsContext<'_>,
        image: &ArrayView<'_, u8>,
        x: i32,
        y: i32,
        angle: f64,
    ) -> Result<()> {
        image.expect_shape("image", &[None, None])?;
        let (rows, cols) = (image.dim(0), image.dim(1));
        if rows == 0 || cols == 0 {
            return Ok(());
        }

        let placement = Affine::translation(0.0, -(rows as f64))
            .then(&Affine::rotation_degrees(-angle))
            .then_translate(x as f64, y as f64);
        let color: Rgba8 = gc.effective_color().into();
        let Some(span) = StencilSpan::new(image.data(), cols as u32, rows as u32, placement, color)
        else {
            return Ok(());
        };
        tracing::debug!("draw_text_image: {}x{} at ({}, {}) angle {}", cols, rows, x, y, angle);

        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;
        let r: &mut Renderer = &mut scope;
        r.rasterizer.set_coverage(Coverage::AntiAliased);
        r.rasterizer.add_path(&mut image_outline(cols, rows, &placement));
        let mask = r.mask.as_ref().filter(|_| has_clip_path);
        let mut renderer = SpanRenderer::new(&mut r.buffer, span, r.clip).with_mask(mask);
        r.rasterizer.sweep(&mut renderer);
        Ok(())
    }
}

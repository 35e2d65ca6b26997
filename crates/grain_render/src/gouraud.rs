//! Gouraud-shaded triangles

use grain_core::{Affine, ArrayView, Color, Point, ShapeError};
use grain_raster::{Coverage, GouraudSpan, SpanRenderer};

use crate::error::Result;
use crate::gc::GraphicsContext;
use crate::renderer::Renderer;

impl Renderer {
    /// Draw one triangle with per-vertex colors linearly interpolated across
    /// it. `points` is 3 x 2 display coordinates, `colors` is 3 x 4 RGBA.
    pub fn draw_gouraud_triangle(
        &mut self,
        gc: &GraphicsContext<'_>,
        points: &ArrayView<'_, f64>,
        colors: &ArrayView<'_, f64>,
        transform: &Affine,
    ) -> Result<()> {
        points.expect_shape("points", &[Some(3), Some(2)])?;
        colors.expect_shape("colors", &[Some(3), Some(4)])?;
        self.draw_triangles(gc, points.data(), colors.data(), 1, transform)
    }

    /// Draw N triangles; `points` is N x 3 x 2 and `colors` N x 3 x 4.
    pub fn draw_gouraud_triangles(
        &mut self,
        gc: &GraphicsContext<'_>,
        points: &ArrayView<'_, f64>,
        colors: &ArrayView<'_, f64>,
        transform: &Affine,
    ) -> Result<()> {
        points.expect_shape("points", &[None, Some(3), Some(2)])?;
        colors.expect_shape("colors", &[None, Some(3), Some(4)])?;
        if points.len() != colors.len() {
            return Err(ShapeError::LengthMismatch {
                first: "points".to_string(),
                second: "colors".to_string(),
            }
            .into());
        }
        self.draw_triangles(gc, points.data(), colors.data(), points.len(), transform)
    }

    fn draw_triangles(
        &mut self,
        gc: &GraphicsContext<'_>,
        points: &[f64],
        colors: &[f64],
        count: usize,
        transform: &Affine,
    ) -> Result<()> {
        let device = self.to_device(transform);
        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;
        let r: &mut Renderer = &mut scope;

        let mut skipped = 0usize;
        for (tri, rgba) in points.chunks_exact(6).zip(colors.chunks_exact(12)).take(count) {
            let corners: [Point; 3] = std::array::from_fn(|i| {
                device.transform_point(Point::new(tri[2 * i], tri[2 * i + 1]))
            });
            let shades: [Color; 3] = std::array::from_fn(|i| Color::from_slice(&rgba[4 * i..4 * i + 4]));
            let Some(span) = GouraudSpan::new(corners, shades) else {
                skipped += 1;
                continue;
            };

            r.rasterizer.reset();
            r.rasterizer.set_coverage(Coverage::AntiAliased);
            r.rasterizer.add_path(&mut span.dilated_path());
            let mask = r.mask.as_ref().filter(|_| has_clip_path);
            let mut renderer = SpanRenderer::new(&mut r.buffer, span, r.clip).with_mask(mask);
            r.rasterizer.sweep(&mut renderer);
        }
        if skipped > 0 {
            tracing::debug!("skipped {} degenerate gouraud triangles", skipped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[test]
    fn test_shape_errors() {
        let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
        let gc = GraphicsContext::new();
        let points = [[0.0, 0.0], [5.0, 0.0]];
        let colors = [[1.0, 0.0, 0.0, 1.0]; 3];
        let err = renderer
            .draw_gouraud_triangle(
                &gc,
                &ArrayView::from_rows(&points),
                &ArrayView::from_rows(&colors),
                &Affine::IDENTITY,
            )
            .unwrap_err();
        assert!(err.to_string().contains("points array must be 3x2"), "{err}");
    }

    #[test]
    fn test_batch_length_mismatch() {
        let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
        let points = [[[0.0, 0.0], [5.0, 0.0], [0.0, 5.0]]; 2];
        let colors = [[[1.0, 0.0, 0.0, 1.0]; 3]];
        let err = renderer
            .draw_gouraud_triangles(
                &GraphicsContext::new(),
                &ArrayView::from_matrices(&points),
                &ArrayView::from_matrices(&colors),
                &Affine::IDENTITY,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Shape(ShapeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
        let points = [[1.0, 1.0], [5.0, 5.0], [9.0, 9.0]];
        let colors = [[1.0, 0.0, 0.0, 1.0]; 3];
        renderer
            .draw_gouraud_triangle(
                &GraphicsContext::new(),
                &ArrayView::from_rows(&points),
                &ArrayView::from_rows(&colors),
                &Affine::IDENTITY,
            )
            .unwrap();
        assert_eq!(renderer.content_extents(), None);
    }
}

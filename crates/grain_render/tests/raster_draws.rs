use grain_core::{Affine, ArrayView, Color, Path};
use grain_render::{GraphicsContext, Interpolation, Renderer, Rgba8};

#[test]
fn markers_are_stamped_at_each_vertex() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let marker = Path::rectangle(-1.0, -1.0, 1.0, 1.0);
    let points = Path::polyline(&[(3.0, 3.0), (f64::NAN, f64::NAN), (7.0, 7.0)]);
    let gc = GraphicsContext::new().with_line_width(0.0);
    renderer
        .draw_markers(
            &gc,
            &marker,
            &Affine::IDENTITY,
            &points,
            &Affine::IDENTITY,
            Some(Color::RED),
        )
        .unwrap();

    let red = Some(Rgba8::new(255, 0, 0, 255));
    // (3, 3) lands on row 7, (7, 7) on row 3
    assert_eq!(renderer.pixel(2, 6), red);
    assert_eq!(renderer.pixel(3, 7), red);
    assert_eq!(renderer.pixel(6, 2), red);
    assert_eq!(renderer.pixel(7, 3), red);
    assert_eq!(renderer.pixel(4, 7).unwrap().a, 0);
    assert_eq!(renderer.pixel(5, 5).unwrap().a, 0);
}

#[test]
fn markers_off_canvas_are_culled() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let marker = Path::rectangle(-1.0, -1.0, 1.0, 1.0);
    let points = Path::polyline(&[(-50.0, 5.0), (500.0, 5.0)]);
    renderer
        .draw_markers(
            &GraphicsContext::new(),
            &marker,
            &Affine::IDENTITY,
            &points,
            &Affine::IDENTITY,
            Some(Color::RED),
        )
        .unwrap();
    assert_eq!(renderer.content_extents(), None);
}

#[test]
fn image_row_zero_is_the_bottom_row() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let mut data = Vec::new();
    for row in [[255, 0, 0, 255], [0, 255, 0, 255]] {
        data.extend_from_slice(&row);
        data.extend_from_slice(&row);
    }
    let image = ArrayView::new(&data, &[2, 2, 4]).unwrap();
    renderer
        .draw_image(&GraphicsContext::new(), 1.0, 1.0, &image)
        .unwrap();

    // Bottom-left at display (1, 1): data row 0 on canvas row 10 - 1 - 1
    assert_eq!(renderer.pixel(1, 8), Some(Rgba8::new(255, 0, 0, 255)));
    assert_eq!(renderer.pixel(2, 7), Some(Rgba8::new(0, 255, 0, 255)));
    assert_eq!(renderer.pixel(3, 7).unwrap().a, 0);
    assert_eq!(renderer.pixel(1, 6).unwrap().a, 0);
    assert_eq!(renderer.pixel(1, 9).unwrap().a, 0);
}

#[test]
fn transformed_image_row_zero_is_the_bottom_row() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let data = [255u8, 0, 0, 255, 0, 255, 0, 255];
    let image = ArrayView::new(&data, &[2, 1, 4]).unwrap();
    renderer
        .draw_image_transformed(
            &GraphicsContext::new(),
            2.0,
            2.0,
            4.0,
            4.0,
            &Affine::IDENTITY,
            &image,
            Interpolation::Nearest,
        )
        .unwrap();

    // Display box y 2..6 covers canvas rows 4..8, red in the lower half
    assert_eq!(renderer.pixel(3, 7), Some(Rgba8::new(255, 0, 0, 255)));
    assert_eq!(renderer.pixel(3, 5), Some(Rgba8::new(0, 255, 0, 255)));
}

#[test]
fn image_respects_clip_path() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let data = [255u8; 10 * 10 * 4];
    let image = ArrayView::new(&data, &[10, 10, 4]).unwrap();
    let clip = Path::rectangle(0.0, 0.0, 5.0, 10.0);
    let gc = GraphicsContext::new().with_clip_path(&clip, Affine::IDENTITY);
    renderer.draw_image(&gc, 0.0, 0.0, &image).unwrap();

    assert_eq!(renderer.pixel(2, 5).unwrap().a, 255);
    assert_eq!(renderer.pixel(7, 5).unwrap().a, 0);
}

#[test]
fn transformed_image_fills_its_box() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let data = [0u8, 0, 255, 255];
    let image = ArrayView::new(&data, &[1, 1, 4]).unwrap();
    renderer
        .draw_image_transformed(
            &GraphicsContext::new(),
            2.0,
            2.0,
            4.0,
            4.0,
            &Affine::IDENTITY,
            &image,
            Interpolation::Nearest,
        )
        .unwrap();

    assert_eq!(renderer.pixel(3, 5), Some(Rgba8::new(0, 0, 255, 255)));
    assert_eq!(renderer.pixel(7, 5).unwrap().a, 0);
}

#[test]
fn text_bitmap_uses_context_color() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let glyph = [255u8; 6];
    let image = ArrayView::new(&glyph, &[2, 3]).unwrap();
    let gc = GraphicsContext::new().with_color(Color::GREEN);
    renderer.draw_text_image(&gc, &image, 2, 5, 0.0).unwrap();

    // Two rows ending at row 5, three columns from column 2
    let inside = renderer.pixel(3, 4).unwrap();
    assert!(inside.a > 200, "alpha {}", inside.a);
    assert_eq!(inside.g, 255);
    assert_eq!(renderer.pixel(5, 4).unwrap().a, 0);
    assert_eq!(renderer.pixel(3, 6).unwrap().a, 0);
}

#[test]
fn gouraud_centroid_mixes_corner_colors() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let points = [[1.0, 1.0], [9.0, 1.0], [1.0, 9.0]];
    let colors = [
        [1.0, 0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
        [0.0, 0.0, 1.0, 1.0],
    ];
    renderer
        .draw_gouraud_triangle(
            &GraphicsContext::new(),
            &ArrayView::from_rows(&points),
            &ArrayView::from_rows(&colors),
            &Affine::IDENTITY,
        )
        .unwrap();

    // Centroid (11/3, 11/3) is in column 3, row 6
    let c = renderer.pixel(3, 6).unwrap();
    assert_eq!(c.a, 255);
    for channel in [c.r, c.g, c.b] {
        assert!((60..=110).contains(&channel), "{c:?}");
    }
}

#[test]
fn gouraud_batch_draws_every_triangle() {
    let mut renderer = Renderer::new(20, 10, 72.0).unwrap();
    let points = [
        [[1.0, 1.0], [9.0, 1.0], [1.0, 9.0]],
        [[11.0, 1.0], [19.0, 1.0], [11.0, 9.0]],
    ];
    let colors = [[[1.0, 0.0, 0.0, 1.0]; 3], [[0.0, 0.0, 1.0, 1.0]; 3]];
    renderer
        .draw_gouraud_triangles(
            &GraphicsContext::new(),
            &ArrayView::from_matrices(&points),
            &ArrayView::from_matrices(&colors),
            &Affine::IDENTITY,
        )
        .unwrap();

    assert_eq!(renderer.pixel(3, 6), Some(Rgba8::new(255, 0, 0, 255)));
    assert_eq!(renderer.pixel(13, 6), Some(Rgba8::new(0, 0, 255, 255)));
}

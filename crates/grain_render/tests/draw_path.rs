use grain_core::{Affine, Color, Path, Rect};
use grain_render::{Dashes, GraphicsContext, Hatch, Renderer, RendererConfig, Rgba8, SnapMode};

const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

fn fill_gc<'a>() -> GraphicsContext<'a> {
    GraphicsContext::new().with_line_width(0.0)
}

#[test]
fn filled_rect_antialiased_has_soft_edges() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let gc = fill_gc().with_snap_mode(SnapMode::Off);
    let rect = Path::rectangle(2.5, 2.5, 7.5, 7.5);
    renderer
        .draw_path(&gc, &rect, &Affine::IDENTITY, Some(Color::RED))
        .unwrap();

    for y in 3..7 {
        for x in 3..7 {
            assert_eq!(renderer.pixel(x, y), Some(RED), "pixel ({x}, {y})");
        }
    }
    let edge = renderer.pixel(2, 5).unwrap();
    assert!((120..=136).contains(&edge.a), "edge alpha {}", edge.a);
    assert_eq!(edge.r, 255);
    let corner = renderer.pixel(2, 2).unwrap();
    assert!((56..=72).contains(&corner.a), "corner alpha {}", corner.a);
    assert_eq!(renderer.pixel(1, 5).unwrap().a, 0);
}

#[test]
fn filled_rect_binary_has_hard_edges() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let gc = fill_gc().with_antialias(false);
    let rect = Path::rectangle(2.0, 2.0, 8.0, 8.0);
    renderer
        .draw_path(&gc, &rect, &Affine::IDENTITY, Some(Color::RED))
        .unwrap();

    for y in 0..10 {
        for x in 0..10 {
            let inside = (2..8).contains(&x) && (2..8).contains(&y);
            let alpha = renderer.pixel(x, y).unwrap().a;
            assert_eq!(alpha, if inside { 255 } else { 0 }, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn transform_commutes_with_rasterization() {
    let points = [(1.0, 1.0), (6.0, 2.0), (3.0, 8.0)];
    let transform = Affine::rotation_degrees(10.0).then_translate(1.0, 0.5);
    let gc = fill_gc();

    let mut transformed = Renderer::new(12, 12, 72.0).unwrap();
    transformed
        .draw_path(&gc, &Path::polygon(&points), &transform, Some(Color::BLUE))
        .unwrap();

    let moved: Vec<_> = points
        .iter()
        .map(|&(x, y)| transform.transform_xy(x, y))
        .collect();
    let mut direct = Renderer::new(12, 12, 72.0).unwrap();
    direct
        .draw_path(&gc, &Path::polygon(&moved), &Affine::IDENTITY, Some(Color::BLUE))
        .unwrap();

    for (a, b) in transformed.as_bytes().iter().zip(direct.as_bytes()) {
        assert!(a.abs_diff(*b) <= 1, "{a} vs {b}");
    }
}

#[test]
fn nan_vertex_splits_the_path() {
    let gc = GraphicsContext::new()
        .with_line_width(1.0)
        .with_snap_mode(SnapMode::Off);

    let broken = Path::polyline(&[(1.0, 1.0), (4.0, 8.0), (f64::NAN, f64::NAN), (6.0, 2.0), (9.0, 9.0)]);
    let mut with_nan = Renderer::new(10, 10, 72.0).unwrap();
    with_nan
        .draw_path(&gc, &broken, &Affine::IDENTITY, None)
        .unwrap();

    let split = Path::builder()
        .move_to(1.0, 1.0)
        .line_to(4.0, 8.0)
        .move_to(6.0, 2.0)
        .line_to(9.0, 9.0)
        .build();
    let mut two_parts = Renderer::new(10, 10, 72.0).unwrap();
    two_parts
        .draw_path(&gc, &split, &Affine::IDENTITY, None)
        .unwrap();

    assert_eq!(with_nan.as_bytes(), two_parts.as_bytes());
    assert!(with_nan.content_extents().is_some());
}

#[test]
fn clip_rect_limits_drawing() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let gc = fill_gc().with_clip_rect(Rect::new(0.0, 0.0, 5.0, 10.0));
    let full = Path::rectangle(0.0, 0.0, 10.0, 10.0);
    renderer
        .draw_path(&gc, &full, &Affine::IDENTITY, Some(Color::RED))
        .unwrap();

    assert_eq!(renderer.pixel(4, 5), Some(RED));
    assert_eq!(renderer.pixel(5, 5).unwrap().a, 0);

    // The clip box does not outlive the call
    renderer
        .draw_path(&fill_gc(), &full, &Affine::IDENTITY, Some(Color::RED))
        .unwrap();
    assert_eq!(renderer.pixel(9, 5), Some(RED));
}

#[test]
fn clip_path_masks_drawing() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let clip = Path::rectangle(0.0, 0.0, 10.0, 4.0);
    let gc = fill_gc().with_clip_path(&clip, Affine::IDENTITY);
    let full = Path::rectangle(0.0, 0.0, 10.0, 10.0);
    renderer
        .draw_path(&gc, &full, &Affine::IDENTITY, Some(Color::RED))
        .unwrap();

    // Display y 0..4 is rows 6..10
    assert_eq!(renderer.pixel(5, 7), Some(RED));
    assert_eq!(renderer.pixel(5, 5).unwrap().a, 0);

    // Same clip again hits the cached mask
    renderer
        .draw_path(&gc, &full, &Affine::IDENTITY, Some(Color::BLUE))
        .unwrap();
    assert_eq!(renderer.pixel(5, 7), Some(Rgba8::new(0, 0, 255, 255)));
    assert_eq!(renderer.pixel(5, 2).unwrap().a, 0);
}

#[test]
fn dashed_stroke_leaves_gaps() {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let gc = GraphicsContext::new()
        .with_line_width(1.0)
        .with_snap_mode(SnapMode::Off)
        .with_dashes(Dashes::new(0.0, vec![(2.0, 2.0)]));
    let line = Path::polyline(&[(0.0, 5.5), (10.0, 5.5)]);
    renderer
        .draw_path(&gc, &line, &Affine::IDENTITY, None)
        .unwrap();

    // Device row 4 holds the line; dashes on 0..2 and 4..6, off 2..4
    assert_eq!(renderer.pixel(1, 4).unwrap().a, 255);
    assert_eq!(renderer.pixel(3, 4).unwrap().a, 0);
    assert_eq!(renderer.pixel(5, 4).unwrap().a, 255);
    assert_eq!(renderer.pixel(1, 3).unwrap().a, 0);
}

#[test]
fn hatch_is_tiled_over_the_fill_area() {
    let config = RendererConfig {
        hatch_size: 8,
        ..RendererConfig::default()
    };
    let mut renderer = Renderer::with_config(10, 10, 72.0, config).unwrap();
    let hatch_path = Path::polyline(&[(0.0, 0.5), (1.0, 0.5)]);
    let gc = fill_gc().with_hatch(Hatch::new(&hatch_path, Color::BLUE));
    let full = Path::rectangle(0.0, 0.0, 10.0, 10.0);
    renderer
        .draw_path(&gc, &full, &Affine::IDENTITY, None)
        .unwrap();

    // The tile line sits across tile rows 3 and 4
    let on_line = renderer.pixel(5, 3).unwrap();
    assert!(on_line.a > 0);
    assert_eq!(on_line.b, 255);
    assert_eq!(renderer.pixel(5, 0).unwrap().a, 0);
    assert_eq!(renderer.pixel(5, 6).unwrap().a, 0);
}

use grain_core::{Affine, Color, Path, PixelRect, Rect};
use grain_render::{GraphicsContext, Renderer, RendererConfig, Rgba8};

fn painted() -> Renderer {
    let mut renderer = Renderer::new(10, 10, 72.0).unwrap();
    let gc = GraphicsContext::new().with_line_width(0.0);
    let triangle = Path::polygon(&[(0.5, 0.5), (9.5, 2.0), (4.0, 9.0)]);
    renderer
        .draw_path(&gc, &triangle, &Affine::IDENTITY, Some(Color::rgba(0.2, 0.4, 0.6, 0.8)))
        .unwrap();
    renderer
}

#[test]
fn copy_then_restore_is_identity() {
    let mut renderer = painted();
    let before = renderer.as_bytes().to_vec();
    let region = renderer.copy_from_bbox(&Rect::new(1.0, 1.0, 8.0, 8.0));
    renderer.restore_region(&region);
    assert_eq!(renderer.as_bytes(), before.as_slice());
}

#[test]
fn restore_undoes_later_drawing() {
    let mut renderer = painted();
    let bbox = Rect::new(2.0, 2.0, 6.0, 6.0);
    let saved = renderer.copy_from_bbox(&bbox);
    assert_eq!((saved.width(), saved.height()), (4, 4));

    let gc = GraphicsContext::new().with_line_width(0.0);
    renderer
        .draw_path(
            &gc,
            &Path::rectangle(0.0, 0.0, 10.0, 10.0),
            &Affine::IDENTITY,
            Some(Color::RED),
        )
        .unwrap();
    assert_ne!(renderer.copy_from_bbox(&bbox), saved);

    renderer.restore_region(&saved);
    assert_eq!(renderer.copy_from_bbox(&bbox), saved);
}

#[test]
fn cropped_restore_moves_pixels() {
    let mut renderer = painted();
    let saved = renderer.copy_from_bbox(&Rect::new(2.0, 2.0, 6.0, 6.0));
    let origin = saved.rect();
    let source = PixelRect::new(origin.x1 + 1, origin.y1 + 1, origin.x1 + 3, origin.y1 + 3);
    let expected = [
        renderer.pixel(source.x1, source.y1),
        renderer.pixel(source.x1 + 1, source.y1 + 1),
    ];

    renderer.clear();
    renderer.restore_region_cropped(&saved, source, 0, 0);
    assert_eq!(renderer.pixel(0, 0), expected[0]);
    assert_eq!(renderer.pixel(1, 1), expected[1]);
    assert_eq!(renderer.pixel(2, 2).unwrap().a, 0);
}

#[test]
fn clear_is_idempotent() {
    let config = RendererConfig {
        background: Color::rgba(0.0, 0.0, 1.0, 1.0),
        ..RendererConfig::default()
    };
    let mut renderer = Renderer::with_config(6, 6, 72.0, config).unwrap();
    let fresh = renderer.as_bytes().to_vec();
    assert_eq!(renderer.pixel(3, 3), Some(Rgba8::new(0, 0, 255, 255)));

    let gc = GraphicsContext::new().with_line_width(0.0);
    renderer
        .draw_path(
            &gc,
            &Path::rectangle(1.0, 1.0, 5.0, 5.0),
            &Affine::IDENTITY,
            Some(Color::RED),
        )
        .unwrap();
    renderer.clear();
    let once = renderer.as_bytes().to_vec();
    renderer.clear();
    assert_eq!(renderer.as_bytes(), once.as_slice());
    assert_eq!(once, fresh);
}

#[test]
fn byte_orders_match_pixels() {
    let renderer = painted();
    let p = renderer.pixel(4, 5).unwrap();
    let offset = (5 * 10 + 4) as usize;
    assert_eq!(&renderer.to_rgb()[offset * 3..offset * 3 + 3], &[p.r, p.g, p.b]);
    assert_eq!(&renderer.to_argb()[offset * 4..offset * 4 + 4], &[p.a, p.r, p.g, p.b]);
    assert_eq!(&renderer.to_bgra()[offset * 4..offset * 4 + 4], &[p.b, p.g, p.r, p.a]);
    assert_eq!(renderer.stride(), 40);
}

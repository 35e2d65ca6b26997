//! Graphics context
//!
//! The per-call drawing state. A context is built by the caller for one draw
//! call and only read by the renderer; batched draws derive short-lived
//! copies with per-item colors and widths.

use grain_core::{Affine, Color, Path, PixelRect, Rect};
use grain_path::{DashPattern, LineCap, LineJoin, SketchParams, SnapMode};

/// Clip path and the transform placing it in display coordinates
#[derive(Clone, Copy, Debug)]
pub struct ClipPath<'a> {
    pub path: &'a Path,
    pub transform: Affine,
}

impl<'a> ClipPath<'a> {
    pub fn new(path: &'a Path, transform: Affine) -> Self {
        Self { path, transform }
    }
}

/// Dash pattern in points
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dashes {
    pub offset: f64,
    /// `(on, off)` pairs; empty means solid
    pub pattern: Vec<(f64, f64)>,
}

impl Dashes {
    pub fn new(offset: f64, pattern: Vec<(f64, f64)>) -> Self {
        Self { offset, pattern }
    }

    pub fn solid() -> Self {
        Self::default()
    }

    pub fn is_solid(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Convert to device pixels. Without anti-aliasing every length is
    /// truncated and centered on a pixel so dashes stay crisp.
    pub fn to_pattern(&self, dpi: f64, antialias: bool) -> DashPattern {
        let scale = dpi / 72.0;
        let convert = |v: f64| {
            let px = v * scale;
            if antialias {
                px
            } else {
                px.trunc() + 0.5
            }
        };
        let dashes = self
            .pattern
            .iter()
            .map(|&(on, off)| (convert(on), convert(off)))
            .collect();
        DashPattern::new(dashes, self.offset * scale)
    }
}

/// Hatch fill: a path drawn in a unit square and tiled over the fill area
#[derive(Clone, Copy, Debug)]
pub struct Hatch<'a> {
    pub path: &'a Path,
    pub color: Color,
    /// Stroke width inside the tile, in pixels
    pub line_width: f64,
}

impl<'a> Hatch<'a> {
    pub fn new(path: &'a Path, color: Color) -> Self {
        Self {
            path,
            color,
            line_width: 1.0,
        }
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }
}

/// Drawing state for one draw call
#[derive(Clone, Debug)]
pub struct GraphicsContext<'a> {
    /// Clip rectangle in display coordinates (y up). `None` or all zero
    /// means the whole canvas.
    pub clip_rect: Option<Rect>,
    pub clip_path: Option<ClipPath<'a>>,
    pub dashes: Dashes,
    pub cap: LineCap,
    pub join: LineJoin,
    /// Stroke width in points; zero disables stroking
    pub line_width: f64,
    pub color: Color,
    pub alpha: f32,
    /// Replace the alpha of stroke and face colors with `alpha`
    pub forced_alpha: bool,
    pub antialias: bool,
    pub snap_mode: SnapMode,
    pub hatch: Option<Hatch<'a>>,
    pub sketch: Option<SketchParams>,
}

impl Default for GraphicsContext<'_> {
    fn default() -> Self {
        Self {
            clip_rect: None,
            clip_path: None,
            dashes: Dashes::default(),
            cap: LineCap::Butt,
            join: LineJoin::Round,
            line_width: 1.0,
            color: Color::BLACK,
            alpha: 1.0,
            forced_alpha: false,
            antialias: true,
            snap_mode: SnapMode::Auto,
            hatch: None,
            sketch: None,
        }
    }
}

impl<'a> GraphicsContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip_rect(mut self, rect: Rect) -> Self {
        self.clip_rect = Some(rect);
        self
    }

    pub fn with_clip_path(mut self, path: &'a Path, transform: Affine) -> Self {
        self.clip_path = Some(ClipPath::new(path, transform));
        self
    }

    pub fn with_dashes(mut self, dashes: Dashes) -> Self {
        self.dashes = dashes;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width.max(0.0);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_alpha(mut self, alpha: f32, forced: bool) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self.forced_alpha = forced;
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn with_snap_mode(mut self, snap_mode: SnapMode) -> Self {
        self.snap_mode = snap_mode;
        self
    }

    pub fn with_hatch(mut self, hatch: Hatch<'a>) -> Self {
        self.hatch = Some(hatch);
        self
    }

    pub fn with_sketch(mut self, sketch: SketchParams) -> Self {
        self.sketch = Some(sketch);
        self
    }

    /// Stroke color after applying a forced alpha.
    pub fn effective_color(&self) -> Color {
        if self.forced_alpha {
            self.color.with_alpha(self.alpha)
        } else {
            self.color
        }
    }

    /// Face color after applying a forced alpha.
    pub fn effective_face(&self, face: Color) -> Color {
        if self.forced_alpha {
            face.with_alpha(self.alpha)
        } else {
            face
        }
    }

    /// Pixel clip box on a `width` x `height` canvas. The display rectangle
    /// is flipped to rows, rounded to the nearest pixel edge and clamped.
    pub fn pixel_clip(&self, width: u32, height: u32) -> PixelRect {
        let canvas = PixelRect::from_size(width, height);
        let Some(rect) = self.clip_rect.filter(|r| !r.is_zero()) else {
            return canvas;
        };
        let h = height as f64;
        let round = |v: f64| (v + 0.5).floor() as i32;
        PixelRect::new(
            round(rect.x1),
            round(h - rect.y1),
            round(rect.x2),
            round(h - rect.y2),
        )
        .normalized()
        .intersect(&canvas)
    }
}

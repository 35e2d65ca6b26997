//! The canvas
//!
//! [`Renderer`] owns the pixel buffer, the rasterizer and the clip mask.
//! Every draw call runs inside a [`DrawScope`]: opening one sets the clip box
//! from the graphics context and prepares the clip mask, dropping it resets
//! the rasterizer whatever way the call exits.

use std::ops::{Deref, DerefMut};

use grain_core::{Affine, Color, Path, PathCommand, PathId, PathSource, PixelRect, Rect};
use grain_path::{
    path_pipeline, Dasher, LineCap, PipelineOptions, SnapMode, StrokeStyle, Stroker,
};
use grain_raster::{
    AlphaMask, Coverage, PatternSpan, PixelBuffer, Rasterizer, Rgba8, ScanlineStorage,
    SolidRenderer, SpanRenderer,
};

use crate::config::RendererConfig;
use crate::error::{RenderError, Result, MAX_DIMENSION};
use crate::gc::{ClipPath, GraphicsContext, Hatch};
use crate::region::BufferRegion;

pub(crate) fn coverage_for(antialias: bool) -> Coverage {
    if antialias {
        Coverage::AntiAliased
    } else {
        Coverage::Binary
    }
}

/// Sweep the rasterizer into `buffer` with one color.
pub(crate) fn fill_solid(
    rasterizer: &mut Rasterizer,
    buffer: &mut PixelBuffer,
    mask: Option<&AlphaMask>,
    clip: PixelRect,
    color: Color,
) {
    let mut renderer = SolidRenderer::new(buffer, color.into(), clip).with_mask(mask);
    rasterizer.sweep(&mut renderer);
}

/// Identity of the clip path currently rendered into the mask
#[derive(Clone, Copy, Debug)]
struct ClipCacheKey {
    path: PathId,
    transform: Affine,
}

impl ClipCacheKey {
    fn matches(&self, clip: &ClipPath<'_>) -> bool {
        self.path == clip.path.id() && self.transform.bitwise_eq(&clip.transform)
    }
}

/// RGBA canvas with anti-aliased vector drawing
pub struct Renderer {
    width: u32,
    height: u32,
    dpi: f64,
    config: RendererConfig,
    pub(crate) buffer: PixelBuffer,
    pub(crate) rasterizer: Rasterizer,
    pub(crate) mask: Option<AlphaMask>,
    clip_cache: Option<ClipCacheKey>,
    hatch_tile: PixelBuffer,
    /// Pixel clip box of the draw call in progress
    pub(crate) clip: PixelRect,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

/// Clip state of one draw call; resets the rasterizer when dropped
pub(crate) struct DrawScope<'r> {
    renderer: &'r mut Renderer,
    pub(crate) has_clip_path: bool,
}

impl Deref for DrawScope<'_> {
    type Target = Renderer;

    fn deref(&self) -> &Renderer {
        self.renderer
    }
}

impl DerefMut for DrawScope<'_> {
    fn deref_mut(&mut self) -> &mut Renderer {
        self.renderer
    }
}

impl Drop for DrawScope<'_> {
    fn drop(&mut self) {
        self.renderer.rasterizer.reset();
        self.renderer.rasterizer.reset_clipping();
        self.renderer.clip = self.renderer.buffer.bounds();
    }
}

impl Renderer {
    /// Transparent canvas of `width` x `height` pixels at `dpi`.
    pub fn new(width: u32, height: u32, dpi: f64) -> Result<Self> {
        Self::with_config(width, height, dpi, RendererConfig::default())
    }

    pub fn with_config(width: u32, height: u32, dpi: f64, config: RendererConfig) -> Result<Self> {
        if width >= MAX_DIMENSION || height >= MAX_DIMENSION {
            return Err(RenderError::ImageTooLarge { width, height });
        }
        tracing::debug!("creating {}x{} renderer at {} dpi", width, height, dpi);

        let mut buffer = PixelBuffer::new(width, height);
        buffer.clear(config.background.into());
        let hatch_size = config.hatch_size;
        Ok(Self {
            width,
            height,
            dpi,
            clip: buffer.bounds(),
            buffer,
            rasterizer: Rasterizer::new(),
            mask: None,
            clip_cache: None,
            hatch_tile: PixelBuffer::new(hatch_size, hatch_size),
            config,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.buffer.stride()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        self.buffer.pixel(x, y)
    }

    /// Raw RGBA bytes, rows top to bottom.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    /// Append the y flip that maps display coordinates to canvas rows.
    pub(crate) fn to_device(&self, transform: &Affine) -> Affine {
        transform.then_scale(1.0, -1.0).then_translate(0.0, self.height as f64)
    }

    /// Open the clip state of a draw call.
    pub(crate) fn begin_draw(&mut self, gc: &GraphicsContext<'_>) -> DrawScope<'_> {
        self.rasterizer.reset();
        self.rasterizer.reset_clipping();
        self.clip = gc.pixel_clip(self.width, self.height);

        let mut scope = DrawScope {
            renderer: self,
            has_clip_path: false,
        };
        scope.has_clip_path = scope.render_clip_path(gc.clip_path.as_ref());
        let clip = scope.clip;
        scope.rasterizer.clip_box(clip.x1, clip.y1, clip.x2, clip.y2);
        scope
    }

    /// Rasterize the clip path into the mask unless the mask already holds
    /// it. Returns whether a clip path is active.
    fn render_clip_path(&mut self, clip_path: Option<&ClipPath<'_>>) -> bool {
        let Some(clip_path) = clip_path.filter(|c| !c.path.is_empty()) else {
            return false;
        };
        if self.mask.is_some() && self.clip_cache.is_some_and(|key| key.matches(clip_path)) {
            tracing::trace!("clip mask cache hit for path {}", clip_path.path.id().raw());
            return true;
        }
        tracing::trace!("rendering clip mask for path {}", clip_path.path.id().raw());

        let (width, height) = (self.width, self.height);
        let mask = self.mask.get_or_insert_with(|| AlphaMask::new(width, height));
        mask.clear();

        let transform = clip_path
            .transform
            .then_scale(1.0, -1.0)
            .then_translate(0.0, height as f64);
        let options = PipelineOptions {
            curve_tolerance: self.config.curve_tolerance,
            ..PipelineOptions::for_path(clip_path.path, width as f64, height as f64)
        };
        let mut pipeline = path_pipeline(clip_path.path.iter(), transform, &options);
        self.rasterizer.reset();
        self.rasterizer.set_coverage(Coverage::AntiAliased);
        self.rasterizer.add_path(&mut pipeline);
        self.rasterizer.sweep(mask);
        self.rasterizer.reset();

        self.clip_cache = Some(ClipCacheKey {
            path: clip_path.path.id(),
            transform: clip_path.transform,
        });
        true
    }

    /// Fill, hatch and stroke an already transformed device path.
    pub(crate) fn render_path<S: PathSource>(
        &mut self,
        source: &mut S,
        gc: &GraphicsContext<'_>,
        face: Option<Color>,
        has_clip_path: bool,
    ) {
        let coverage = coverage_for(gc.antialias);

        if let Some(face) = face {
            self.rasterizer.reset();
            self.rasterizer.set_coverage(coverage);
            self.rasterizer.add_path(source);
            let mask = self.mask.as_ref().filter(|_| has_clip_path);
            fill_solid(&mut self.rasterizer, &mut self.buffer, mask, self.clip, face);
        }

        if let Some(hatch) = &gc.hatch {
            self.render_hatch_tile(hatch);
            self.rasterizer.reset();
            self.rasterizer.set_coverage(Coverage::AntiAliased);
            self.rasterizer.add_path(source);
            let mask = self.mask.as_ref().filter(|_| has_clip_path);
            let mut renderer =
                SpanRenderer::new(&mut self.buffer, PatternSpan::new(&self.hatch_tile), self.clip)
                    .with_mask(mask);
            self.rasterizer.sweep(&mut renderer);
        }

        if gc.line_width != 0.0 {
            let mut width = self.points_to_pixels(gc.line_width);
            if !gc.antialias {
                width = if width < 0.5 { 0.5 } else { width.round() };
            }
            let style = StrokeStyle::new(width)
                .with_cap(gc.cap)
                .with_join(gc.join)
                .with_miter_limit(self.config.miter_limit);

            self.rasterizer.reset();
            self.rasterizer.set_coverage(coverage);
            if gc.dashes.is_solid() {
                self.rasterizer.add_path(&mut Stroker::new(&mut *source, style));
            } else {
                let pattern = gc.dashes.to_pattern(self.dpi, gc.antialias);
                let dashed = Dasher::new(&mut *source, pattern);
                self.rasterizer.add_path(&mut Stroker::new(dashed, style));
            }
            let mask = self.mask.as_ref().filter(|_| has_clip_path);
            fill_solid(
                &mut self.rasterizer,
                &mut self.buffer,
                mask,
                self.clip,
                gc.effective_color(),
            );
        }
    }

    /// Draw the unit-square hatch path into the hatch tile.
    fn render_hatch_tile(&mut self, hatch: &Hatch<'_>) {
        let size = self.config.hatch_size as f64;
        let transform = Affine::scale(1.0, -1.0)
            .then_translate(0.0, 1.0)
            .then_scale(size, size);
        let options = PipelineOptions {
            curve_tolerance: self.config.curve_tolerance,
            ..PipelineOptions::for_path(hatch.path, size, size)
        };
        let mut pipeline = path_pipeline(hatch.path.iter(), transform, &options);

        self.hatch_tile.clear(Rgba8::TRANSPARENT);
        let tile_clip = self.hatch_tile.bounds();
        let mut rasterizer = Rasterizer::new();
        rasterizer.clip_box(tile_clip.x1, tile_clip.y1, tile_clip.x2, tile_clip.y2);

        rasterizer.add_path(&mut pipeline);
        fill_solid(&mut rasterizer, &mut self.hatch_tile, None, tile_clip, hatch.color);

        rasterizer.reset();
        let style = StrokeStyle::new(hatch.line_width).with_cap(LineCap::Square);
        rasterizer.add_path(&mut Stroker::new(&mut pipeline, style));
        fill_solid(&mut rasterizer, &mut self.hatch_tile, None, tile_clip, hatch.color);
    }

    /// Draw `path` under `transform` (display coordinates, y up).
    ///
    /// The path is filled with `face` when given and not fully transparent,
    /// hatched when the context has a hatch, then stroked when the context's
    /// line width is nonzero.
    pub fn draw_path(
        &mut self,
        gc: &GraphicsContext<'_>,
        path: &Path,
        transform: &Affine,
        face: Option<Color>,
    ) -> Result<()> {
        let face = face.filter(|c| c.a != 0.0).map(|c| gc.effective_face(c));
        tracing::debug!(
            "draw_path: {} vertices, fill={}, hatch={}, line_width={}",
            path.total_vertices(),
            face.is_some(),
            gc.hatch.is_some(),
            gc.line_width
        );

        let device = self.to_device(transform);
        let clip = face.is_none() && gc.hatch.is_none() && !path.has_curves();
        let stroke_width = if gc.color.a == 0.0 {
            0.0
        } else {
            self.points_to_pixels(gc.line_width)
        };
        let options = PipelineOptions {
            clip,
            snap_mode: gc.snap_mode,
            snap_max_vertices: self.config.snap_max_vertices,
            stroke_width,
            simplify: path.should_simplify() && clip,
            simplify_threshold: self
                .config
                .simplify_threshold
                .unwrap_or(path.simplify_threshold()),
            curve_tolerance: self.config.curve_tolerance,
            sketch: gc.sketch,
            sketch_segment_length: self.config.sketch_segment_length,
            ..PipelineOptions::for_path(path, self.width as f64, self.height as f64)
        };

        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;
        let mut pipeline = path_pipeline(path.iter(), device, &options);
        scope.render_path(&mut pipeline, gc, face, has_clip_path);
        Ok(())
    }

    /// Stamp `marker_path` at every vertex of `path`.
    ///
    /// The marker is rasterized once, fill and stroke separately, and the
    /// recorded coverage is replayed at each vertex. Vertices whose marker
    /// would land entirely off the canvas are skipped.
    pub fn draw_markers(
        &mut self,
        gc: &GraphicsContext<'_>,
        marker_path: &Path,
        marker_transform: &Affine,
        path: &Path,
        transform: &Affine,
        face: Option<Color>,
    ) -> Result<()> {
        let face = face.filter(|c| c.a != 0.0).map(|c| gc.effective_face(c));
        let (width, height) = (self.width as f64, self.height as f64);
        let line_width = self.points_to_pixels(gc.line_width);

        let marker_options = PipelineOptions {
            snap_mode: gc.snap_mode,
            snap_max_vertices: self.config.snap_max_vertices,
            stroke_width: line_width,
            curve_tolerance: self.config.curve_tolerance,
            ..PipelineOptions::for_path(marker_path, width, height)
        };
        let mut marker = path_pipeline(
            marker_path.iter(),
            marker_transform.then_scale(1.0, -1.0),
            &marker_options,
        );

        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;

        let mut fill_cache = ScanlineStorage::new();
        let mut stroke_cache = ScanlineStorage::new();
        let mut cache_rasterizer = Rasterizer::new();
        if face.is_some() {
            cache_rasterizer.add_path(&mut marker);
            cache_rasterizer.sweep(&mut fill_cache);
            fill_cache.status()?;
        }
        if line_width != 0.0 {
            let style = StrokeStyle::new(line_width)
                .with_cap(gc.cap)
                .with_join(gc.join)
                .with_miter_limit(scope.config.miter_limit);
            cache_rasterizer.reset();
            cache_rasterizer.add_path(&mut Stroker::new(&mut marker, style));
            cache_rasterizer.sweep(&mut stroke_cache);
            stroke_cache.status()?;
        }

        let Some(extent) = union(fill_cache.bounds(), stroke_cache.bounds()) else {
            return Ok(());
        };
        let margin = scope.config.marker_cull_margin;
        let (min_x, min_y) = (extent.x1 as f64, extent.y1 as f64);
        let (max_x, max_y) = ((extent.x2 - 1) as f64, (extent.y2 - 1) as f64);
        let cull = Rect::new(
            -margin - max_x,
            -margin - max_y,
            margin + width - min_x,
            margin + height - min_y,
        );

        let path_options = PipelineOptions {
            remove_nans: false,
            snap_mode: SnapMode::Off,
            curve_tolerance: scope.config.curve_tolerance,
            ..PipelineOptions::for_path(path, width, height)
        };
        let device = transform
            .then_scale(1.0, -1.0)
            .then_translate(0.5, height + 0.5);
        let mut points = path_pipeline(path.iter(), device, &path_options);

        let r: &mut Renderer = &mut scope;
        let mask = r.mask.as_ref().filter(|_| has_clip_path);
        let stroke_color: Rgba8 = gc.effective_color().into();
        let mut renderer =
            SolidRenderer::new(&mut r.buffer, stroke_color, r.clip).with_mask(mask);

        let mut stamped = 0usize;
        points.rewind();
        while let Some(v) = points.next_vertex() {
            if v.cmd == PathCommand::Close || !v.is_finite() {
                continue;
            }
            let x = v.x.floor();
            let y = v.y.floor();
            if x < cull.x1 || x > cull.x2 || y < cull.y1 || y > cull.y2 {
                continue;
            }
            let (dx, dy) = (x as i32, y as i32);
            if let Some(face) = face {
                renderer.set_color(face.into());
                fill_cache.replay(dx, dy, &mut renderer);
            }
            renderer.set_color(stroke_color);
            stroke_cache.replay(dx, dy, &mut renderer);
            stamped += 1;
        }
        tracing::debug!(
            "draw_markers: {} stamps, {} fill spans, {} stroke spans",
            stamped,
            fill_cache.span_count(),
            stroke_cache.span_count()
        );
        Ok(())
    }

    /// Reset every pixel to the background and forget the cached clip mask.
    pub fn clear(&mut self) {
        self.buffer.clear(self.config.background.into());
        self.clip_cache = None;
    }

    /// Pixel rect containing a display rectangle.
    fn containing_rect(&self, rect: &Rect) -> PixelRect {
        let rect = rect.normalized();
        let h = self.height as f64;
        PixelRect::new(
            rect.x1.floor() as i32,
            (h - rect.y2.ceil()) as i32,
            rect.x2.ceil() as i32,
            (h - rect.y1.floor()) as i32,
        )
    }

    /// Copy the pixels under a display rectangle.
    pub fn copy_from_bbox(&self, rect: &Rect) -> BufferRegion {
        let rect = self.containing_rect(rect);
        tracing::trace!("copy_from_bbox: {:?}", rect);
        BufferRegion::new(rect, self.buffer.copy_rect_to(rect))
    }

    /// Write a region back where it was copied from.
    pub fn restore_region(&mut self, region: &BufferRegion) {
        let size = PixelRect::from_size(region.width(), region.height());
        let rect = region.rect();
        self.buffer
            .copy_rect_from(region.pixels(), region.width(), size, rect.x1, rect.y1);
    }

    /// Write the part of `region` under `source` (canvas pixel coordinates of
    /// the region's original placement) with its top-left corner at
    /// (dest_x, dest_y).
    pub fn restore_region_cropped(
        &mut self,
        region: &BufferRegion,
        source: PixelRect,
        dest_x: i32,
        dest_y: i32,
    ) {
        let origin = region.rect();
        let local = source.normalized().offset(-origin.x1, -origin.y1);
        self.buffer
            .copy_rect_from(region.pixels(), region.width(), local, dest_x, dest_y);
    }

    /// Bounding box of the pixels with nonzero alpha.
    pub fn content_extents(&self) -> Option<PixelRect> {
        self.buffer.content_extents()
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        self.buffer
            .pixels()
            .iter()
            .flat_map(|p| [p.r, p.g, p.b])
            .collect()
    }

    pub fn to_argb(&self) -> Vec<u8> {
        self.buffer
            .pixels()
            .iter()
            .flat_map(|p| [p.a, p.r, p.g, p.b])
            .collect()
    }

    pub fn to_bgra(&self) -> Vec<u8> {
        self.buffer
            .pixels()
            .iter()
            .flat_map(|p| [p.b, p.g, p.r, p.a])
            .collect()
    }
}

fn union(a: Option<PixelRect>, b: Option<PixelRect>) -> Option<PixelRect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(PixelRect::new(
            a.x1.min(b.x1),
            a.y1.min(b.y1),
            a.x2.max(b.x2),
            a.y2.max(b.y2),
        )),
        (a, None) => a,
        (None, b) => b,
    }
}

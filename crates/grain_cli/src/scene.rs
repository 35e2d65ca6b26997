//! Scene files
//!
//! A scene is a TOML document naming the canvas and a list of draw commands,
//! replayed in order onto one renderer:
//!
//! ```toml
//! [canvas]
//! width = 200
//! height = 100
//! dpi = 72.0
//!
//! [renderer]
//! miter_limit = 10.0
//!
//! [[draw]]
//! kind = "rect"
//! rect = [10.0, 10.0, 90.0, 90.0]
//! face = [1.0, 0.0, 0.0]
//! stroke = { line_width = 2.0, join = "bevel" }
//! ```
//!
//! Colors are `[r, g, b]` or `[r, g, b, a]` with components in `[0, 1]`.
//! Coordinates are display pixels with y up.

use anyhow::{Context, Result};
use grain_core::{Affine, ArrayView, Color, Path};
use grain_render::{
    Dashes, GraphicsContext, LineCap, LineJoin, QuadMesh, Renderer, RendererConfig, SketchParams,
    SnapMode,
};
use serde::{Deserialize, Serialize};
use std::fs;

/// Top-level scene description
#[derive(Debug, Deserialize, Serialize)]
pub struct Scene {
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default, rename = "draw")]
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_dpi")]
    pub dpi: f64,
}

fn default_dpi() -> f64 {
    72.0
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStyle {
    #[default]
    Butt,
    Round,
    Projecting,
}

impl From<CapStyle> for LineCap {
    fn from(cap: CapStyle) -> Self {
        match cap {
            CapStyle::Butt => LineCap::Butt,
            CapStyle::Round => LineCap::Round,
            CapStyle::Projecting => LineCap::Square,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStyle {
    Miter,
    #[default]
    Round,
    Bevel,
}

impl From<JoinStyle> for LineJoin {
    fn from(join: JoinStyle) -> Self {
        match join {
            JoinStyle::Miter => LineJoin::Miter,
            JoinStyle::Round => LineJoin::Round,
            JoinStyle::Bevel => LineJoin::Bevel,
        }
    }
}

/// Stroke and state settings shared by every command
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Style {
    /// Points; 0 disables the stroke
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default = "default_stroke_color")]
    pub color: Vec<f64>,
    #[serde(default)]
    pub cap: CapStyle,
    #[serde(default)]
    pub join: JoinStyle,
    /// `[on, off]` pairs in points
    #[serde(default)]
    pub dashes: Vec<[f64; 2]>,
    #[serde(default)]
    pub dash_offset: f64,
    #[serde(default = "default_true")]
    pub antialias: bool,
    #[serde(default)]
    pub alpha: Option<f32>,
    /// `[scale, length, randomness]`
    #[serde(default)]
    pub sketch: Option<[f64; 3]>,
    /// `[x1, y1, x2, y2]` in display pixels
    #[serde(default)]
    pub clip: Option<[f64; 4]>,
}

fn default_line_width() -> f64 {
    1.0
}

fn default_stroke_color() -> Vec<f64> {
    vec![0.0, 0.0, 0.0, 1.0]
}

fn default_true() -> bool {
    true
}

impl Default for Style {
    fn default() -> Self {
        Self {
            line_width: default_line_width(),
            color: default_stroke_color(),
            cap: CapStyle::default(),
            join: JoinStyle::default(),
            dashes: Vec::new(),
            dash_offset: 0.0,
            antialias: true,
            alpha: None,
            sketch: None,
            clip: None,
        }
    }
}

impl Style {
    fn graphics_context(&self) -> GraphicsContext<'static> {
        let mut gc = GraphicsContext::new()
            .with_line_width(self.line_width)
            .with_color(Color::from_slice(&self.color))
            .with_cap(self.cap.into())
            .with_join(self.join.into())
            .with_antialias(self.antialias)
            .with_snap_mode(SnapMode::Auto)
            .with_dashes(Dashes::new(
                self.dash_offset,
                self.dashes.iter().map(|&[on, off]| (on, off)).collect(),
            ));
        if let Some(alpha) = self.alpha {
            gc = gc.with_alpha(alpha, true);
        }
        if let Some([scale, length, randomness]) = self.sketch {
            gc = gc.with_sketch(SketchParams {
                scale,
                length,
                randomness,
            });
        }
        if let Some([x1, y1, x2, y2]) = self.clip {
            gc = gc.with_clip_rect(grain_core::Rect::new(x1, y1, x2, y2));
        }
        gc
    }
}

/// One draw call
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Polyline through `points`, optionally closed and filled
    Path {
        points: Vec<[f64; 2]>,
        #[serde(default)]
        closed: bool,
        #[serde(default)]
        face: Option<Vec<f64>>,
        #[serde(default)]
        stroke: Style,
    },
    Rect {
        rect: [f64; 4],
        #[serde(default)]
        face: Option<Vec<f64>>,
        #[serde(default)]
        stroke: Style,
    },
    Circle {
        center: [f64; 2],
        radius: f64,
        #[serde(default)]
        face: Option<Vec<f64>>,
        #[serde(default)]
        stroke: Style,
    },
    /// `marker` (points around the origin, closed) stamped at each of `points`
    Markers {
        marker: Vec<[f64; 2]>,
        points: Vec<[f64; 2]>,
        #[serde(default)]
        face: Option<Vec<f64>>,
        #[serde(default)]
        stroke: Style,
    },
    Gouraud {
        points: [[f64; 2]; 3],
        colors: [[f64; 4]; 3],
    },
    /// Grid of `width` x `height` cells over `(height + 1) * (width + 1)` corners
    Mesh {
        width: usize,
        height: usize,
        coordinates: Vec<[f64; 2]>,
        facecolors: Vec<[f64; 4]>,
        #[serde(default = "default_true")]
        antialiased: bool,
        #[serde(default)]
        stroke: Style,
    },
}

impl Scene {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(content)?;
        if scene.canvas.width == 0 || scene.canvas.height == 0 {
            anyhow::bail!(
                "canvas must not be empty, got {}x{}",
                scene.canvas.width,
                scene.canvas.height
            );
        }
        Ok(scene)
    }

    /// Replay every command onto a fresh renderer.
    pub fn render(&self) -> Result<Renderer> {
        let config = self.renderer.clone();
        let mut renderer =
            Renderer::with_config(self.canvas.width, self.canvas.height, self.canvas.dpi, config)?;
        for (i, command) in self.commands.iter().enumerate() {
            command
                .draw(&mut renderer)
                .with_context(|| format!("draw command {} failed", i))?;
        }
        tracing::info!(
            "rendered {} commands onto {}x{} canvas",
            self.commands.len(),
            self.canvas.width,
            self.canvas.height
        );
        Ok(renderer)
    }
}

fn points_path(points: &[[f64; 2]], closed: bool) -> Path {
    let points: Vec<(f64, f64)> = points.iter().map(|&[x, y]| (x, y)).collect();
    if closed {
        Path::polygon(&points)
    } else {
        Path::polyline(&points)
    }
}

fn face_color(face: &Option<Vec<f64>>) -> Option<Color> {
    face.as_deref().map(Color::from_slice)
}

impl DrawCommand {
    fn draw(&self, renderer: &mut Renderer) -> Result<()> {
        let identity = Affine::IDENTITY;
        match self {
            DrawCommand::Path {
                points,
                closed,
                face,
                stroke,
            } => {
                let path = points_path(points, *closed);
                renderer.draw_path(&stroke.graphics_context(), &path, &identity, face_color(face))?;
            }
            DrawCommand::Rect { rect, face, stroke } => {
                let [x1, y1, x2, y2] = *rect;
                let path = Path::rectangle(x1, y1, x2, y2);
                renderer.draw_path(&stroke.graphics_context(), &path, &identity, face_color(face))?;
            }
            DrawCommand::Circle {
                center,
                radius,
                face,
                stroke,
            } => {
                let path = Path::builder().circle(center[0], center[1], *radius).build();
                renderer.draw_path(&stroke.graphics_context(), &path, &identity, face_color(face))?;
            }
            DrawCommand::Markers {
                marker,
                points,
                face,
                stroke,
            } => {
                let marker = points_path(marker, true);
                let points = points_path(points, false);
                renderer.draw_markers(
                    &stroke.graphics_context(),
                    &marker,
                    &identity,
                    &points,
                    &identity,
                    face_color(face),
                )?;
            }
            DrawCommand::Gouraud { points, colors } => {
                renderer.draw_gouraud_triangle(
                    &GraphicsContext::new(),
                    &ArrayView::from_rows(points),
                    &ArrayView::from_rows(colors),
                    &identity,
                )?;
            }
            DrawCommand::Mesh {
                width,
                height,
                coordinates,
                facecolors,
                antialiased,
                stroke,
            } => {
                let flat: Vec<f64> = coordinates.iter().flatten().copied().collect();
                let coordinates = ArrayView::new(&flat, &[height + 1, width + 1, 2])
                    .context("mesh coordinates do not match the grid size")?;
                let mesh = QuadMesh {
                    master_transform: identity,
                    mesh_width: *width,
                    mesh_height: *height,
                    coordinates,
                    offsets: ArrayView::empty(),
                    offset_transform: identity,
                    facecolors: ArrayView::from_rows(facecolors),
                    antialiased: *antialiased,
                    edgecolors: ArrayView::empty(),
                };
                renderer.draw_quad_mesh(&stroke.graphics_context(), &mesh)?;
            }
        }
        Ok(())
    }
}

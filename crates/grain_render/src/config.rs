//! Renderer configuration
//!
//! Every tunable threshold of the pipeline lives here. All fields default, so
//! a TOML document only needs to name the values it changes:
//!
//! ```toml
//! snap_max_vertices = 64
//! miter_limit = 10.0
//!
//! [background]
//! r = 1.0
//! g = 1.0
//! b = 1.0
//! a = 1.0
//! ```

use grain_core::Color;
use grain_path::{DEFAULT_CURVE_TOLERANCE, DEFAULT_MITER_LIMIT, DEFAULT_SNAP_MAX_VERTICES};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RendererConfig {
    /// Color written by `clear`
    #[serde(default = "default_background")]
    pub background: Color,
    /// Paths with more vertices than this are never auto-snapped
    #[serde(default = "default_snap_max_vertices")]
    pub snap_max_vertices: usize,
    /// Replaces each path's own simplification threshold when set
    #[serde(default)]
    pub simplify_threshold: Option<f64>,
    /// Flatness tolerance for Bézier subdivision, in pixels
    #[serde(default = "default_curve_tolerance")]
    pub curve_tolerance: f64,
    #[serde(default = "default_miter_limit")]
    pub miter_limit: f64,
    /// Side of the square hatch tile, in pixels
    #[serde(default = "default_hatch_size")]
    pub hatch_size: u32,
    /// Extra margin around the canvas inside which markers are still drawn
    #[serde(default = "default_marker_cull_margin")]
    pub marker_cull_margin: f64,
    /// Length of the pieces a sketched path is cut into before wobbling
    #[serde(default = "default_sketch_segment_length")]
    pub sketch_segment_length: f64,
}

fn default_background() -> Color {
    Color::rgba(1.0, 1.0, 1.0, 0.0)
}

fn default_snap_max_vertices() -> usize {
    DEFAULT_SNAP_MAX_VERTICES
}

fn default_curve_tolerance() -> f64 {
    DEFAULT_CURVE_TOLERANCE
}

fn default_miter_limit() -> f64 {
    DEFAULT_MITER_LIMIT
}

fn default_hatch_size() -> u32 {
    72
}

fn default_marker_cull_margin() -> f64 {
    1.0
}

fn default_sketch_segment_length() -> f64 {
    1.0
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            snap_max_vertices: default_snap_max_vertices(),
            simplify_threshold: None,
            curve_tolerance: default_curve_tolerance(),
            miter_limit: default_miter_limit(),
            hatch_size: default_hatch_size(),
            marker_cull_margin: default_marker_cull_margin(),
            sketch_segment_length: default_sketch_segment_length(),
        }
    }
}

impl RendererConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

//! Batched draw calls
//!
//! A collection draws many paths with one call. Each per-item array is
//! either empty (use the default), or indexed by the item number modulo its
//! length, so a single entry applies to every item. The number of items drawn
//! is the larger of the path count and the offset count.

use grain_core::{Affine, ArrayView, Color, Path, PathCommand, PathIter, PathSource, Vertex};
use grain_path::{path_pipeline, PipelineOptions, SnapMode};

use crate::error::Result;
use crate::gc::{Dashes, GraphicsContext};
use crate::renderer::Renderer;

/// Where collection offsets are applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OffsetPosition {
    /// After the item transform, in display pixels
    #[default]
    Figure,
    /// Before the item transform, in data coordinates
    Data,
}

/// Inputs of [`Renderer::draw_path_collection`]
#[derive(Clone, Debug)]
pub struct PathCollection<'a> {
    /// Used for every item when `transforms` is empty
    pub master_transform: Affine,
    pub paths: &'a [Path],
    /// N x 3 x 3 row-major affine matrices
    pub transforms: ArrayView<'a, f64>,
    /// N x 2
    pub offsets: ArrayView<'a, f64>,
    pub offset_transform: Affine,
    /// N x 4 RGBA
    pub facecolors: ArrayView<'a, f64>,
    /// N x 4 RGBA
    pub edgecolors: ArrayView<'a, f64>,
    /// Stroke widths in points
    pub linewidths: &'a [f64],
    pub dashes: &'a [Dashes],
    pub antialiaseds: &'a [bool],
    pub offset_position: OffsetPosition,
}

impl Default for PathCollection<'_> {
    fn default() -> Self {
        Self {
            master_transform: Affine::IDENTITY,
            paths: &[],
            transforms: ArrayView::empty(),
            offsets: ArrayView::empty(),
            offset_transform: Affine::IDENTITY,
            facecolors: ArrayView::empty(),
            edgecolors: ArrayView::empty(),
            linewidths: &[],
            dashes: &[],
            antialiaseds: &[],
            offset_position: OffsetPosition::Figure,
        }
    }
}

/// Inputs of [`Renderer::draw_quad_mesh`]
#[derive(Clone, Debug)]
pub struct QuadMesh<'a> {
    pub master_transform: Affine,
    /// Cells per row
    pub mesh_width: usize,
    /// Cells per column
    pub mesh_height: usize,
    /// (mesh_height + 1) x (mesh_width + 1) x 2 corner coordinates
    pub coordinates: ArrayView<'a, f64>,
    pub offsets: ArrayView<'a, f64>,
    pub offset_transform: Affine,
    pub facecolors: ArrayView<'a, f64>,
    pub antialiased: bool,
    /// Falls back to `facecolors` when empty and `antialiased` is set
    pub edgecolors: ArrayView<'a, f64>,
}

/// Lazily produced sources of a collection
trait PathGenerator {
    type Source<'s>: PathSource
    where
        Self: 's;

    fn num_paths(&self) -> usize;

    /// Source of item `index`, its vertex count and whether it has curves.
    fn item(&self, index: usize) -> (Self::Source<'_>, usize, bool);
}

impl PathGenerator for [Path] {
    type Source<'s> = PathIter<'s> where Self: 's;

    fn num_paths(&self) -> usize {
        self.len()
    }

    fn item(&self, index: usize) -> (PathIter<'_>, usize, bool) {
        let path = &self[index % self.len()];
        (path.iter(), path.total_vertices(), path.has_curves())
    }
}

/// The cells of a quad mesh as four-corner paths, generated on demand
#[derive(Clone, Debug)]
pub struct QuadMeshCells<'a> {
    width: usize,
    height: usize,
    coordinates: &'a [f64],
}

impl<'a> QuadMeshCells<'a> {
    /// Validates that `coordinates` is (height + 1) x (width + 1) x 2.
    pub fn new(width: usize, height: usize, coordinates: &ArrayView<'a, f64>) -> Result<Self> {
        coordinates.expect_shape(
            "Coordinates",
            &[Some(height + 1), Some(width + 1), Some(2)],
        )?;
        Ok(Self {
            width,
            height,
            coordinates: coordinates.data(),
        })
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `index`: column `index % width`, row `index / width`.
    pub fn cell(&self, index: usize) -> QuadMeshCell<'a> {
        let (row, col) = match self.width {
            0 => (0, 0),
            w => (index / w, index % w),
        };
        QuadMeshCell {
            coordinates: self.coordinates,
            stride: self.width + 1,
            row,
            col,
            cursor: 0,
        }
    }
}

impl PathGenerator for QuadMeshCells<'_> {
    type Source<'s> = QuadMeshCell<'s> where Self: 's;

    fn num_paths(&self) -> usize {
        self.len()
    }

    fn item(&self, index: usize) -> (QuadMeshCell<'_>, usize, bool) {
        (self.cell(index), 5, false)
    }
}

/// One mesh cell: corners (r, c), (r, c+1), (r+1, c+1), (r+1, c), closed
#[derive(Clone, Debug)]
pub struct QuadMeshCell<'a> {
    coordinates: &'a [f64],
    stride: usize,
    row: usize,
    col: usize,
    cursor: usize,
}

impl QuadMeshCell<'_> {
    fn corner(&self, row: usize, col: usize) -> (f64, f64) {
        let i = (row * self.stride + col) * 2;
        match self.coordinates.get(i..i + 2) {
            Some(&[x, y]) => (x, y),
            _ => (f64::NAN, f64::NAN),
        }
    }
}

impl PathSource for QuadMeshCell<'_> {
    fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        let (r, c) = (self.row, self.col);
        let corner = match self.cursor {
            0 => self.corner(r, c),
            1 => self.corner(r, c + 1),
            2 => self.corner(r + 1, c + 1),
            3 => self.corner(r + 1, c),
            4 => {
                self.cursor += 1;
                return Some(Vertex::new(0.0, 0.0, PathCommand::Close));
            }
            _ => return None,
        };
        let cmd = if self.cursor == 0 {
            PathCommand::MoveTo
        } else {
            PathCommand::LineTo
        };
        self.cursor += 1;
        Some(Vertex::new(corner.0, corner.1, cmd))
    }
}

/// Per-item arrays shared by collections and meshes
struct ItemArrays<'a> {
    master_transform: Affine,
    transforms: &'a ArrayView<'a, f64>,
    offsets: &'a ArrayView<'a, f64>,
    offset_transform: Affine,
    facecolors: &'a ArrayView<'a, f64>,
    edgecolors: &'a ArrayView<'a, f64>,
    linewidths: &'a [f64],
    dashes: &'a [Dashes],
    antialiaseds: &'a [bool],
    offset_position: OffsetPosition,
    /// Run the snap stage with the context's snap mode
    snap: bool,
}

impl ItemArrays<'_> {
    fn validate(&self) -> Result<()> {
        self.offsets.expect_shape_or_empty("Offsets", &[None, Some(2)])?;
        self.facecolors
            .expect_shape_or_empty("Facecolors", &[None, Some(4)])?;
        self.edgecolors
            .expect_shape_or_empty("Edgecolors", &[None, Some(4)])?;
        self.transforms
            .expect_shape_or_empty("Transforms", &[None, Some(3), Some(3)])?;
        Ok(())
    }

    /// Transform of item `index`, offsets applied.
    fn transform(&self, index: usize) -> Affine {
        let mut transform = if self.transforms.is_empty() {
            self.master_transform
        } else {
            Affine::from_matrix3(self.transforms.row_mod(index)).unwrap_or(self.master_transform)
        };
        if !self.offsets.is_empty() {
            let offset = self.offsets.row_mod(index);
            let (xo, yo) = self.offset_transform.transform_xy(offset[0], offset[1]);
            transform = match self.offset_position {
                OffsetPosition::Data => Affine::translation(xo, yo).then(&transform),
                OffsetPosition::Figure => transform.then_translate(xo, yo),
            };
        }
        transform
    }
}

impl Renderer {
    fn draw_collection_generic<G: PathGenerator + ?Sized>(
        &mut self,
        gc: &GraphicsContext<'_>,
        generator: &G,
        arrays: &ItemArrays<'_>,
    ) -> Result<()> {
        arrays.validate()?;

        let n_paths = generator.num_paths();
        let count = n_paths.max(arrays.offsets.len());
        if (arrays.facecolors.is_empty() && arrays.edgecolors.is_empty()) || n_paths == 0 {
            return Ok(());
        }
        tracing::debug!(
            "drawing collection: {} items from {} paths",
            count,
            n_paths
        );

        let mut item_gc = gc.clone();
        item_gc.line_width = 0.0;
        item_gc.forced_alpha = false;
        let has_face = !arrays.facecolors.is_empty();
        let (width, height) = (self.width() as f64, self.height() as f64);
        let curve_tolerance = self.config().curve_tolerance;
        let snap_max_vertices = self.config().snap_max_vertices;
        let dpi = self.dpi();

        let mut scope = self.begin_draw(gc);
        let has_clip_path = scope.has_clip_path;

        for i in 0..count {
            let (source, total_vertices, has_curves) = generator.item(i);
            let device = scope.to_device(&arrays.transform(i));

            let face = has_face.then(|| Color::from_slice(arrays.facecolors.row_mod(i)));
            if !arrays.edgecolors.is_empty() {
                item_gc.color = Color::from_slice(arrays.edgecolors.row_mod(i));
                item_gc.line_width = match arrays.linewidths.len() {
                    0 => 1.0,
                    n => arrays.linewidths[i % n],
                };
                if !arrays.dashes.is_empty() {
                    item_gc.dashes = arrays.dashes[i % arrays.dashes.len()].clone();
                }
            }
            item_gc.antialias = match arrays.antialiaseds.len() {
                0 => gc.antialias,
                n => arrays.antialiaseds[i % n],
            };

            let clip = !has_face && gc.hatch.is_none() && !has_curves;
            let options = PipelineOptions {
                width,
                height,
                clip,
                snap_mode: if arrays.snap { gc.snap_mode } else { SnapMode::Off },
                snap_max_vertices,
                stroke_width: item_gc.line_width * dpi / 72.0,
                curve_tolerance,
                total_vertices,
                has_curves,
                ..PipelineOptions::default()
            };
            let mut pipeline = path_pipeline(source, device, &options);
            scope.render_path(&mut pipeline, &item_gc, face, has_clip_path);
        }
        Ok(())
    }

    /// Draw many paths with per-item transforms, offsets, colors, widths,
    /// dashes and anti-aliasing, broadcast by index modulo array length.
    ///
    /// Shapes are validated before anything is drawn. Nothing is drawn when
    /// there are no paths or neither face nor edge colors.
    pub fn draw_path_collection(
        &mut self,
        gc: &GraphicsContext<'_>,
        collection: &PathCollection<'_>,
    ) -> Result<()> {
        let arrays = ItemArrays {
            master_transform: collection.master_transform,
            transforms: &collection.transforms,
            offsets: &collection.offsets,
            offset_transform: collection.offset_transform,
            facecolors: &collection.facecolors,
            edgecolors: &collection.edgecolors,
            linewidths: collection.linewidths,
            dashes: collection.dashes,
            antialiaseds: collection.antialiaseds,
            offset_position: collection.offset_position,
            snap: true,
        };
        self.draw_collection_generic(gc, collection.paths, &arrays)
    }

    /// Draw a grid of quadrilaterals. Cells are generated one at a time from
    /// the corner grid; edges use the context line width.
    pub fn draw_quad_mesh(&mut self, gc: &GraphicsContext<'_>, mesh: &QuadMesh<'_>) -> Result<()> {
        let cells = QuadMeshCells::new(mesh.mesh_width, mesh.mesh_height, &mesh.coordinates)?;
        let edgecolors = if mesh.edgecolors.is_empty() && mesh.antialiased {
            &mesh.facecolors
        } else {
            &mesh.edgecolors
        };
        let linewidths = [gc.line_width];
        let antialiaseds = [mesh.antialiased];
        let empty = ArrayView::empty();
        let arrays = ItemArrays {
            master_transform: mesh.master_transform,
            transforms: &empty,
            offsets: &mesh.offsets,
            offset_transform: mesh.offset_transform,
            facecolors: &mesh.facecolors,
            edgecolors,
            linewidths: &linewidths,
            dashes: &[],
            antialiaseds: &antialiaseds,
            offset_position: OffsetPosition::Figure,
            snap: false,
        };
        self.draw_collection_generic(gc, &cells, &arrays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::collect_vertices;

    #[test]
    fn test_cell_corners() {
        // 2 x 1 mesh over x in 0..=2, y in 0..=1
        let coords = [
            [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
            [[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
        ];
        let view = ArrayView::from_matrices(&coords);
        let cells = QuadMeshCells::new(2, 1, &view).unwrap();
        assert_eq!(cells.len(), 2);

        let v = collect_vertices(&mut cells.cell(1));
        let points: Vec<_> = v[..4].iter().map(|v| (v.x, v.y)).collect();
        assert_eq!(points, vec![(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]);
        assert_eq!(v[0].cmd, PathCommand::MoveTo);
        assert_eq!(v[4].cmd, PathCommand::Close);
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn test_cells_validate_shape() {
        let coords = [[[0.0, 0.0], [1.0, 0.0]], [[0.0, 1.0], [1.0, 1.0]]];
        let view = ArrayView::from_matrices(&coords);
        assert!(QuadMeshCells::new(2, 1, &view).is_err());
        assert!(QuadMeshCells::new(1, 1, &view).is_ok());
    }

    #[test]
    fn test_offset_positions() {
        let offsets = [[1.0, 2.0]];
        let transforms = ArrayView::empty();
        let offsets = ArrayView::from_rows(&offsets);
        let colors = ArrayView::empty();
        let mut arrays = ItemArrays {
            master_transform: Affine::scale(10.0, 10.0),
            transforms: &transforms,
            offsets: &offsets,
            offset_transform: Affine::IDENTITY,
            facecolors: &colors,
            edgecolors: &colors,
            linewidths: &[],
            dashes: &[],
            antialiaseds: &[],
            offset_position: OffsetPosition::Figure,
            snap: true,
        };
        assert_eq!(arrays.transform(0).transform_xy(0.0, 0.0), (1.0, 2.0));
        arrays.offset_position = OffsetPosition::Data;
        assert_eq!(arrays.transform(0).transform_xy(0.0, 0.0), (10.0, 20.0));
    }
}

//! Grain Core
//!
//! Value types shared by every stage of the Grain rendering core:
//!
//! - **Geometry**: points, affine transforms, float and pixel rectangles
//! - **Color**: straight-alpha RGBA in `[0, 1]`
//! - **Paths**: vertex/command arrays and the lazy [`PathSource`] protocol
//! - **Arrays**: shaped views used to validate batched draw inputs
//!
//! # Example
//!
//! ```rust
//! use grain_core::{Affine, Path, PathSource, PathCommand};
//!
//! let path = Path::rectangle(2.0, 2.0, 8.0, 8.0);
//! let mut iter = path.iter();
//!
//! let first = iter.next_vertex().unwrap();
//! assert_eq!(first.cmd, PathCommand::MoveTo);
//!
//! let moved = Affine::translation(1.0, 0.0).transform_point(first.point());
//! assert_eq!(moved.x, 3.0);
//! ```

pub mod array;
pub mod color;
pub mod geometry;
pub mod path;

pub use array::{ArrayView, ShapeError};
pub use color::Color;
pub use geometry::{Affine, PixelRect, Point, Rect};
pub use path::{
    collect_vertices, Path, PathBuilder, PathCode, PathCommand, PathId, PathIter, PathSource,
    Vertex, VertexList,
};

//! Affine transform stage

use grain_core::{Affine, PathCommand, PathSource, Vertex};

/// Applies an [`Affine`] to every vertex; `Close` passes untouched
#[derive(Clone, Debug)]
pub struct TransformedPath<S> {
    source: S,
    transform: Affine,
}

impl<S: PathSource> TransformedPath<S> {
    pub fn new(source: S, transform: Affine) -> Self {
        Self { source, transform }
    }

    pub fn transform(&self) -> &Affine {
        &self.transform
    }
}

impl<S: PathSource> PathSource for TransformedPath<S> {
    fn rewind(&mut self) {
        self.source.rewind();
    }

    fn next_vertex(&mut self) -> Option<Vertex> {
        let mut v = self.source.next_vertex()?;
        if v.cmd != PathCommand::Close {
            let (x, y) = self.transform.transform_xy(v.x, v.y);
            v.x = x;
            v.y = y;
        }
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::{collect_vertices, Path};

    #[test]
    fn test_transform_skips_close() {
        let path = Path::rectangle(0.0, 0.0, 1.0, 1.0);
        let mut t = TransformedPath::new(path.iter(), Affine::translation(10.0, 20.0));
        let verts = collect_vertices(&mut t);
        assert_eq!(verts[0], Vertex::move_to(10.0, 20.0));
        assert_eq!(verts[2], Vertex::line_to(11.0, 21.0));
        assert_eq!(verts[4], Vertex::close());
    }
}

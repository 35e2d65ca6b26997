//! Shaped array views
//!
//! Batched draw calls take their per-item inputs (offsets, colors, transforms,
//! mesh coordinates) as flat slices with an explicit shape. Shapes are checked
//! before any pixel is touched.

use smallvec::SmallVec;
use thiserror::Error;

/// Array shape validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{argument} array must be {expected}, got shape {actual:?}")]
    Mismatch {
        argument: String,
        expected: String,
        actual: Vec<usize>,
    },

    #[error("{first} and {second} arrays must be the same length")]
    LengthMismatch { first: String, second: String },

    #[error("array holds {actual} elements but shape {shape:?} needs {expected}")]
    DataLength {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("array rank {0} is outside 1..=3")]
    Rank(usize),
}

/// Borrowed flat slice interpreted with a rank 1 to 3 shape
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    shape: SmallVec<[usize; 3]>,
}

impl<'a, T> ArrayView<'a, T> {
    pub fn new(data: &'a [T], shape: &[usize]) -> Result<Self, ShapeError> {
        if shape.is_empty() || shape.len() > 3 {
            return Err(ShapeError::Rank(shape.len()));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::DataLength {
                shape: shape.to_vec(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: SmallVec::from_slice(shape),
        })
    }

    /// Zero-length rank 1 array, the "not given" value for optional inputs.
    pub fn empty() -> Self {
        Self {
            data: &[],
            shape: SmallVec::from_slice(&[0]),
        }
    }

    pub fn from_slice(data: &'a [T]) -> Self {
        Self {
            data,
            shape: SmallVec::from_slice(&[data.len()]),
        }
    }

    /// N x C view over fixed-width rows.
    pub fn from_rows<const C: usize>(rows: &'a [[T; C]]) -> Self {
        Self {
            data: rows.as_flattened(),
            shape: SmallVec::from_slice(&[rows.len(), C]),
        }
    }

    /// N x R x C view over fixed-size matrices.
    pub fn from_matrices<const R: usize, const C: usize>(items: &'a [[[T; C]; R]]) -> Self {
        Self {
            data: items.as_flattened().as_flattened(),
            shape: SmallVec::from_slice(&[items.len(), R, C]),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent along `axis`, 0 past the last axis.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    /// Number of items along the first axis.
    pub fn len(&self) -> usize {
        self.dim(0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    fn row_stride(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Sub-array `index` along the first axis, flattened.
    pub fn row(&self, index: usize) -> &'a [T] {
        let stride = self.row_stride();
        let start = index * stride;
        self.data.get(start..start + stride).unwrap_or(&[])
    }

    /// Row `index % len`; the broadcasting rule for batched inputs.
    pub fn row_mod(&self, index: usize) -> &'a [T] {
        match self.len() {
            0 => &[],
            n => self.row(index % n),
        }
    }

    /// Check the shape against a pattern where `None` matches any extent.
    pub fn expect_shape(&self, argument: &str, pattern: &[Option<usize>]) -> Result<(), ShapeError> {
        self.expect_pattern(argument, pattern, false)
    }

    /// Like [`expect_shape`](Self::expect_shape), additionally accepting an
    /// array with no elements.
    pub fn expect_shape_or_empty(
        &self,
        argument: &str,
        pattern: &[Option<usize>],
    ) -> Result<(), ShapeError> {
        self.expect_pattern(argument, pattern, true)
    }

    fn expect_pattern(
        &self,
        argument: &str,
        pattern: &[Option<usize>],
        allow_empty: bool,
    ) -> Result<(), ShapeError> {
        if allow_empty && self.is_empty() {
            return Ok(());
        }

        let matches = self.shape.len() == pattern.len()
            && self
                .shape
                .iter()
                .zip(pattern)
                .all(|(dim, want)| want.map_or(true, |w| w == *dim));

        if matches {
            return Ok(());
        }

        let mut expected = pattern
            .iter()
            .map(|p| p.map_or_else(|| "N".to_string(), |v| v.to_string()))
            .collect::<Vec<_>>()
            .join("x");
        if allow_empty {
            expected.push_str(" or empty");
        }

        Err(ShapeError::Mismatch {
            argument: argument.to_string(),
            expected,
            actual: self.shape.to_vec(),
        })
    }
}

// shape.rs — Array shapes and element-order arithmetic
//
// A `Shape` is always stored with rank >= 2: a 1-length shape `(n)` becomes
// the column vector `(n, 1)` and a scalar becomes `(1, 1)`. All shape
// comparisons in the crate go through this normalized form.
//
// Two element orders are in play:
// - column-major (first index fastest): how arrays are addressed and stored
//   by the front-end, and how `NdArray` lays out its data;
// - row-major (last index fastest): how the execution backend flattens data.

use std::fmt;

use serde::Serialize;

/// Element iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// First dimension varies fastest.
    ColumnMajor,
    /// Last dimension varies fastest.
    RowMajor,
}

/// Normalized array shape (rank >= 2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Build a shape, applying the column-vector normalization.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        let mut dims = dims.into();
        match dims.len() {
            0 => dims = vec![1, 1],
            1 => dims.push(1),
            _ => {}
        }
        Shape(dims)
    }

    pub fn matrix(nrow: usize, ncol: usize) -> Self {
        Shape(vec![nrow, ncol])
    }

    pub fn column(len: usize) -> Self {
        Shape(vec![len, 1])
    }

    pub fn scalar() -> Self {
        Shape(vec![1, 1])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements (product of the dimensions), or `None` if the
    /// product does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Number of elements. Saturates at `usize::MAX`; shapes built from user
    /// input are validated with `checked_len` first.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.0.contains(&0)
    }

    pub fn nrow(&self) -> usize {
        self.0[0]
    }

    pub fn ncol(&self) -> usize {
        self.0[1]
    }

    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    pub fn is_column(&self) -> bool {
        self.rank() == 2 && self.0[1] == 1
    }

    /// Element strides for the given order.
    pub fn strides(&self, order: Order) -> Vec<usize> {
        let mut strides = vec![0; self.rank()];
        let mut acc = 1;
        match order {
            Order::ColumnMajor => {
                for (d, &extent) in self.0.iter().enumerate() {
                    strides[d] = acc;
                    acc *= extent;
                }
            }
            Order::RowMajor => {
                for (d, &extent) in self.0.iter().enumerate().rev() {
                    strides[d] = acc;
                    acc *= extent;
                }
            }
        }
        strides
    }

    /// Flat offset of a multi-index under the given order.
    pub fn offset(&self, index: &[usize], order: Order) -> usize {
        self.strides(order)
            .iter()
            .zip(index)
            .map(|(stride, i)| stride * i)
            .sum()
    }

    /// Multi-index of a flat offset under the given order.
    pub fn unravel(&self, mut offset: usize, order: Order) -> Vec<usize> {
        let mut index = vec![0; self.rank()];
        let dims: Vec<usize> = match order {
            Order::ColumnMajor => (0..self.rank()).collect(),
            Order::RowMajor => (0..self.rank()).rev().collect(),
        };
        for d in dims {
            let extent = self.0[d];
            if extent == 0 {
                return index;
            }
            index[d] = offset % extent;
            offset /= extent;
        }
        index
    }

    /// Visit every multi-index in the given order.
    pub fn for_each_index(&self, order: Order, mut f: impl FnMut(&[usize])) {
        if self.is_empty() {
            return;
        }
        let rank = self.rank();
        let mut index = vec![0; rank];
        loop {
            f(&index);
            // Odometer step: advance the fastest dimension, carrying outward.
            let mut carried = true;
            for step in 0..rank {
                let d = match order {
                    Order::ColumnMajor => step,
                    Order::RowMajor => rank - 1 - step,
                };
                index[d] += 1;
                if index[d] < self.0[d] {
                    carried = false;
                    break;
                }
                index[d] = 0;
            }
            if carried {
                return;
            }
        }
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}

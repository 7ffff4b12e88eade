// layout.rs — Dense arrays and column-major/row-major index translation
//
// `NdArray` stores its elements column-major, matching front-end addressing.
// The execution backend consumes row-major flattenings instead; the helpers
// here convert between the two without touching real data:
//
// - `enumerate_indices(shape)` builds the dummy placeholder: an array shaped
//   like the target whose element at every position is that position's
//   row-major rank. Subscripting the placeholder with a user subscript yields
//   the row-major indices of exactly the selected elements.
// - `flatten_rowwise(array)` lists an array's elements last-dimension-fastest,
//   the canonical ordering handed to the backend.

use serde::Serialize;

use crate::error::ArrayError;
use crate::shape::{Order, Shape};

/// Dense array stored in column-major order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdArray<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    /// Wrap column-major `data` in `shape`. Fails if the lengths disagree.
    pub fn from_vec(shape: Shape, data: Vec<T>) -> Result<Self, ArrayError> {
        if shape.len() != data.len() {
            return Err(ArrayError::shape(format!(
                "{} elements cannot fill an array of shape {} ({} elements)",
                data.len(),
                shape,
                shape.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// Callers guarantee `shape.len() == data.len()`.
    pub(crate) fn from_parts(shape: Shape, data: Vec<T>) -> Self {
        debug_assert_eq!(shape.len(), data.len());
        NdArray { shape, data }
    }

    /// Column vector holding `data`.
    pub fn column(data: Vec<T>) -> Self {
        NdArray {
            shape: Shape::column(data.len()),
            data,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Elements in column-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a multi-index.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.rank()
            || index.iter().zip(self.shape.dims()).any(|(i, d)| i >= d)
        {
            return None;
        }
        self.data.get(self.shape.offset(index, Order::ColumnMajor))
    }

    /// Reinterpret the same column-major elements under a new shape.
    pub fn with_shape(self, shape: Shape) -> Result<Self, ArrayError> {
        NdArray::from_vec(shape, self.data)
    }
}

impl NdArray<f64> {
    pub fn scalar(value: f64) -> Self {
        NdArray {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// `nrow` x `ncol` matrix from column-major `data`.
    pub fn matrix(data: Vec<f64>, nrow: usize, ncol: usize) -> Result<Self, ArrayError> {
        NdArray::from_vec(Shape::matrix(nrow, ncol), data)
    }

    /// Array filled with `1..=n` in column-major order.
    pub fn sequence(shape: Shape) -> Self {
        let data = (1..=shape.len()).map(|v| v as f64).collect();
        NdArray { shape, data }
    }
}

/// Dummy placeholder: `shape`-shaped array holding each slot's row-major rank.
pub fn enumerate_indices(shape: &Shape) -> NdArray<usize> {
    let mut data = Vec::with_capacity(shape.len());
    let strides = shape.strides(Order::RowMajor);
    shape.for_each_index(Order::ColumnMajor, |index| {
        data.push(strides.iter().zip(index).map(|(s, i)| s * i).sum());
    });
    NdArray {
        shape: shape.clone(),
        data,
    }
}

/// `shape`-shaped array holding each slot's column-major position.
pub fn positions(shape: &Shape) -> NdArray<usize> {
    NdArray {
        shape: shape.clone(),
        data: (0..shape.len()).collect(),
    }
}

/// Elements of `array` in row-major order.
pub fn flatten_rowwise<T: Clone>(array: &NdArray<T>) -> Vec<T> {
    let strides = array.shape.strides(Order::ColumnMajor);
    let mut out = Vec::with_capacity(array.len());
    array.shape.for_each_index(Order::RowMajor, |index| {
        let offset: usize = strides.iter().zip(index).map(|(s, i)| s * i).sum();
        out.push(array.data[offset].clone());
    });
    out
}

/// Inverse of `flatten_rowwise`: rebuild a `shape`-shaped array from its
/// row-major element sequence.
pub fn from_rowwise<T: Clone>(shape: Shape, rowwise: &[T]) -> Result<NdArray<T>, ArrayError> {
    if shape.len() != rowwise.len() {
        return Err(ArrayError::shape(format!(
            "{} elements cannot fill an array of shape {} ({} elements)",
            rowwise.len(),
            shape,
            shape.len()
        )));
    }
    let ranks = enumerate_indices(&shape);
    let data = ranks.data.iter().map(|&r| rowwise[r].clone()).collect();
    Ok(NdArray { shape, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerate_indices_matrix() {
        // 2x3, row-major ranks laid out column-major:
        // [0 1 2]
        // [3 4 5]
        let dummy = enumerate_indices(&Shape::matrix(2, 3));
        assert_eq!(dummy.data(), &[0, 3, 1, 4, 2, 5]);
        assert_eq!(dummy.get(&[1, 2]), Some(&5));
    }

    #[test]
    fn enumerate_indices_column_is_identity() {
        let dummy = enumerate_indices(&Shape::column(4));
        assert_eq!(dummy.data(), &[0, 1, 2, 3]);
    }

    #[test]
    fn enumerate_indices_three_dims() {
        let s = Shape::new(vec![2, 2, 2]);
        let dummy = enumerate_indices(&s);
        // element (i, j, k) = 4i + 2j + k
        assert_eq!(dummy.get(&[1, 0, 0]), Some(&4));
        assert_eq!(dummy.get(&[0, 1, 0]), Some(&2));
        assert_eq!(dummy.get(&[0, 0, 1]), Some(&1));
        assert_eq!(dummy.get(&[1, 1, 1]), Some(&7));
    }

    #[test]
    fn flatten_rowwise_reads_rows_first() {
        let a = NdArray::sequence(Shape::matrix(3, 4));
        assert_eq!(
            flatten_rowwise(&a),
            vec![1.0, 4.0, 7.0, 10.0, 2.0, 5.0, 8.0, 11.0, 3.0, 6.0, 9.0, 12.0]
        );
    }

    #[test]
    fn flatten_rowwise_of_placeholder_is_identity() {
        let s = Shape::new(vec![3, 2, 4]);
        let ranks = flatten_rowwise(&enumerate_indices(&s));
        assert_eq!(ranks, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn from_rowwise_inverts_flatten() {
        let a = NdArray::sequence(Shape::new(vec![2, 3, 2]));
        let back = from_rowwise(a.shape().clone(), &flatten_rowwise(&a)).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn from_vec_checks_length() {
        let err = NdArray::from_vec(Shape::matrix(2, 2), vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ArrayError::Shape { .. }));
    }

    #[test]
    fn positions_are_column_major() {
        assert_eq!(positions(&Shape::matrix(2, 2)).data(), &[0, 1, 2, 3]);
    }
}

// subscript.rs — Subscript resolution and generic selection
//
// A subscript expression is a list of per-dimension `Subscript`s. It is
// resolved once against a shape into a `Selection` (concrete zero-based index
// lists), and the same selection is then applied to any number of arrays of
// that shape: the row-major placeholder, the column-major position map, and
// the concrete value if there is one.
//
// Resolution follows the usual 1-based subscripting conventions:
// - a missing subscript selects the whole extent;
// - positive positions select (repeats allowed), zeros are ignored;
// - all-negative positions exclude;
// - logical masks are recycled over the extent;
// - a single subscript indexes the array linearly in column-major order;
// - dimensions are never dropped.

use crate::error::ArrayError;
use crate::layout::NdArray;
use crate::shape::{Order, Shape};

/// One dimension's subscript.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    /// Missing subscript: the whole extent.
    All,
    /// 1-based positions; negative values exclude.
    Positions(Vec<i64>),
    /// Logical mask, recycled to the extent.
    Mask(Vec<bool>),
}

impl Subscript {
    /// Positions `from..=to` (1-based, ascending).
    pub fn range(from: i64, to: i64) -> Self {
        Subscript::Positions((from..=to).collect())
    }

    pub fn at(position: i64) -> Self {
        Subscript::Positions(vec![position])
    }
}

/// Resolved zero-based selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Column-major positions into the whole array.
    Linear(Vec<usize>),
    /// One index list per dimension.
    PerDim(Vec<Vec<usize>>),
}

impl Selection {
    /// Resolve `subscripts` against `shape`.
    pub fn resolve(shape: &Shape, subscripts: &[Subscript]) -> Result<Self, ArrayError> {
        match subscripts {
            [] | [Subscript::All] => Ok(Selection::PerDim(
                shape.dims().iter().map(|&d| (0..d).collect()).collect(),
            )),
            [single] => Ok(Selection::Linear(resolve_dim(single, shape.len(), true)?)),
            subs if subs.len() == shape.rank() => {
                let lists = subs
                    .iter()
                    .zip(shape.dims())
                    .map(|(sub, &extent)| resolve_dim(sub, extent, false))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Selection::PerDim(lists))
            }
            subs => Err(ArrayError::index(format!(
                "incorrect number of dimensions: {} subscripts for an array of shape {}",
                subs.len(),
                shape
            ))),
        }
    }

    /// Shape of the selected sub-array.
    pub fn shape(&self) -> Shape {
        match self {
            Selection::Linear(positions) => Shape::column(positions.len()),
            Selection::PerDim(lists) => Shape::new(lists.iter().map(Vec::len).collect::<Vec<_>>()),
        }
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.shape().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn resolve_dim(sub: &Subscript, extent: usize, linear: bool) -> Result<Vec<usize>, ArrayError> {
    match sub {
        Subscript::All => Ok((0..extent).collect()),
        Subscript::Positions(positions) => {
            let has_positive = positions.iter().any(|&p| p > 0);
            let has_negative = positions.iter().any(|&p| p < 0);
            if has_positive && has_negative {
                return Err(ArrayError::index(
                    "can't mix positive and negative subscripts",
                ));
            }
            if has_negative {
                let mut keep = vec![true; extent];
                for &p in positions {
                    let excluded = p.unsigned_abs() as usize;
                    if excluded == 0 {
                        continue;
                    }
                    if excluded > extent {
                        // Excluding past the end is a no-op for linear indexing.
                        if linear {
                            continue;
                        }
                        return Err(ArrayError::index("subscript out of bounds"));
                    }
                    keep[excluded - 1] = false;
                }
                Ok((0..extent).filter(|&i| keep[i]).collect())
            } else {
                positions
                    .iter()
                    .filter(|&&p| p != 0)
                    .map(|&p| {
                        let p = p as usize;
                        if p > extent {
                            Err(ArrayError::index("subscript out of bounds"))
                        } else {
                            Ok(p - 1)
                        }
                    })
                    .collect()
            }
        }
        Subscript::Mask(mask) => {
            if mask.len() > extent {
                return Err(ArrayError::index("(subscript) logical subscript too long"));
            }
            if mask.is_empty() {
                return Ok(Vec::new());
            }
            Ok((0..extent).filter(|&i| mask[i % mask.len()]).collect())
        }
    }
}

impl<T: Clone> NdArray<T> {
    /// Apply a resolved selection, keeping every dimension.
    pub fn select(&self, selection: &Selection) -> NdArray<T> {
        let data = match selection {
            Selection::Linear(positions) => positions.iter().map(|&p| self.data()[p].clone()).collect(),
            Selection::PerDim(lists) => {
                let strides = self.shape().strides(Order::ColumnMajor);
                let mut data = Vec::with_capacity(selection.len());
                selection.shape().for_each_index(Order::ColumnMajor, |out| {
                    let offset: usize = out
                        .iter()
                        .enumerate()
                        .map(|(d, &i)| lists[d][i] * strides[d])
                        .sum();
                    data.push(self.data()[offset].clone());
                });
                data
            }
        };
        NdArray::from_parts(selection.shape(), data)
    }
}

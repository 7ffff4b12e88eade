// reshape.rs — Shape queries and shape assignment (`dim`, `length`, `dim<-`)
//
// Reshaping is order-preserving under column-major addressing. The backend
// stores data row-major, so the node records the row-major gather that
// realizes the reshape: the placeholder of the source shape, reinterpreted
// under the target shape, flattened row-wise.

use crate::error::ArrayError;
use crate::graph::{BackendOp, Graph, OpKind, OpParams, Operation};
use crate::id::NodeId;
use crate::layout::{enumerate_indices, flatten_rowwise};
use crate::shape::Shape;
use crate::shape_infer;

/// Shape of a node (`dim(x)`).
pub fn dim(graph: &Graph, x: NodeId) -> Result<Shape, ArrayError> {
    graph.shape(x).cloned()
}

/// Number of elements of a node (`length(x)`).
pub fn length(graph: &Graph, x: NodeId) -> Result<usize, ArrayError> {
    Ok(graph.shape(x)?.len())
}

/// `dim(x) <- new_dim`. `None` flattens to a single column.
///
/// Entries are truncated toward zero; NaN marks a missing entry.
pub fn set_dim(graph: &mut Graph, x: NodeId, new_dim: Option<&[f64]>) -> Result<NodeId, ArrayError> {
    let len = length(graph, x)?;
    let target = match new_dim {
        None => Shape::column(len),
        Some(dims) => {
            if dims.is_empty() {
                return Err(ArrayError::shape("length-0 dimension vector is invalid"));
            }
            if dims.iter().any(|d| !d.is_finite()) {
                return Err(ArrayError::shape("the dims contain missing or infinite values"));
            }
            if dims.iter().any(|&d| d.trunc() < 0.0) {
                return Err(ArrayError::shape("the dims contain negative values"));
            }
            Shape::new(dims.iter().map(|&d| d.trunc() as usize).collect::<Vec<_>>())
        }
    };
    reshape_to(graph, x, target)
}

/// Column-major linearization to `(length, 1)`. Column vectors are returned
/// unchanged.
pub fn flatten(graph: &mut Graph, x: NodeId) -> Result<NodeId, ArrayError> {
    let shape = graph.shape(x)?;
    if shape.is_column() {
        return Ok(x);
    }
    let len = shape.len();
    reshape_to(graph, x, Shape::column(len))
}

/// Register a reshape node of `x` to `target`.
pub fn reshape_to(graph: &mut Graph, x: NodeId, target: Shape) -> Result<NodeId, ArrayError> {
    let node = graph.node(x)?;
    let from = node.shape.clone();
    shape_infer::reshape(&target, std::slice::from_ref(&from))?;

    let value = if node.value.is_concrete() {
        Some(node.value.reshape(target.clone())?)
    } else {
        None
    };
    let index = flatten_rowwise(&enumerate_indices(&from).with_shape(target.clone())?);

    graph.register_operation(
        Operation {
            kind: OpKind::Reshape,
            parents: vec![x],
            params: OpParams::Reshape {
                from,
                to: target.clone(),
                index,
            },
            value,
            backend: BackendOp::RESHAPE,
        },
        |inputs| shape_infer::reshape(&target, inputs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NdArray;
    use crate::value::Value;

    fn setup() -> (Graph, NodeId) {
        let mut g = Graph::new();
        let x = g.data(NdArray::sequence(Shape::matrix(3, 4)));
        (g, x)
    }

    #[test]
    fn dim_and_length() {
        let (g, x) = setup();
        assert_eq!(dim(&g, x).unwrap(), Shape::matrix(3, 4));
        assert_eq!(length(&g, x).unwrap(), 12);
    }

    #[test]
    fn set_dim_two_by_six() {
        let (mut g, x) = setup();
        let y = set_dim(&mut g, x, Some(&[2.0, 6.0])).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::matrix(2, 6));
        let v = g.value(y).unwrap().as_concrete().unwrap();
        assert_eq!(v.data(), NdArray::sequence(Shape::matrix(3, 4)).data());
        assert_eq!(g.node(y).unwrap().kind, OpKind::Reshape);
    }

    #[test]
    fn set_dim_product_mismatch() {
        let (mut g, x) = setup();
        let err = set_dim(&mut g, x, Some(&[5.0, 3.0])).unwrap_err();
        assert_eq!(
            err,
            ArrayError::shape("dims [product 15] do not match the length of object [12]")
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn set_dim_overflowing_product_is_shape_error() {
        let (mut g, x) = setup();
        let err = set_dim(&mut g, x, Some(&[4294967296.0, 4294967296.0, 3.0])).unwrap_err();
        assert_eq!(
            err,
            ArrayError::shape("dims [product 55340232221128654848] do not match the length of object [12]")
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn set_dim_validation() {
        let (mut g, x) = setup();
        assert!(set_dim(&mut g, x, Some(&[])).is_err());
        assert!(set_dim(&mut g, x, Some(&[f64::NAN, 12.0])).is_err());
        let err = set_dim(&mut g, x, Some(&[-3.0, -4.0])).unwrap_err();
        assert_eq!(err, ArrayError::shape("the dims contain negative values"));
    }

    #[test]
    fn set_dim_one_length_is_column() {
        let (mut g, x) = setup();
        let y = set_dim(&mut g, x, Some(&[12.0])).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::column(12));
        let z = set_dim(&mut g, x, None).unwrap();
        assert_eq!(g.shape(z).unwrap(), &Shape::column(12));
    }

    #[test]
    fn reshape_index_gathers_in_column_major_order() {
        let (mut g, x) = setup();
        let y = flatten(&mut g, x).unwrap();
        // Flattening a 3x4 column-major array reads the row-major source as
        // 0, 4, 8, 1, 5, 9, ...
        match &g.node(y).unwrap().params {
            OpParams::Reshape { from, to, index } => {
                assert_eq!(from, &Shape::matrix(3, 4));
                assert_eq!(to, &Shape::column(12));
                assert_eq!(index, &vec![0, 4, 8, 1, 5, 9, 2, 6, 10, 3, 7, 11]);
            }
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn flatten_column_is_identity() {
        let mut g = Graph::new();
        let v = g.variable(Shape::column(5));
        assert_eq!(flatten(&mut g, v).unwrap(), v);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn reshape_unknown_stays_unknown() {
        let mut g = Graph::new();
        let v = g.variable(Shape::matrix(2, 3));
        let y = set_dim(&mut g, v, Some(&[3.0, 2.0])).unwrap();
        assert_eq!(g.value(y).unwrap(), &Value::Unknown(Shape::matrix(3, 2)));
    }
}

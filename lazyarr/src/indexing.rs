// indexing.rs — Extract (`x[...]`) and replace (`x[...] <- v`) operators
//
// Both operators resolve the user's subscripts once and apply the resulting
// selection to the dummy placeholder from `enumerate_indices`, which yields
// the row-major indices the backend needs without reading any real data.
// When the operands are concrete, the same selection is applied to the real
// values so the new node carries a concrete value too.
//
// Preconditions: `source` belongs to `graph`.
// Postconditions: exactly one new node (plus, for replace, possibly the
//                 coerced/recycled replacement nodes) is registered.
// Failure modes: subscript errors, replacing into a variable, replacement
//                length not dividing the slot count.
// Side effects: appends to `graph`.

use crate::combine::{rep, Rep};
use crate::error::ArrayError;
use crate::graph::{BackendOp, Graph, OpKind, OpParams, Operand, Operation};
use crate::id::NodeId;
use crate::layout::{enumerate_indices, flatten_rowwise, positions, NdArray};
use crate::reshape::flatten;
use crate::shape_infer;
use crate::subscript::{Selection, Subscript};
use crate::value::Value;

/// `source[subscripts]`, never dropping dimensions.
pub fn extract(graph: &mut Graph, source: NodeId, subscripts: &[Subscript]) -> Result<NodeId, ArrayError> {
    let node = graph.node(source)?;
    let shape = node.shape.clone();
    let selection = Selection::resolve(&shape, subscripts)?;

    let dummy_out = enumerate_indices(&shape).select(&selection);
    let dims_out = dummy_out.shape().clone();
    let value = match &node.value {
        Value::Concrete(array) => Some(Value::Concrete(array.select(&selection))),
        Value::Unknown(_) => None,
    };
    let index = flatten_rowwise(&dummy_out);

    let params = OpParams::Extract {
        n: shape.len(),
        index,
        dims_out: dims_out.clone(),
    };
    graph.register_operation(
        Operation {
            kind: OpKind::Extract,
            parents: vec![source],
            params,
            value,
            backend: BackendOp::EXTRACT,
        },
        |inputs| shape_infer::extract(&dims_out, inputs),
    )
}

/// `source[subscripts] <- replacement`, as a new node.
///
/// The replacement is flattened column-major and recycled to the number of
/// targeted slots when its length divides that number.
pub fn replace(
    graph: &mut Graph,
    source: NodeId,
    subscripts: &[Subscript],
    replacement: impl Into<Operand>,
) -> Result<NodeId, ArrayError> {
    let node = graph.node(source)?;
    if node.kind == OpKind::Variable {
        return Err(ArrayError::Immutability { node: source });
    }
    let dims = node.shape.clone();
    let selection = Selection::resolve(&dims, subscripts)?;
    let slots = selection.len();

    let replacement = replacement.into();
    let given = match &replacement {
        Operand::Node(id) => graph.shape(*id)?.len(),
        Operand::Array(array) => array.len(),
    };
    if given == 0 || slots % given != 0 {
        return Err(ArrayError::Length {
            slots,
            replacement: given,
        });
    }
    let replacement = graph.as_node(replacement)?;
    let mut replacement = flatten(graph, replacement)?;
    if given != slots {
        replacement = rep(graph, replacement, &Rep::length_out(slots))?;
    }

    // Row-major rank of each slot, in the column-major order in which the
    // replacement's elements are assigned.
    let index = enumerate_indices(&dims).select(&selection).into_data();

    let value = match (graph.value(source)?, graph.value(replacement)?) {
        (Value::Concrete(target), Value::Concrete(new)) => {
            let splice = positions(&dims).select(&selection);
            let mut data = target.data().to_vec();
            for (&pos, &v) in splice.data().iter().zip(new.data()) {
                data[pos] = v;
            }
            Some(Value::Concrete(NdArray::from_vec(dims.clone(), data)?))
        }
        _ => None,
    };

    graph.register_operation(
        Operation {
            kind: OpKind::Replace,
            parents: vec![source, replacement],
            params: OpParams::Replace {
                index,
                dims: dims.clone(),
            },
            value,
            backend: BackendOp::REPLACE,
        },
        shape_infer::replace,
    )
}

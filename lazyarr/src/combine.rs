// combine.rs — Combination operators: cbind, rbind, c, rep
//
// cbind/rbind validate operand shapes through `shape_infer` and register a
// single node over all operands; the backend concatenates along the bound
// axis. `c` flattens every operand to a column first and takes the rbind
// path. `rep` is an extract with a computed position sequence.

use crate::error::ArrayError;
use crate::graph::{BackendOp, Graph, OpKind, OpParams, Operand, Operation};
use crate::id::NodeId;
use crate::indexing::extract;
use crate::layout::NdArray;
use crate::reshape::flatten;
use crate::shape::Shape;
use crate::shape_infer;
use crate::subscript::Subscript;
use crate::value::Value;

/// Column-bind operands (equal row counts).
pub fn cbind(graph: &mut Graph, operands: Vec<Operand>) -> Result<NodeId, ArrayError> {
    bind(graph, operands, OpKind::Cbind)
}

/// Row-bind operands (equal column counts).
pub fn rbind(graph: &mut Graph, operands: Vec<Operand>) -> Result<NodeId, ArrayError> {
    bind(graph, operands, OpKind::Rbind)
}

/// Concatenate operands into one column vector, each read column-major.
pub fn c(graph: &mut Graph, operands: Vec<Operand>) -> Result<NodeId, ArrayError> {
    if operands.is_empty() {
        return Err(ArrayError::invalid_argument("c() needs at least one array"));
    }
    operand_shapes(graph, &operands)?;
    let mut flat = Vec::with_capacity(operands.len());
    for operand in operands {
        let id = graph.as_node(operand)?;
        flat.push(flatten(graph, id)?);
    }
    bind_nodes(graph, flat, OpKind::Rbind)
}

fn bind(graph: &mut Graph, operands: Vec<Operand>, kind: OpKind) -> Result<NodeId, ArrayError> {
    // Validate before coercing so a failed call registers nothing.
    let shapes = operand_shapes(graph, &operands)?;
    bind_shape(kind, &shapes)?;

    let parents = operands
        .into_iter()
        .map(|operand| graph.as_node(operand))
        .collect::<Result<Vec<_>, _>>()?;
    bind_nodes(graph, parents, kind)
}

/// Shapes of operands without registering anything; fails on unknown ids.
fn operand_shapes(graph: &Graph, operands: &[Operand]) -> Result<Vec<Shape>, ArrayError> {
    operands
        .iter()
        .map(|operand| match operand {
            Operand::Node(id) => graph.shape(*id).cloned(),
            Operand::Array(array) => Ok(array.shape().clone()),
        })
        .collect()
}

fn bind_shape(kind: OpKind, shapes: &[Shape]) -> Result<Shape, ArrayError> {
    match kind {
        OpKind::Cbind => shape_infer::cbind(shapes),
        _ => shape_infer::rbind(shapes),
    }
}

fn bind_nodes(graph: &mut Graph, parents: Vec<NodeId>, kind: OpKind) -> Result<NodeId, ArrayError> {
    let values = parents
        .iter()
        .map(|&p| graph.value(p))
        .collect::<Result<Vec<_>, _>>()?;
    let value = match Value::all_concrete(values) {
        Some(arrays) => {
            let shapes: Vec<Shape> = arrays.iter().map(|a| a.shape().clone()).collect();
            let shape = bind_shape(kind, &shapes)?;
            let data = match kind {
                OpKind::Cbind => concat_columns(&arrays),
                _ => concat_rows(&arrays, shape.nrow(), shape.ncol()),
            };
            Some(Value::Concrete(NdArray::from_vec(shape, data)?))
        }
        None => None,
    };
    let backend = match kind {
        OpKind::Cbind => BackendOp::CBIND,
        _ => BackendOp::RBIND,
    };
    graph.register_operation(
        Operation {
            kind,
            parents,
            params: OpParams::Empty,
            value,
            backend,
        },
        |inputs| bind_shape(kind, inputs),
    )
}

/// Column-major data of a column bind is the operands' data back to back.
fn concat_columns(arrays: &[&NdArray<f64>]) -> Vec<f64> {
    arrays.iter().flat_map(|a| a.data().iter().copied()).collect()
}

fn concat_rows(arrays: &[&NdArray<f64>], nrow: usize, ncol: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(nrow * ncol);
    for j in 0..ncol {
        for a in arrays {
            let rows = a.shape().nrow();
            data.extend_from_slice(&a.data()[j * rows..(j + 1) * rows]);
        }
    }
    data
}

// ── rep ─────────────────────────────────────────────────────────────────────

/// Arguments of `rep`, with the usual sequence-repetition semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rep {
    /// One count for the whole sequence, or one count per element.
    pub times: Vec<usize>,
    /// Repeat each element this many times before applying `times`.
    pub each: usize,
    /// Cycle the (each-expanded) sequence to this length; overrides `times`.
    pub length_out: Option<usize>,
}

impl Default for Rep {
    fn default() -> Self {
        Rep {
            times: vec![1],
            each: 1,
            length_out: None,
        }
    }
}

impl Rep {
    pub fn times(n: usize) -> Self {
        Rep {
            times: vec![n],
            ..Rep::default()
        }
    }

    pub fn each(n: usize) -> Self {
        Rep {
            each: n,
            ..Rep::default()
        }
    }

    pub fn length_out(n: usize) -> Self {
        Rep {
            length_out: Some(n),
            ..Rep::default()
        }
    }

    /// 1-based positions obtained by repeating `1..=n`.
    ///
    /// The result length is checked before anything is allocated.
    pub fn positions(&self, n: usize) -> Result<Vec<i64>, ArrayError> {
        let expanded = checked_length(n.checked_mul(self.each))?;
        let total = match (self.length_out, self.times.as_slice()) {
            (Some(len), _) => {
                if expanded == 0 && len > 0 {
                    return Err(ArrayError::invalid_argument(
                        "attempt to replicate an object of length zero",
                    ));
                }
                Some(len)
            }
            (None, [times]) => expanded.checked_mul(*times),
            (None, per_element) if per_element.len() == expanded => per_element
                .iter()
                .try_fold(0usize, |acc, &t| acc.checked_add(t)),
            _ => return Err(ArrayError::invalid_argument("invalid 'times' argument")),
        };
        let total = checked_length(total)?;

        let base = (1..=n as i64).flat_map(|i| std::iter::repeat(i).take(self.each));
        if self.length_out.is_some() || self.times.len() == 1 {
            let base: Vec<i64> = base.collect();
            Ok(base.iter().copied().cycle().take(total).collect())
        } else {
            Ok(base
                .zip(&self.times)
                .flat_map(|(i, &t)| std::iter::repeat(i).take(t))
                .collect())
        }
    }
}

/// Longest position vector that can be allocated.
const MAX_POSITIONS: usize = isize::MAX as usize / std::mem::size_of::<i64>();

fn checked_length(len: Option<usize>) -> Result<usize, ArrayError> {
    match len {
        Some(len) if len <= MAX_POSITIONS => Ok(len),
        _ => Err(ArrayError::invalid_argument("rep() result would be too long")),
    }
}

/// `rep(x, ...)`: an extract of `x` at the repeated positions, yielding a
/// column vector.
pub fn rep(graph: &mut Graph, x: NodeId, how: &Rep) -> Result<NodeId, ArrayError> {
    let n = graph.shape(x)?.len();
    let positions = how.positions(n)?;
    extract(graph, x, &[Subscript::Positions(positions)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Graph, NodeId) {
        let mut g = Graph::new();
        let x = g.data(NdArray::sequence(Shape::matrix(3, 4)));
        (g, x)
    }

    fn col(g: &mut Graph, x: NodeId, j: i64) -> NodeId {
        extract(g, x, &[Subscript::All, Subscript::at(j)]).unwrap()
    }

    fn concrete(g: &Graph, id: NodeId) -> Vec<f64> {
        g.value(id).unwrap().as_concrete().unwrap().data().to_vec()
    }

    #[test]
    fn cbind_swapped_columns() {
        let (mut g, x) = setup();
        let c2 = col(&mut g, x, 2);
        let c1 = col(&mut g, x, 1);
        let y = cbind(&mut g, vec![c2.into(), c1.into()]).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::matrix(3, 2));
        assert_eq!(concrete(&g, y), vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
        let node = g.node(y).unwrap();
        assert_eq!(node.parents, vec![c2, c1]);
        assert_eq!(node.backend, Some(BackendOp::CBIND));
    }

    #[test]
    fn cbind_row_mismatch_registers_nothing() {
        let (mut g, x) = setup();
        let before = g.len();
        let err = cbind(&mut g, vec![x.into(), vec![1.0, 2.0].into()]).unwrap_err();
        assert!(matches!(err, ArrayError::Shape { .. }));
        assert_eq!(g.len(), before);
    }

    #[test]
    fn rbind_interleaves_columns() {
        let (mut g, x) = setup();
        let r1 = extract(&mut g, x, &[Subscript::at(1), Subscript::All]).unwrap();
        let y = rbind(&mut g, vec![x.into(), r1.into()]).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::matrix(4, 4));
        assert_eq!(concrete(&g, y)[..8], [1.0, 2.0, 3.0, 1.0, 4.0, 5.0, 6.0, 4.0]);
    }

    #[test]
    fn rbind_column_mismatch() {
        let (mut g, x) = setup();
        let c1 = col(&mut g, x, 1);
        assert!(rbind(&mut g, vec![x.into(), c1.into()]).is_err());
    }

    #[test]
    fn c_flattens_and_stacks() {
        let (mut g, x) = setup();
        let c1 = col(&mut g, x, 1);
        let y = c(&mut g, vec![c1.into(), x.into()]).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::column(15));
        assert_eq!(g.node(y).unwrap().kind, OpKind::Rbind);
        let v = concrete(&g, y);
        assert_eq!(v[..4], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(v[14], 12.0);
    }

    #[test]
    fn c_with_unknown_operand_is_unknown() {
        let (mut g, x) = setup();
        let v = g.variable(Shape::matrix(2, 2));
        let y = c(&mut g, vec![x.into(), v.into()]).unwrap();
        assert_eq!(g.value(y).unwrap(), &Value::Unknown(Shape::column(16)));
    }

    #[test]
    fn rep_times_three() {
        let (mut g, x) = setup();
        let c2 = col(&mut g, x, 2);
        let y = rep(&mut g, c2, &Rep::times(3)).unwrap();
        assert_eq!(g.shape(y).unwrap(), &Shape::column(9));
        assert_eq!(
            concrete(&g, y),
            vec![4.0, 5.0, 6.0, 4.0, 5.0, 6.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(g.node(y).unwrap().kind, OpKind::Extract);
    }

    #[test]
    fn rep_positions_semantics() {
        assert_eq!(Rep::each(2).positions(3).unwrap(), vec![1, 1, 2, 2, 3, 3]);
        assert_eq!(Rep::length_out(5).positions(2).unwrap(), vec![1, 2, 1, 2, 1]);
        let per_element = Rep {
            times: vec![2, 0, 1],
            ..Rep::default()
        };
        assert_eq!(per_element.positions(3).unwrap(), vec![1, 1, 3]);
        let bad = Rep {
            times: vec![1, 2],
            ..Rep::default()
        };
        assert!(bad.positions(3).is_err());
        assert!(Rep::length_out(2).positions(0).is_err());
        assert_eq!(Rep::times(4).positions(0).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn rep_lengths_that_overflow_are_rejected() {
        let too_long = ArrayError::invalid_argument("rep() result would be too long");
        assert_eq!(Rep::times(usize::MAX).positions(3).unwrap_err(), too_long);
        assert_eq!(Rep::times(usize::MAX / 4).positions(3).unwrap_err(), too_long);
        assert_eq!(Rep::each(usize::MAX).positions(2).unwrap_err(), too_long);
        assert_eq!(Rep::length_out(usize::MAX).positions(2).unwrap_err(), too_long);
        let per_element = Rep {
            times: vec![usize::MAX, 1],
            ..Rep::default()
        };
        assert_eq!(per_element.positions(2).unwrap_err(), too_long);
    }

    #[test]
    fn rep_overflow_registers_nothing() {
        let (mut g, x) = setup();
        let err = rep(&mut g, x, &Rep::times(usize::MAX)).unwrap_err();
        assert!(matches!(err, ArrayError::InvalidArgument { .. }));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn c_with_unknown_node_registers_nothing() {
        let (mut g, x) = setup();
        let err = c(&mut g, vec![x.into(), NodeId(99).into()]).unwrap_err();
        assert_eq!(err, ArrayError::UnknownNode { node: NodeId(99) });
        assert_eq!(g.len(), 1);
    }
}

// graph.rs — Symbolic array graph and node registration
//
// The graph is an append-only arena of immutable nodes. Operators never
// mutate an existing node: each call registers a new node whose parents are
// already in the arena, so the graph is acyclic by construction.
//
// Preconditions: parent ids passed to `register_operation` come from this graph.
// Postconditions: on success the node is stored with the shape computed by its
//                 shape function; on failure nothing is stored.
// Failure modes: unknown parent ids, shape function errors, a supplied value
//                whose shape disagrees with the computed shape.
// Side effects: none beyond appending to the arena.

use std::fmt;

use serde::Serialize;

use crate::error::ArrayError;
use crate::id::{IdAllocator, NodeId};
use crate::layout::NdArray;
use crate::shape::Shape;
use crate::value::Value;

// ── Public types ────────────────────────────────────────────────────────────

/// Operator kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Literal data; always concrete.
    Data,
    /// Free parameter; value unknown until realized.
    Variable,
    Extract,
    Replace,
    Cbind,
    Rbind,
    Reshape,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Data => "data",
            OpKind::Variable => "variable",
            OpKind::Extract => "extract",
            OpKind::Replace => "replace",
            OpKind::Cbind => "cbind",
            OpKind::Rbind => "rbind",
            OpKind::Reshape => "reshape",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Opaque execution-backend descriptor. The execution engine resolves it by
/// name and invokes it with the node's parameters and realized parent values;
/// this crate only records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BackendOp(&'static str);

impl BackendOp {
    pub const EXTRACT: BackendOp = BackendOp("tf_extract");
    pub const REPLACE: BackendOp = BackendOp("tf_replace");
    pub const CBIND: BackendOp = BackendOp("tf_cbind");
    pub const RBIND: BackendOp = BackendOp("tf_rbind");
    pub const RESHAPE: BackendOp = BackendOp("tf_reshape");

    pub fn name(self) -> &'static str {
        self.0
    }
}

/// Operator parameters handed to the backend.
///
/// Every `index` is a row-major index sequence: entry `k` is a position in
/// the row-major flattening of the first parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpParams {
    Empty,
    /// `out_rowmajor[k] = source_rowmajor[index[k]]`; `n` is the source length.
    Extract {
        n: usize,
        index: Vec<usize>,
        dims_out: Shape,
    },
    /// `source_rowmajor[index[k]] = replacement[k]` for every slot `k`.
    Replace { index: Vec<usize>, dims: Shape },
    /// Column-major-preserving reshape expressed as a row-major gather.
    Reshape {
        from: Shape,
        to: Shape,
        index: Vec<usize>,
    },
}

/// A node in the symbolic array graph.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: OpKind,
    pub parents: Vec<NodeId>,
    pub shape: Shape,
    pub params: OpParams,
    pub value: Value,
    pub backend: Option<BackendOp>,
}

/// A registration request for a derived node.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OpKind,
    pub parents: Vec<NodeId>,
    pub params: OpParams,
    /// Concrete value, if derivable; `None` registers an unknown value.
    pub value: Option<Value>,
    pub backend: BackendOp,
}

/// Something that can be lifted into a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Array(NdArray<f64>),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Node(id)
    }
}

impl From<NdArray<f64>> for Operand {
    fn from(array: NdArray<f64>) -> Self {
        Operand::Array(array)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Array(NdArray::scalar(value))
    }
}

impl From<Vec<f64>> for Operand {
    fn from(values: Vec<f64>) -> Self {
        Operand::Array(NdArray::column(values))
    }
}

// ── Graph ───────────────────────────────────────────────────────────────────

/// Append-only arena of symbolic array nodes.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    #[serde(skip)]
    ids: IdAllocator,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, ArrayError> {
        self.nodes
            .get(id.index())
            .ok_or(ArrayError::UnknownNode { node: id })
    }

    pub fn shape(&self, id: NodeId) -> Result<&Shape, ArrayError> {
        Ok(&self.node(id)?.shape)
    }

    pub fn value(&self, id: NodeId) -> Result<&Value, ArrayError> {
        Ok(&self.node(id)?.value)
    }

    /// Child ids of `id`, in construction order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parents.contains(&id))
            .map(|n| n.id)
            .collect()
    }

    /// Register a literal data node.
    pub fn data(&mut self, array: NdArray<f64>) -> NodeId {
        let shape = array.shape().clone();
        self.push(
            OpKind::Data,
            Vec::new(),
            shape,
            OpParams::Empty,
            Value::Concrete(array),
            None,
        )
    }

    /// Register a free variable node of the given shape.
    pub fn variable(&mut self, shape: Shape) -> NodeId {
        self.push(
            OpKind::Variable,
            Vec::new(),
            shape.clone(),
            OpParams::Empty,
            Value::Unknown(shape),
            None,
        )
    }

    /// Coerce an operand to a node, registering literal data as needed.
    pub fn as_node(&mut self, operand: impl Into<Operand>) -> Result<NodeId, ArrayError> {
        match operand.into() {
            Operand::Node(id) => self.node(id).map(|n| n.id),
            Operand::Array(array) => Ok(self.data(array)),
        }
    }

    /// Register a derived node. `shape_fn` maps the parents' shapes to the
    /// node's shape; a supplied value must have exactly that shape.
    pub fn register_operation(
        &mut self,
        op: Operation,
        shape_fn: impl FnOnce(&[Shape]) -> Result<Shape, ArrayError>,
    ) -> Result<NodeId, ArrayError> {
        let parent_shapes = op
            .parents
            .iter()
            .map(|&p| self.shape(p).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let shape = shape_fn(&parent_shapes)?;
        let value = match op.value {
            Some(value) if value.shape() != &shape => {
                return Err(ArrayError::shape(format!(
                    "{} value has shape {} but the node has shape {}",
                    op.kind,
                    value.shape(),
                    shape
                )));
            }
            Some(value) => value,
            None => Value::Unknown(shape.clone()),
        };
        Ok(self.push(
            op.kind,
            op.parents,
            shape,
            op.params,
            value,
            Some(op.backend),
        ))
    }

    fn push(
        &mut self,
        kind: OpKind,
        parents: Vec<NodeId>,
        shape: Shape,
        params: OpParams,
        value: Value,
        backend: Option<BackendOp>,
    ) -> NodeId {
        let id = self.ids.alloc_node();
        debug_assert_eq!(id.index(), self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            parents,
            shape,
            params,
            value,
            backend,
        });
        id
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.id, self.kind)?;
        if !self.parents.is_empty() {
            let parents: Vec<String> = self.parents.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", parents.join(", "))?;
        }
        let state = if self.value.is_concrete() {
            "concrete"
        } else {
            "unknown"
        };
        write!(f, " : {} [{}]", self.shape, state)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph ({} nodes)", self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape_infer;

    #[test]
    fn leaf_constructors() {
        let mut g = Graph::new();
        let d = g.data(NdArray::sequence(Shape::matrix(3, 4)));
        let v = g.variable(Shape::matrix(2, 2));
        assert_eq!(d, NodeId(0));
        assert_eq!(v, NodeId(1));
        assert!(g.value(d).unwrap().is_concrete());
        assert!(!g.value(v).unwrap().is_concrete());
        assert_eq!(g.node(v).unwrap().backend, None);
    }

    #[test]
    fn register_runs_shape_fn() {
        let mut g = Graph::new();
        let a = g.variable(Shape::matrix(3, 1));
        let b = g.variable(Shape::matrix(3, 2));
        let id = g
            .register_operation(
                Operation {
                    kind: OpKind::Cbind,
                    parents: vec![a, b],
                    params: OpParams::Empty,
                    value: None,
                    backend: BackendOp::CBIND,
                },
                shape_infer::cbind,
            )
            .unwrap();
        let node = g.node(id).unwrap();
        assert_eq!(node.shape, Shape::matrix(3, 3));
        assert_eq!(node.value, Value::Unknown(Shape::matrix(3, 3)));
        assert_eq!(g.children(a), vec![id]);
    }

    #[test]
    fn failed_registration_stores_nothing() {
        let mut g = Graph::new();
        let a = g.variable(Shape::matrix(3, 1));
        let b = g.variable(Shape::matrix(2, 1));
        let err = g
            .register_operation(
                Operation {
                    kind: OpKind::Cbind,
                    parents: vec![a, b],
                    params: OpParams::Empty,
                    value: None,
                    backend: BackendOp::CBIND,
                },
                shape_infer::cbind,
            )
            .unwrap_err();
        assert!(matches!(err, ArrayError::Shape { .. }));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut g = Graph::new();
        let err = g
            .register_operation(
                Operation {
                    kind: OpKind::Reshape,
                    parents: vec![NodeId(9)],
                    params: OpParams::Empty,
                    value: None,
                    backend: BackendOp::RESHAPE,
                },
                |inputs| Ok(inputs[0].clone()),
            )
            .unwrap_err();
        assert_eq!(err, ArrayError::UnknownNode { node: NodeId(9) });
    }

    #[test]
    fn value_shape_must_match() {
        let mut g = Graph::new();
        let a = g.variable(Shape::matrix(2, 2));
        let err = g
            .register_operation(
                Operation {
                    kind: OpKind::Reshape,
                    parents: vec![a],
                    params: OpParams::Empty,
                    value: Some(Value::Concrete(NdArray::scalar(1.0))),
                    backend: BackendOp::RESHAPE,
                },
                |inputs| Ok(inputs[0].clone()),
            )
            .unwrap_err();
        assert!(err.to_string().contains("value has shape (1, 1)"));
    }

    #[test]
    fn as_node_coerces_literals() {
        let mut g = Graph::new();
        let s = g.as_node(2.5).unwrap();
        assert_eq!(g.shape(s).unwrap(), &Shape::scalar());
        let v = g.as_node(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.shape(v).unwrap(), &Shape::column(3));
        assert_eq!(g.as_node(v).unwrap(), v);
        assert!(g.as_node(NodeId(42)).is_err());
    }

    #[test]
    fn display_lists_nodes() {
        let mut g = Graph::new();
        g.data(NdArray::scalar(1.0));
        g.variable(Shape::matrix(2, 3));
        let text = g.to_string();
        assert_eq!(
            text,
            "Graph (2 nodes)\n  %0 = data : (1, 1) [concrete]\n  %1 = variable : (2, 3) [unknown]\n"
        );
    }
}

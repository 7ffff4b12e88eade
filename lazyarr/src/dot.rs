// dot.rs — Graphviz DOT output for lazy array graphs
//
// Transforms a Graph into DOT format suitable for rendering with `dot` or
// other Graphviz layout engines. Leaves are drawn as ellipses (data) or
// diamonds (variables); derived nodes as boxes labelled with the backend op.
//
// Preconditions: `graph` is a constructed Graph.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt;

use crate::graph::*;
use crate::value::Value;

/// Emit the graph as a Graphviz DOT string.
pub fn emit_dot(graph: &Graph) -> String {
    Dot(graph).to_string()
}

struct Dot<'a>(&'a Graph);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph lazyarr {{")?;
        writeln!(f, "    rankdir=TB;")?;
        writeln!(f, "    node [fontname=\"Helvetica\", fontsize=10];")?;
        writeln!(f, "    edge [fontname=\"Helvetica\", fontsize=9];")?;

        if !self.0.is_empty() {
            writeln!(f)?;
        }
        for node in self.0.nodes() {
            writeln!(f, "    n{} [{}];", node.id.0, node_attrs(node))?;
        }

        let edges: Vec<_> = self
            .0
            .nodes()
            .iter()
            .flat_map(|n| n.parents.iter().enumerate().map(move |(i, p)| (p, n, i)))
            .collect();
        if !edges.is_empty() {
            writeln!(f)?;
        }
        for (parent, child, slot) in edges {
            if child.parents.len() > 1 {
                writeln!(f, "    n{} -> n{} [label=\"{}\"];", parent.0, child.id.0, slot + 1)?;
            } else {
                writeln!(f, "    n{} -> n{};", parent.0, child.id.0)?;
            }
        }

        writeln!(f, "}}")
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Node label: kind (or backend op), shape, and whether the value is known.
fn node_label(node: &Node) -> String {
    let op = match node.backend {
        Some(backend) => format!("{}\\n{}", node.kind, backend.name()),
        None => node.kind.to_string(),
    };
    let known = match node.value {
        Value::Concrete(_) => "",
        Value::Unknown(_) => " ?",
    };
    format!("{} {}\\n{}{}", node.id, op, node.shape, known)
}

/// DOT attributes string for a node.
fn node_attrs(node: &Node) -> String {
    let (shape, color) = match node.kind {
        OpKind::Data => ("ellipse", "lightgray"),
        OpKind::Variable => ("diamond", "lightsalmon"),
        OpKind::Extract | OpKind::Replace => ("box", "lightblue"),
        OpKind::Cbind | OpKind::Rbind => ("box", "lightyellow"),
        OpKind::Reshape => ("box", "lightgreen"),
    };
    let label = node_label(node);
    format!("shape={shape}, style=filled, fillcolor={color}, label=\"{label}\"")
}

// ── Tests ───────────────────────────────────────────────────────────────────

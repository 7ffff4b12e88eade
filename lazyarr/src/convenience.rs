// convenience.rs — head/tail, expressed as extracts
//
// Matrices select whole rows; higher-rank arrays select elements in
// column-major order. `n` is clamped to the available extent, and a negative
// `n` keeps all but the last (head) or first (tail) `|n|`.

use crate::error::ArrayError;
use crate::graph::Graph;
use crate::id::NodeId;
use crate::indexing::extract;
use crate::subscript::Subscript;

/// Default `n` for head and tail.
pub const DEFAULT_N: i64 = 6;

/// First `n` rows (matrices) or elements (higher ranks) of `x`.
pub fn head(graph: &mut Graph, x: NodeId, n: i64) -> Result<NodeId, ArrayError> {
    let (extent, by_row) = extent_of(graph, x)?;
    let keep = kept(extent, n);
    let positions: Vec<i64> = (1..=keep as i64).collect();
    select(graph, x, positions, by_row)
}

/// Last `n` rows (matrices) or elements (higher ranks) of `x`.
pub fn tail(graph: &mut Graph, x: NodeId, n: i64) -> Result<NodeId, ArrayError> {
    let (extent, by_row) = extent_of(graph, x)?;
    let keep = kept(extent, n);
    let positions: Vec<i64> = ((extent - keep + 1) as i64..=extent as i64).collect();
    select(graph, x, positions, by_row)
}

fn extent_of(graph: &Graph, x: NodeId) -> Result<(usize, bool), ArrayError> {
    let shape = graph.shape(x)?;
    if shape.is_matrix() {
        Ok((shape.nrow(), true))
    } else {
        Ok((shape.len(), false))
    }
}

fn kept(extent: usize, n: i64) -> usize {
    let extent = extent as i64;
    let keep = if n >= 0 { n.min(extent) } else { (extent + n).max(0) };
    keep as usize
}

fn select(graph: &mut Graph, x: NodeId, positions: Vec<i64>, by_row: bool) -> Result<NodeId, ArrayError> {
    if by_row {
        extract(graph, x, &[Subscript::Positions(positions), Subscript::All])
    } else {
        extract(graph, x, &[Subscript::Positions(positions)])
    }
}

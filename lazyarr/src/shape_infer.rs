// shape_infer.rs — Output-shape functions, one per operator kind
//
// Each function maps the operand shapes of a node to its output shape and
// fails with a shape error on incompatible operands. They are pure and are
// invoked by `Graph::register_operation` at construction time.

use crate::error::ArrayError;
use crate::shape::Shape;

/// Extract: the shape of the subscripted placeholder, fixed at construction.
pub fn extract(dims_out: &Shape, inputs: &[Shape]) -> Result<Shape, ArrayError> {
    expect_arity("extract", inputs, 1)?;
    Ok(dims_out.clone())
}

/// Replace: the source shape, unchanged.
pub fn replace(inputs: &[Shape]) -> Result<Shape, ArrayError> {
    expect_arity("replace", inputs, 2)?;
    Ok(inputs[0].clone())
}

/// Reshape: the target shape, provided the element count is preserved.
pub fn reshape(target: &Shape, inputs: &[Shape]) -> Result<Shape, ArrayError> {
    expect_arity("reshape", inputs, 1)?;
    let from = inputs[0].len();
    if target.checked_len() != Some(from) {
        return Err(ArrayError::shape(format!(
            "dims [product {}] do not match the length of object [{}]",
            product_text(target),
            from
        )));
    }
    Ok(target.clone())
}

/// Decimal product of a shape's extents, exact while it fits in `usize`.
fn product_text(shape: &Shape) -> String {
    match shape.checked_len() {
        Some(n) => n.to_string(),
        None => {
            let product: f64 = shape.dims().iter().map(|&d| d as f64).product();
            format!("{:.0}", product)
        }
    }
}

/// Column bind: equal row counts, output `(rows, sum of columns)`.
pub fn cbind(inputs: &[Shape]) -> Result<Shape, ArrayError> {
    let (rows, cols) = bind("cbind", inputs, |s| s.nrow(), |s| s.ncol(), "rows")?;
    bounded("cbind", Shape::matrix(rows, cols))
}

/// Row bind: equal column counts, output `(sum of rows, columns)`.
pub fn rbind(inputs: &[Shape]) -> Result<Shape, ArrayError> {
    let (cols, rows) = bind("rbind", inputs, |s| s.ncol(), |s| s.nrow(), "columns")?;
    bounded("rbind", Shape::matrix(rows, cols))
}

/// Shared cbind/rbind validation. Returns the common extent and the summed
/// extent along the bound axis.
fn bind(
    op: &str,
    inputs: &[Shape],
    shared: impl Fn(&Shape) -> usize,
    summed: impl Fn(&Shape) -> usize,
    shared_name: &str,
) -> Result<(usize, usize), ArrayError> {
    if inputs.is_empty() {
        return Err(ArrayError::shape(format!("{} needs at least one array", op)));
    }
    if let Some((i, s)) = inputs.iter().enumerate().find(|(_, s)| !s.is_matrix()) {
        return Err(ArrayError::shape(format!(
            "{}: all arrays must be 2-dimensional, but argument {} has shape {}",
            op,
            i + 1,
            s
        )));
    }
    let first = shared(&inputs[0]);
    if inputs.iter().any(|s| shared(s) != first) {
        let extents: Vec<String> = inputs.iter().map(|s| shared(s).to_string()).collect();
        return Err(ArrayError::shape(format!(
            "{}: all arrays must have the same number of {} (got {})",
            op,
            shared_name,
            extents.join(", ")
        )));
    }
    let total = inputs
        .iter()
        .map(summed)
        .try_fold(0usize, |acc, n| acc.checked_add(n))
        .ok_or_else(|| ArrayError::shape(format!("{}: result is too large", op)))?;
    Ok((first, total))
}

fn bounded(op: &str, shape: Shape) -> Result<Shape, ArrayError> {
    match shape.checked_len() {
        Some(_) => Ok(shape),
        None => Err(ArrayError::shape(format!("{}: result is too large", op))),
    }
}

fn expect_arity(op: &str, inputs: &[Shape], n: usize) -> Result<(), ArrayError> {
    if inputs.len() != n {
        return Err(ArrayError::invalid_argument(format!(
            "{} takes {} operand(s), got {}",
            op,
            n,
            inputs.len()
        )));
    }
    Ok(())
}

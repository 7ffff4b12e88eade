// value.rs — Concrete-or-unknown node values
//
// A node's value is either fully known (`Concrete`) or an `Unknown`
// placeholder of the node's shape. Unknown propagates: any operator with at
// least one unknown operand produces an unknown result.

use serde::Serialize;

use crate::error::ArrayError;
use crate::layout::NdArray;
use crate::shape::Shape;
use crate::subscript::Selection;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Concrete(NdArray<f64>),
    Unknown(Shape),
}

impl Value {
    pub fn shape(&self) -> &Shape {
        match self {
            Value::Concrete(array) => array.shape(),
            Value::Unknown(shape) => shape,
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Value::Concrete(_))
    }

    pub fn as_concrete(&self) -> Option<&NdArray<f64>> {
        match self {
            Value::Concrete(array) => Some(array),
            Value::Unknown(_) => None,
        }
    }

    /// Apply a selection; unknown stays unknown with the selected shape.
    pub fn select(&self, selection: &Selection) -> Value {
        match self {
            Value::Concrete(array) => Value::Concrete(array.select(selection)),
            Value::Unknown(_) => Value::Unknown(selection.shape()),
        }
    }

    /// Same elements (column-major order preserved) under a new shape.
    pub fn reshape(&self, shape: Shape) -> Result<Value, ArrayError> {
        if shape.len() != self.shape().len() {
            return Err(ArrayError::shape(format!(
                "cannot reshape {} elements to {}",
                self.shape().len(),
                shape
            )));
        }
        match self {
            Value::Concrete(array) => Ok(Value::Concrete(array.clone().with_shape(shape)?)),
            Value::Unknown(_) => Ok(Value::Unknown(shape)),
        }
    }

    /// Every concrete payload, or `None` if any value is unknown.
    pub fn all_concrete<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Vec<&'a NdArray<f64>>> {
        values.into_iter().map(Value::as_concrete).collect()
    }
}

impl From<NdArray<f64>> for Value {
    fn from(array: NdArray<f64>) -> Self {
        Value::Concrete(array)
    }
}

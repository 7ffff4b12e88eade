// eval.rs — Script evaluation onto a lazy array graph
//
// Walks statements in order, binding names in an environment and building
// graph nodes through the operator modules. Plain numeric and logical
// vectors stay host-side until an array operator needs them; they become
// data nodes on first use.
//
// Preconditions: a parsed `Script`.
// Postconditions: the session graph holds every node the script built.
// Failure modes: the first error-level diagnostic stops evaluation; the
//   session keeps everything built before it.
// Side effects: none.

use std::collections::BTreeMap;

use crate::ast::*;
use crate::combine::{self, Rep};
use crate::convenience;
use crate::diag::{codes, Diagnostic};
use crate::error::ArrayError;
use crate::graph::{Graph, Operand};
use crate::id::NodeId;
use crate::indexing;
use crate::layout::{from_rowwise, NdArray};
use crate::reshape;
use crate::shape::Shape;
use crate::subscript::Subscript;

// ── Runtime values ──────────────────────────────────────────────────────────

/// A value bound to a script name.
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    /// Host-side numeric vector. `NA` is NaN.
    Num(Vec<f64>),
    /// Host-side logical vector.
    Bool(Vec<bool>),
    Null,
    /// A symbolic array in the session graph.
    Node(NodeId),
}

impl RValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RValue::Num(_) => "numeric",
            RValue::Bool(_) => "logical",
            RValue::Null => "NULL",
            RValue::Node(_) => "array",
        }
    }
}

/// Value of a bare expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub span: Span,
    pub value: RValue,
}

/// Evaluation state: the graph plus the name environment.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub graph: Graph,
    pub env: BTreeMap<String, RValue>,
    pub outputs: Vec<Output>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node bound to `name`, if the name holds an array.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        match self.env.get(name) {
            Some(RValue::Node(id)) => Some(*id),
            _ => None,
        }
    }
}

pub struct EvalResult {
    pub session: Session,
    pub diagnostics: Vec<Diagnostic>,
}

impl EvalResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Evaluate `script` into a fresh session.
pub fn evaluate(script: &Script) -> EvalResult {
    let mut ev = Evaluator {
        session: Session::new(),
        diagnostics: Vec::new(),
    };
    for stmt in &script.statements {
        if let Err(diag) = ev.statement(stmt) {
            ev.diagnostics.push(diag);
            break;
        }
    }
    EvalResult {
        session: ev.session,
        diagnostics: ev.diagnostics,
    }
}

// ── Evaluator ───────────────────────────────────────────────────────────────

type Eval<T> = Result<T, Diagnostic>;

/// A call argument after evaluation.
#[derive(Debug, Clone)]
struct Evaluated {
    name: Option<String>,
    value: RValue,
    span: Span,
}

struct Evaluator {
    session: Session,
    /// Warnings collected so far.
    diagnostics: Vec<Diagnostic>,
}

fn lift<T>(result: Result<T, ArrayError>, span: Span) -> Eval<T> {
    result.map_err(|e| Diagnostic::from_array_error(&e, span))
}

impl Evaluator {
    fn statement(&mut self, stmt: &Statement) -> Eval<()> {
        match &stmt.kind {
            StatementKind::Assign { target, value } => {
                let value = self.expr(value)?;
                self.session.env.insert(target.name.clone(), value);
            }
            StatementKind::IndexAssign {
                target,
                subscripts,
                named,
                value,
            } => {
                self.bracket_args(named)?;
                let source = self.lookup(target)?;
                let source = self.node_of(source, target.span)?;
                let subscripts = self.subscripts(subscripts)?;
                let replacement = self.expr(value)?;
                let replacement = self.operand(replacement, value.span)?;
                let id = lift(
                    indexing::replace(&mut self.session.graph, source, &subscripts, replacement),
                    stmt.span,
                )?;
                self.session
                    .env
                    .insert(target.name.clone(), RValue::Node(id));
            }
            StatementKind::DimAssign { target, value } => {
                let source = self.lookup(target)?;
                let source = self.node_of(source, target.span)?;
                let dims = match self.expr(value)? {
                    RValue::Null => None,
                    other => Some(self.numeric(other, value.span)?),
                };
                let id = lift(
                    reshape::set_dim(&mut self.session.graph, source, dims.as_deref()),
                    stmt.span,
                )?;
                self.session
                    .env
                    .insert(target.name.clone(), RValue::Node(id));
            }
            StatementKind::Expr(expr) => {
                let value = self.expr(expr)?;
                self.session.outputs.push(Output {
                    span: stmt.span,
                    value,
                });
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Eval<RValue> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(RValue::Num(vec![*n])),
            ExprKind::Bool(b) => Ok(RValue::Bool(vec![*b])),
            ExprKind::Na => Ok(RValue::Num(vec![f64::NAN])),
            ExprKind::Null => Ok(RValue::Null),
            ExprKind::Name(id) => self.lookup(id),
            ExprKind::Neg(inner) => match self.expr(inner)? {
                RValue::Num(v) => Ok(RValue::Num(v.into_iter().map(|x| -x).collect())),
                RValue::Bool(b) => Ok(RValue::Num(
                    b.into_iter().map(|x| if x { -1.0 } else { 0.0 }).collect(),
                )),
                other => Err(Diagnostic::error(
                    codes::E_TYPE,
                    expr.span,
                    format!("invalid argument to unary minus ({})", other.type_name()),
                )),
            },
            ExprKind::Range(from, to) => {
                let from = self.scalar(from)?;
                let to = self.scalar(to)?;
                Ok(RValue::Num(colon(from, to)))
            }
            ExprKind::Call { callee, args } => self.call(callee, args, expr.span),
            ExprKind::Index {
                target,
                subscripts,
                named,
            } => {
                self.bracket_args(named)?;
                let source = self.expr(target)?;
                let source = self.node_of(source, target.span)?;
                let subscripts = self.subscripts(subscripts)?;
                lift(
                    indexing::extract(&mut self.session.graph, source, &subscripts),
                    expr.span,
                )
                .map(RValue::Node)
            }
        }
    }

    fn lookup(&self, id: &Ident) -> Eval<RValue> {
        self.session.env.get(&id.name).cloned().ok_or_else(|| {
            Diagnostic::error(
                codes::E_UNDEFINED,
                id.span,
                format!("object '{}' not found", id.name),
            )
        })
    }

    // ── Conversions ──

    /// Host-side numbers of a value. Array values must be concrete.
    fn numeric(&self, value: RValue, span: Span) -> Eval<Vec<f64>> {
        match value {
            RValue::Num(v) => Ok(v),
            RValue::Bool(b) => Ok(b.into_iter().map(|x| if x { 1.0 } else { 0.0 }).collect()),
            RValue::Null => Ok(Vec::new()),
            RValue::Node(id) => {
                let value = lift(self.session.graph.value(id), span)?;
                match value.as_concrete() {
                    Some(array) => Ok(array.data().to_vec()),
                    None => Err(Diagnostic::error(
                        codes::E_TYPE,
                        span,
                        format!("the value of {} is not known while the graph is built", id),
                    )
                    .with_hint("only data-derived arrays can be used as host-side numbers")),
                }
            }
        }
    }

    fn scalar(&mut self, expr: &Expr) -> Eval<f64> {
        let value = self.expr(expr)?;
        match self.numeric(value, expr.span)?.as_slice() {
            [x] if !x.is_nan() => Ok(*x),
            [x] if x.is_nan() => Err(Diagnostic::error(
                codes::E_ARGUMENT,
                expr.span,
                "NA/NaN argument",
            )),
            _ => Err(Diagnostic::error(
                codes::E_ARGUMENT,
                expr.span,
                "expected a single number",
            )),
        }
    }

    fn operand(&self, value: RValue, span: Span) -> Eval<Operand> {
        match value {
            RValue::Node(id) => Ok(Operand::Node(id)),
            RValue::Null => Err(Diagnostic::error(
                codes::E_TYPE,
                span,
                "NULL cannot be used as an array",
            )),
            other => Ok(Operand::Array(NdArray::column(self.numeric(other, span)?))),
        }
    }

    fn node_of(&mut self, value: RValue, span: Span) -> Eval<NodeId> {
        let operand = self.operand(value, span)?;
        lift(self.session.graph.as_node(operand), span)
    }

    // ── Subscripts ──

    fn subscripts(&mut self, subscripts: &[Option<Expr>]) -> Eval<Vec<Subscript>> {
        subscripts
            .iter()
            .map(|s| match s {
                None => Ok(Subscript::All),
                Some(expr) => self.subscript(expr),
            })
            .collect()
    }

    fn subscript(&mut self, expr: &Expr) -> Eval<Subscript> {
        match self.expr(expr)? {
            RValue::Bool(mask) => Ok(Subscript::Mask(mask)),
            other => {
                let values = self.numeric(other, expr.span)?;
                if values.iter().any(|x| x.is_nan()) {
                    return Err(Diagnostic::error(
                        codes::E_INDEX,
                        expr.span,
                        "NA subscripts are not supported",
                    ));
                }
                if values.iter().any(|x| x.is_infinite()) {
                    return Err(Diagnostic::error(
                        codes::E_INDEX,
                        expr.span,
                        "subscript out of bounds",
                    ));
                }
                Ok(Subscript::Positions(
                    values.iter().map(|x| x.trunc() as i64).collect(),
                ))
            }
        }
    }

    /// Named bracket arguments. `drop` is accepted and ignored.
    fn bracket_args(&mut self, named: &[Arg]) -> Eval<()> {
        for arg in named {
            let name = arg.name.as_ref().map(|n| n.name.as_str()).unwrap_or("");
            if name != "drop" {
                return Err(Diagnostic::error(
                    codes::E_CALL,
                    arg.span,
                    format!("unused argument '{}' in subscript", name),
                ));
            }
            if self.expr(&arg.value)? == RValue::Bool(vec![true]) {
                self.diagnostics.push(
                    Diagnostic::warning(
                        codes::W_IGNORED_ARG,
                        arg.span,
                        "drop = TRUE is ignored; results keep their dimensions",
                    )
                    .with_hint("remove the argument or pass drop = FALSE"),
                );
            }
        }
        Ok(())
    }

    // ── Calls ──

    fn eval_args(&mut self, args: &[Arg]) -> Eval<Vec<Evaluated>> {
        args.iter()
            .map(|arg| {
                Ok(Evaluated {
                    name: arg.name.as_ref().map(|n| n.name.clone()),
                    value: self.expr(&arg.value)?,
                    span: arg.value.span,
                })
            })
            .collect()
    }

    fn call(&mut self, callee: &Ident, args: &[Arg], span: Span) -> Eval<RValue> {
        let args = self.eval_args(args)?;
        let name = callee.name.as_str();
        match name {
            "c" => self.builtin_c(args),
            "cbind" | "rbind" => self.builtin_bind(name, args, span),
            "matrix" => self.builtin_matrix(args, span),
            "array" => self.builtin_array(args, span),
            "variable" => self.builtin_variable(args, span),
            "as_data" => {
                let [x] = match_args(name, &["x"], args)?;
                let x = required(x, name, "x", span)?;
                self.node_of(x.value, x.span).map(RValue::Node)
            }
            "rep" => self.builtin_rep(args, span),
            "head" | "tail" => self.builtin_head_tail(name, args, span),
            "dim" => {
                let [x] = match_args(name, &["x"], args)?;
                let x = required(x, name, "x", span)?;
                match x.value {
                    RValue::Node(id) => {
                        let shape = lift(reshape::dim(&self.session.graph, id), x.span)?;
                        Ok(RValue::Num(shape.dims().iter().map(|&d| d as f64).collect()))
                    }
                    _ => Ok(RValue::Null),
                }
            }
            "length" => {
                let [x] = match_args(name, &["x"], args)?;
                let x = required(x, name, "x", span)?;
                let len = match x.value {
                    RValue::Node(id) => lift(reshape::length(&self.session.graph, id), x.span)?,
                    RValue::Num(v) => v.len(),
                    RValue::Bool(b) => b.len(),
                    RValue::Null => 0,
                };
                Ok(RValue::Num(vec![len as f64]))
            }
            "seq_len" => {
                let [n] = match_args(name, &["length.out"], args)?;
                let n = required(n, name, "length.out", span)?;
                let n = self.count(n, "length.out")?;
                Ok(RValue::Num((1..=n).map(|i| i as f64).collect()))
            }
            other => Err(Diagnostic::error(
                codes::E_UNDEFINED,
                callee.span,
                format!("could not find function \"{}\"", other),
            )),
        }
    }

    fn builtin_c(&mut self, args: Vec<Evaluated>) -> Eval<RValue> {
        let values: Vec<Evaluated> = args
            .into_iter()
            .filter(|a| a.name.as_deref() != Some("recursive") && a.value != RValue::Null)
            .collect();
        if values.is_empty() {
            return Ok(RValue::Null);
        }
        if values.iter().all(|a| matches!(a.value, RValue::Bool(_))) {
            let mut out = Vec::new();
            for a in values {
                if let RValue::Bool(b) = a.value {
                    out.extend(b);
                }
            }
            return Ok(RValue::Bool(out));
        }
        if values.iter().all(|a| !matches!(a.value, RValue::Node(_))) {
            let mut out = Vec::new();
            for a in values {
                out.extend(self.numeric(a.value, a.span)?);
            }
            return Ok(RValue::Num(out));
        }
        let span = values[0].span;
        let operands = values
            .into_iter()
            .map(|a| self.operand(a.value, a.span))
            .collect::<Eval<Vec<_>>>()?;
        lift(combine::c(&mut self.session.graph, operands), span).map(RValue::Node)
    }

    fn builtin_bind(&mut self, name: &str, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let operands = args
            .into_iter()
            .filter(|a| a.value != RValue::Null)
            .map(|a| self.operand(a.value, a.span))
            .collect::<Eval<Vec<_>>>()?;
        let graph = &mut self.session.graph;
        let result = if name == "cbind" {
            combine::cbind(graph, operands)
        } else {
            combine::rbind(graph, operands)
        };
        lift(result, span).map(RValue::Node)
    }

    fn builtin_matrix(&mut self, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let [data, nrow, ncol, byrow] = match_args("matrix", &["data", "nrow", "ncol", "byrow"], args)?;
        let data = match data {
            Some(d) => self.numeric(d.value, d.span)?,
            None => vec![f64::NAN],
        };
        if data.is_empty() {
            return Err(Diagnostic::error(
                codes::E_ARGUMENT,
                span,
                "'data' must have positive length",
            ));
        }
        let nrow = nrow.map(|n| self.count(n, "nrow")).transpose()?;
        let ncol = ncol.map(|n| self.count(n, "ncol")).transpose()?;
        let byrow = match byrow {
            Some(b) => self.flag(b, "byrow")?,
            None => false,
        };
        let len = data.len();
        let (nrow, ncol) = match (nrow, ncol) {
            (None, None) => (len, 1),
            (Some(r), None) => (r, if r == 0 { 0 } else { len.div_ceil(r) }),
            (None, Some(c)) => (if c == 0 { 0 } else { len.div_ceil(c) }, c),
            (Some(r), Some(c)) => (r, c),
        };
        let shape = bounded(Shape::matrix(nrow, ncol), "matrix", span)?;
        let filled = recycle(&data, shape.len());
        let array = if byrow {
            from_rowwise(shape, &filled)
        } else {
            NdArray::matrix(filled, nrow, ncol)
        };
        let array = lift(array, span)?;
        Ok(RValue::Node(self.session.graph.data(array)))
    }

    fn builtin_array(&mut self, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let [data, dim] = match_args("array", &["data", "dim"], args)?;
        let data = match data {
            Some(d) => self.numeric(d.value, d.span)?,
            None => vec![f64::NAN],
        };
        let dims = match dim {
            Some(d) => self.counts(d, "dim")?,
            None => vec![data.len()],
        };
        let shape = bounded(Shape::new(dims), "array", span)?;
        if data.is_empty() && !shape.is_empty() {
            return Err(Diagnostic::error(
                codes::E_ARGUMENT,
                span,
                "'data' must have positive length",
            ));
        }
        let filled = recycle(&data, shape.len());
        let array = lift(NdArray::from_vec(shape, filled), span)?;
        Ok(RValue::Node(self.session.graph.data(array)))
    }

    /// `variable(3, 4)` or `variable(dim = c(3, 4))`; no arguments is a scalar.
    fn builtin_variable(&mut self, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let mut dims = Vec::new();
        for arg in args {
            match arg.name.as_deref() {
                None | Some("dim") => dims.extend(self.counts(arg, "dim")?),
                Some(other) => {
                    return Err(Diagnostic::error(
                        codes::E_CALL,
                        arg.span,
                        format!("unused argument '{}' in variable()", other),
                    ))
                }
            }
        }
        let shape = if dims.is_empty() {
            Shape::scalar()
        } else {
            Shape::new(dims)
        };
        if shape.dims().contains(&0) {
            return Err(Diagnostic::error(
                codes::E_ARGUMENT,
                span,
                format!("variable dimensions must be positive, got {}", shape),
            ));
        }
        let shape = bounded(shape, "variable", span)?;
        Ok(RValue::Node(self.session.graph.variable(shape)))
    }

    fn builtin_rep(&mut self, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let [x, times, length_out, each] =
            match_args("rep", &["x", "times", "length.out", "each"], args)?;
        let x = required(x, "rep", "x", span)?;
        let x = self.node_of(x.value, x.span)?;
        let mut how = Rep::default();
        if let Some(times) = times {
            how.times = self.counts(times, "times")?;
        }
        if let Some(each) = each {
            how.each = self.count(each, "each")?;
        }
        if let Some(length_out) = length_out {
            how.length_out = Some(self.count(length_out, "length.out")?);
        }
        lift(combine::rep(&mut self.session.graph, x, &how), span).map(RValue::Node)
    }

    fn builtin_head_tail(&mut self, name: &str, args: Vec<Evaluated>, span: Span) -> Eval<RValue> {
        let [x, n] = match_args(name, &["x", "n"], args)?;
        let x = required(x, name, "x", span)?;
        let x = self.node_of(x.value, x.span)?;
        let n = match n {
            Some(n) => {
                let nspan = n.span;
                match self.numeric(n.value, nspan)?.as_slice() {
                    [v] if v.is_finite() => v.trunc() as i64,
                    _ => {
                        return Err(Diagnostic::error(
                            codes::E_ARGUMENT,
                            nspan,
                            "invalid 'n' - must be a single number",
                        ))
                    }
                }
            }
            None => convenience::DEFAULT_N,
        };
        let graph = &mut self.session.graph;
        let result = if name == "head" {
            convenience::head(graph, x, n)
        } else {
            convenience::tail(graph, x, n)
        };
        lift(result, span).map(RValue::Node)
    }

    // ── Argument helpers ──

    /// Non-negative whole numbers, truncated.
    fn counts(&self, arg: Evaluated, what: &str) -> Eval<Vec<usize>> {
        let span = arg.span;
        let values = self.numeric(arg.value, span)?;
        values
            .iter()
            .map(|&v| {
                if v.is_finite() && v >= 0.0 {
                    Ok(v.trunc() as usize)
                } else {
                    Err(Diagnostic::error(
                        codes::E_ARGUMENT,
                        span,
                        format!("invalid '{}' argument", what),
                    ))
                }
            })
            .collect()
    }

    fn count(&self, arg: Evaluated, what: &str) -> Eval<usize> {
        let span = arg.span;
        match self.counts(arg, what)?.as_slice() {
            [n] => Ok(*n),
            _ => Err(Diagnostic::error(
                codes::E_ARGUMENT,
                span,
                format!("invalid '{}' argument", what),
            )),
        }
    }

    fn flag(&self, arg: Evaluated, what: &str) -> Eval<bool> {
        match arg.value {
            RValue::Bool(b) if b.len() == 1 => Ok(b[0]),
            _ => Err(Diagnostic::error(
                codes::E_ARGUMENT,
                arg.span,
                format!("'{}' must be TRUE or FALSE", what),
            )),
        }
    }
}

/// Match arguments to formals: exact names first, then positional arguments
/// fill the remaining formals in order.
fn match_args<const N: usize>(
    function: &str,
    formals: &[&str; N],
    args: Vec<Evaluated>,
) -> Eval<[Option<Evaluated>; N]> {
    let mut slots: [Option<Evaluated>; N] = std::array::from_fn(|_| None);
    let mut positional = Vec::new();
    for arg in args {
        let Some(name) = arg.name.clone() else {
            positional.push(arg);
            continue;
        };
        match formals.iter().position(|f| *f == name) {
            Some(i) if slots[i].is_none() => slots[i] = Some(arg),
            Some(_) => {
                return Err(Diagnostic::error(
                    codes::E_CALL,
                    arg.span,
                    format!("formal argument '{}' matched by multiple actual arguments", name),
                ))
            }
            None => {
                return Err(Diagnostic::error(
                    codes::E_CALL,
                    arg.span,
                    format!("unused argument '{}' in {}()", name, function),
                ))
            }
        }
    }
    for arg in positional {
        match slots.iter().position(Option::is_none) {
            Some(i) => slots[i] = Some(arg),
            None => {
                return Err(Diagnostic::error(
                    codes::E_CALL,
                    arg.span,
                    format!("unused argument in {}()", function),
                ))
            }
        }
    }
    Ok(slots)
}

/// Largest element count a node built from script arguments may have.
const MAX_ELEMENTS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Reject shapes whose element count overflows or cannot be allocated.
fn bounded(shape: Shape, function: &str, span: Span) -> Eval<Shape> {
    match shape.checked_len() {
        Some(len) if len <= MAX_ELEMENTS => Ok(shape),
        _ => lift(
            Err(ArrayError::shape(format!(
                "{}(): dimensions {} are too large",
                function, shape
            ))),
            span,
        ),
    }
}

fn required(slot: Option<Evaluated>, function: &str, formal: &str, span: Span) -> Eval<Evaluated> {
    slot.ok_or_else(|| {
        Diagnostic::error(
            codes::E_CALL,
            span,
            format!("argument \"{}\" is missing in {}(), with no default", formal, function),
        )
    })
}

/// `from:to` with unit steps toward `to`.
fn colon(from: f64, to: f64) -> Vec<f64> {
    let n = ((to - from).abs() + 1e-10).floor() as usize + 1;
    let step = if to >= from { 1.0 } else { -1.0 };
    (0..n).map(|i| from + step * i as f64).collect()
}

fn recycle(data: &[f64], len: usize) -> Vec<f64> {
    data.iter().copied().cycle().take(len).collect()
}

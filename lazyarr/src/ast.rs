// AST node types for array scripts.
//
// Every node carries a `SimpleSpan` for error reporting during evaluation.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

// ── Root ──

/// A complete script: a sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ── Statements ──

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `name <- expr`
    Assign { target: Ident, value: Expr },
    /// `name[subscripts] <- expr`
    IndexAssign {
        target: Ident,
        subscripts: Vec<Option<Expr>>,
        named: Vec<Arg>,
        value: Expr,
    },
    /// `dim(name) <- expr`
    DimAssign { target: Ident, value: Expr },
    /// A bare expression; its value is reported as a script output.
    Expr(Expr),
}

// ── Expressions ──

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Bool(bool),
    Na,
    Null,
    Name(Ident),
    /// Unary minus.
    Neg(Box<Expr>),
    /// `from:to`
    Range(Box<Expr>, Box<Expr>),
    /// `callee(args)`
    Call { callee: Ident, args: Vec<Arg> },
    /// `target[subscripts]`; `None` entries are missing subscripts. Named
    /// bracket arguments (`drop = FALSE`) are kept separately.
    Index {
        target: Box<Expr>,
        subscripts: Vec<Option<Expr>>,
        named: Vec<Arg>,
    },
}

/// A call argument, optionally named (`times = 3`).
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

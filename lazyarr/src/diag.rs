// diag.rs — Diagnostics for array scripts
//
// Shared diagnostic type for the script front-end: parse problems, name
// errors, and array construction errors lifted from `ArrayError`.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::ast::Span;
use crate::error::ArrayError;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0001`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Front-end
    pub const E_PARSE: DiagCode = DiagCode("E0001");
    pub const E_UNDEFINED: DiagCode = DiagCode("E0002");
    pub const E_TYPE: DiagCode = DiagCode("E0003");
    pub const E_CALL: DiagCode = DiagCode("E0004");

    // Array construction
    pub const E_SHAPE: DiagCode = DiagCode("E0100");
    pub const E_IMMUTABLE: DiagCode = DiagCode("E0200");
    pub const E_LENGTH: DiagCode = DiagCode("E0300");
    pub const E_INDEX: DiagCode = DiagCode("E0400");
    pub const E_ARGUMENT: DiagCode = DiagCode("E0500");
    pub const E_UNKNOWN_NODE: DiagCode = DiagCode("E0600");

    // Warnings
    pub const W_IGNORED_ARG: DiagCode = DiagCode("W0001");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted while parsing or evaluating a script.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code or hint.
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn error(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, span, message).with_code(code)
    }

    pub fn warning(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, span, message).with_code(code)
    }

    /// Lift an array construction error to a diagnostic at `span`.
    pub fn from_array_error(err: &ArrayError, span: Span) -> Self {
        let diag = Self::error(err.code(), span, err.to_string());
        match err {
            ArrayError::Immutability { .. } => {
                diag.with_hint("copy the variable into a derived array before assigning into it")
            }
            ArrayError::Length { .. } => {
                diag.with_hint("the replacement is recycled only when its length divides the number of slots")
            }
            _ => diag,
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// Line and column (both 1-based) of a byte offset in `source`.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let col = match before.rfind('\n') {
        Some(nl) => offset - nl,
        None => offset + 1,
    };
    (line, col)
}

// pipeline.rs — Script run orchestration
//
// Runs the front-end phases in order (parse, evaluate) and collects their
// diagnostics. Each phase reports through an `on_phase_complete` callback so
// callers can print diagnostics as soon as a phase finishes.
//
// Preconditions: none.
// Postconditions: `session` holds the graph built before the first error.
// Failure modes: parse errors skip evaluation.
// Side effects: with `verbose`, one timing line per phase on stderr.

use std::fmt;
use std::time::Instant;

use chumsky::error::Rich;
use chumsky::span::SimpleSpan;

use crate::diag::{codes, Diagnostic};
use crate::eval::{evaluate, Session};
use crate::lexer::Token;

/// Front-end phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Evaluate,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Parse => "parse",
            Phase::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a script run produced.
#[derive(Debug)]
pub struct RunResult {
    pub session: Session,
    pub diagnostics: Vec<Diagnostic>,
    /// Phase that produced the first error, if any.
    pub failed: Option<Phase>,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.failed.is_some()
    }
}

/// Convert a chumsky error to a parse diagnostic.
pub fn parse_diagnostic(err: &Rich<'_, Token, SimpleSpan>) -> Diagnostic {
    Diagnostic::error(codes::E_PARSE, *err.span(), err.to_string())
}

fn finish_phase(
    phase: Phase,
    diags: &[Diagnostic],
    started: Instant,
    verbose: bool,
    on_phase_complete: &mut impl FnMut(Phase, &[Diagnostic]),
) -> bool {
    on_phase_complete(phase, diags);
    if verbose {
        eprintln!(
            "lazyarr: {} complete, {:.1}ms",
            phase,
            started.elapsed().as_secs_f64() * 1000.0
        );
    }
    diags.iter().any(Diagnostic::is_error)
}

/// Parse and evaluate `source`.
pub fn run(
    source: &str,
    verbose: bool,
    mut on_phase_complete: impl FnMut(Phase, &[Diagnostic]),
) -> RunResult {
    let mut diagnostics = Vec::new();

    // ── Parse ──
    let started = Instant::now();
    let parsed = crate::parser::parse(source);
    let parse_diags: Vec<Diagnostic> = parsed.errors.iter().map(parse_diagnostic).collect();
    let failed = finish_phase(Phase::Parse, &parse_diags, started, verbose, &mut on_phase_complete);
    diagnostics.extend(parse_diags);
    let script = match parsed.script {
        Some(script) if !failed => script,
        _ => {
            return RunResult {
                session: Session::new(),
                diagnostics,
                failed: Some(Phase::Parse),
            }
        }
    };
    if verbose {
        eprintln!("lazyarr: parsed {} statements", script.statements.len());
    }

    // ── Evaluate ──
    let started = Instant::now();
    let result = evaluate(&script);
    let failed = finish_phase(
        Phase::Evaluate,
        &result.diagnostics,
        started,
        verbose,
        &mut on_phase_complete,
    );
    diagnostics.extend(result.diagnostics);
    if verbose {
        eprintln!("lazyarr: graph has {} nodes", result.session.graph.len());
    }

    RunResult {
        session: result.session,
        diagnostics,
        failed: failed.then_some(Phase::Evaluate),
    }
}

// Parser for array scripts.
//
// Parses a token stream (from the lexer) into a `Script`. Uses chumsky
// combinators.
//
// Grammar (informal):
//   script    := sep* (statement (sep+ statement)*)? sep*
//   statement := range ('<-' range)?
//   range     := unary (':' unary)?
//   unary     := '-'* postfix
//   postfix   := atom ('[' slot (',' slot)* ']')*
//   slot      := (IDENT '=' range | range)?
//   atom      := literal | IDENT '(' args ')' | IDENT | '(' range ')'
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns a script plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: script plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub script: Option<Script>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a script source string. Lexes then parses.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = script_parser(source);
    let (script, parse_errors) = parser.parse(stream).into_output_errors();

    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        script,
        errors: all_errors,
    }
}

/// One bracket slot before positional and named entries are split apart.
#[derive(Debug, Clone)]
enum Slot {
    Positional(Expr),
    Named(Arg),
}

/// Split bracket slots into positional subscripts and named arguments.
///
/// `x[]` has a single empty slot and means "no subscripts".
fn split_slots(slots: Vec<Option<Slot>>) -> (Vec<Option<Expr>>, Vec<Arg>) {
    let mut subscripts = Vec::new();
    let mut named = Vec::new();
    for slot in slots {
        match slot {
            Some(Slot::Named(arg)) => named.push(arg),
            Some(Slot::Positional(expr)) => subscripts.push(Some(expr)),
            None => subscripts.push(None),
        }
    }
    if subscripts.len() == 1 && subscripts[0].is_none() {
        subscripts.clear();
    }
    (subscripts, named)
}

// ── Main parser builder ──

fn script_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Script, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Separators ──

    let sep = just(Token::Newline).or(just(Token::Semicolon));

    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    // ── Expressions ──

    let expr = recursive(move |expr| {
        let literal = select! {
            Token::Number(n) => ExprKind::Number(n),
            Token::True => ExprKind::Bool(true),
            Token::False => ExprKind::Bool(false),
            Token::Na => ExprKind::Na,
            Token::Null => ExprKind::Null,
        }
        .map_with(|kind, e| Expr {
            kind,
            span: e.span(),
        });

        let arg = ident
            .clone()
            .then_ignore(just(Token::Equals))
            .or_not()
            .then(expr.clone())
            .map_with(|(name, value), e| Arg {
                name,
                value,
                span: e.span(),
            });

        let call = ident
            .clone()
            .then(
                arg.separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map_with(|(callee, args), e| Expr {
                kind: ExprKind::Call { callee, args },
                span: e.span(),
            });

        let name = ident.clone().map(|id| Expr {
            span: id.span,
            kind: ExprKind::Name(id),
        });

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((literal, call, name, paren));

        // ── Bracket subscripts ──

        let named_slot = ident
            .clone()
            .then_ignore(just(Token::Equals))
            .then(expr.clone())
            .map_with(|(name, value), e| {
                Slot::Named(Arg {
                    name: Some(name),
                    value,
                    span: e.span(),
                })
            });
        let slot = named_slot.or(expr.clone().map(Slot::Positional));

        let brackets = slot
            .or_not()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with(|slots, e| (slots, e.span()));

        let postfix = atom
            .then(brackets.repeated().collect::<Vec<_>>())
            .map(|(target, brackets)| {
                brackets
                    .into_iter()
                    .fold(target, |target, (slots, close): (_, SimpleSpan)| {
                        let span: SimpleSpan = (target.span.start()..close.end()).into();
                        let (subscripts, named) = split_slots(slots);
                        Expr {
                            kind: ExprKind::Index {
                                target: Box::new(target),
                                subscripts,
                                named,
                            },
                            span,
                        }
                    })
            });

        // ── Unary minus, then ranges ──

        let unary = just(Token::Minus)
            .map_with(|_, e| e.span())
            .repeated()
            .collect::<Vec<SimpleSpan>>()
            .then(postfix)
            .map(|(minuses, operand)| {
                minuses.into_iter().rev().fold(operand, |operand, minus| {
                    let span: SimpleSpan = (minus.start()..operand.span.end()).into();
                    Expr {
                        kind: ExprKind::Neg(Box::new(operand)),
                        span,
                    }
                })
            });

        unary
            .clone()
            .then(just(Token::Colon).ignore_then(unary).or_not())
            .map_with(|(from, to), e| match to {
                Some(to) => Expr {
                    kind: ExprKind::Range(Box::new(from), Box::new(to)),
                    span: e.span(),
                },
                None => from,
            })
    });

    // ── Statements ──

    let statement = expr
        .clone()
        .then(just(Token::Assign).ignore_then(expr).or_not())
        .try_map(|(lhs, rhs), span: SimpleSpan| {
            let kind = match rhs {
                None => Ok(StatementKind::Expr(lhs)),
                Some(value) => assignment(lhs, value),
            };
            match kind {
                Ok(kind) => Ok(Statement { kind, span }),
                Err(msg) => Err(Rich::custom(span, msg)),
            }
        });

    // ── Script ──

    sep.clone()
        .repeated()
        .ignore_then(
            statement
                .separated_by(sep.clone().repeated().at_least(1))
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(sep.repeated())
        .map_with(|statements, e| Script {
            statements,
            span: e.span(),
        })
}

/// Classify `lhs <- value` by the shape of the left-hand side.
fn assignment(lhs: Expr, value: Expr) -> Result<StatementKind, String> {
    match lhs.kind {
        ExprKind::Name(target) => Ok(StatementKind::Assign { target, value }),
        ExprKind::Index {
            target,
            subscripts,
            named,
        } => match target.kind {
            ExprKind::Name(target) => Ok(StatementKind::IndexAssign {
                target,
                subscripts,
                named,
                value,
            }),
            _ => Err("only a named array can be assigned into".to_string()),
        },
        ExprKind::Call { callee, mut args } if callee.name == "dim" => {
            match (args.len(), args.pop()) {
                (
                    1,
                    Some(Arg {
                        name: None,
                        value:
                            Expr {
                                kind: ExprKind::Name(target),
                                ..
                            },
                        ..
                    }),
                ) => Ok(StatementKind::DimAssign { target, value }),
                _ => Err("dim() assignment needs a single array name".to_string()),
            }
        }
        _ => Err("invalid assignment target".to_string()),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Script {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:#?}",
            result.errors
        );
        result.script.expect("expected script")
    }

    fn parse_all(source: &str) -> (Option<Script>, Vec<Rich<'static, Token, SimpleSpan>>) {
        let result = parse(source);
        (result.script, result.errors)
    }

    fn parse_one_stmt(source: &str) -> Statement {
        let script = parse_ok(source);
        assert_eq!(script.statements.len(), 1, "expected 1 statement");
        script.statements.into_iter().next().unwrap()
    }

    fn parse_expr(source: &str) -> Expr {
        match parse_one_stmt(source).kind {
            StatementKind::Expr(e) => e,
            other => panic!("expected expression, got {:?}", other),
        }
    }

    // ── Empty / blank ──

    #[test]
    fn empty_script() {
        assert!(parse_ok("").statements.is_empty());
        assert!(parse_ok("\n;\n").statements.is_empty());
    }

    // ── Assignments ──

    #[test]
    fn plain_assignment() {
        let s = parse_one_stmt("x <- matrix(1:12, 3, 4)");
        let StatementKind::Assign { target, value } = &s.kind else {
            panic!("expected Assign")
        };
        assert_eq!(target.name, "x");
        let ExprKind::Call { callee, args } = &value.kind else {
            panic!("expected Call")
        };
        assert_eq!(callee.name, "matrix");
        assert_eq!(args.len(), 3);
        assert!(matches!(args[0].value.kind, ExprKind::Range(..)));
    }

    #[test]
    fn index_assignment_with_missing_row() {
        let s = parse_one_stmt("x[, 2:4] <- 1:9");
        let StatementKind::IndexAssign {
            target, subscripts, ..
        } = &s.kind
        else {
            panic!("expected IndexAssign")
        };
        assert_eq!(target.name, "x");
        assert_eq!(subscripts.len(), 2);
        assert!(subscripts[0].is_none());
        assert!(matches!(
            subscripts[1].as_ref().map(|e| &e.kind),
            Some(ExprKind::Range(..))
        ));
    }

    #[test]
    fn dim_assignment() {
        let s = parse_one_stmt("dim(x) <- c(2, 6)");
        let StatementKind::DimAssign { target, value } = &s.kind else {
            panic!("expected DimAssign")
        };
        assert_eq!(target.name, "x");
        assert!(matches!(&value.kind, ExprKind::Call { callee, .. } if callee.name == "c"));
    }

    #[test]
    fn invalid_assignment_target() {
        let (_, errors) = parse_all("1 <- 2");
        assert!(!errors.is_empty());
        let (_, errors) = parse_all("dim(x, y) <- 2");
        assert!(!errors.is_empty());
    }

    // ── Expressions ──

    #[test]
    fn unary_minus_binds_tighter_than_range() {
        let e = parse_expr("-1:3");
        let ExprKind::Range(from, to) = &e.kind else {
            panic!("expected Range")
        };
        assert!(matches!(from.kind, ExprKind::Neg(_)));
        assert!(matches!(to.kind, ExprKind::Number(v) if v == 3.0));
    }

    #[test]
    fn empty_brackets_mean_no_subscripts() {
        let e = parse_expr("x[]");
        let ExprKind::Index { subscripts, .. } = &e.kind else {
            panic!("expected Index")
        };
        assert!(subscripts.is_empty());
    }

    #[test]
    fn named_drop_is_kept_apart() {
        let e = parse_expr("x[1, , drop = FALSE]");
        let ExprKind::Index {
            subscripts, named, ..
        } = &e.kind
        else {
            panic!("expected Index")
        };
        assert_eq!(subscripts.len(), 2);
        assert!(subscripts[1].is_none());
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].name.as_ref().unwrap().name, "drop");
    }

    #[test]
    fn chained_subscripts() {
        let e = parse_expr("x[1:2, ][2]");
        let ExprKind::Index { target, subscripts, .. } = &e.kind else {
            panic!("expected Index")
        };
        assert_eq!(subscripts.len(), 1);
        assert!(matches!(target.kind, ExprKind::Index { .. }));
        assert_eq!((e.span.start, e.span.end), (0, 11));
    }

    #[test]
    fn named_call_arguments() {
        let e = parse_expr("rep(x, length.out = 5)");
        let ExprKind::Call { args, .. } = &e.kind else {
            panic!("expected Call")
        };
        assert!(args[0].name.is_none());
        assert_eq!(args[1].name.as_ref().unwrap().name, "length.out");
    }

    #[test]
    fn literals() {
        assert!(matches!(parse_expr("TRUE").kind, ExprKind::Bool(true)));
        assert!(matches!(parse_expr("NA").kind, ExprKind::Na));
        assert!(matches!(parse_expr("NULL").kind, ExprKind::Null));
        assert!(matches!(parse_expr("(2.5)").kind, ExprKind::Number(v) if v == 2.5));
    }

    // ── Separators ──

    #[test]
    fn semicolons_and_newlines_separate_statements() {
        let script = parse_ok("x <- 1; y <- 2\n\nx\n");
        assert_eq!(script.statements.len(), 3);
    }

    #[test]
    fn spans_cover_statement() {
        let s = parse_one_stmt("y <- x[1]");
        assert_eq!((s.span.start, s.span.end), (0, 9));
    }

    // ── Errors ──

    #[test]
    fn error_unbalanced_bracket() {
        let (_, errors) = parse_all("x[1, 2");
        assert!(!errors.is_empty());
    }

    #[test]
    fn error_two_statements_on_one_line() {
        let (_, errors) = parse_all("x y");
        assert!(!errors.is_empty());
    }

    #[test]
    fn lex_errors_are_merged() {
        let (_, errors) = parse_all("x <- $");
        assert!(!errors.is_empty());
    }
}

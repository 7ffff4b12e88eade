// Lexer for array scripts.
//
// Tokens are recognised by a `logos` DFA. Whitespace other than newlines and
// `#` comments are skipped; newlines survive because they end statements.
//
// Preconditions: none.
// Postconditions: every token carries its byte range in the source.
// Failure modes: a character no rule accepts becomes a `LexError` and lexing
//   resumes after it.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte range of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A character the lexer could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Tokens in source order, with the errors met along the way.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Script token types.
///
/// Identifiers carry no value; use the span to retrieve the text from the
/// source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+|#[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("TRUE")]
    True,
    #[token("FALSE")]
    False,
    #[token("NA")]
    Na,
    #[token("NULL")]
    Null,

    // ── Symbols ──
    #[token("<-")]
    Assign,
    #[token("=")]
    Equals,
    #[token(":")]
    Colon,
    #[token("-")]
    Minus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // ── Literals ──
    /// Numeric literal (int, float, exponent, optional integer suffix `L`).
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?L?", parse_number)]
    Number(f64),

    // ── Identifier ──
    //
    // Placed after keywords: logos prioritises fixed `#[token]` matches
    // over regex for the same length, so `NA` matches Na, not Ident.
    /// Identifier: `[a-zA-Z][a-zA-Z0-9._]*` (dots allowed, as in `length.out`).
    #[regex(r"[a-zA-Z][a-zA-Z0-9._]*")]
    Ident,

    // ── Structure ──
    /// One or more newlines (statement terminator).
    #[regex(r"\n+")]
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::Na => write!(f, "NA"),
            Token::Null => write!(f, "NULL"),
            Token::Assign => write!(f, "<-"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Minus => write!(f, "-"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Number(v) => write!(f, "{v}"),
            Token::Ident => write!(f, "<ident>"),
            Token::Newline => write!(f, "<newline>"),
        }
    }
}

// ── Literal conversion ──

fn parse_number(lex: &mut logos::Lexer<'_, Token>) -> Option<f64> {
    lex.slice().trim_end_matches('L').parse().ok()
}

// ── Lexing ──

/// Split `source` into tokens. Bad characters are reported, not fatal.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected input {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let result = lex(source);
        assert!(result.errors.is_empty(), "lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn assignment_with_index() {
        assert_eq!(
            kinds("x[, 2:4] <- 1:9"),
            vec![
                Token::Ident,
                Token::LBracket,
                Token::Comma,
                Token::Number(2.0),
                Token::Colon,
                Token::Number(4.0),
                Token::RBracket,
                Token::Assign,
                Token::Number(1.0),
                Token::Colon,
                Token::Number(9.0),
            ]
        );
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(kinds("NA NULL TRUE FALSE NAME"), vec![
            Token::Na,
            Token::Null,
            Token::True,
            Token::False,
            Token::Ident,
        ]);
    }

    #[test]
    fn dotted_identifier_and_integer_suffix() {
        let result = lex("length.out = 3L");
        let (tok, span) = &result.tokens[0];
        assert_eq!(tok, &Token::Ident);
        assert_eq!((span.start, span.end), (0, 10));
        assert_eq!(result.tokens[2].0, Token::Number(3.0));
    }

    #[test]
    fn minus_is_separate_token() {
        assert_eq!(
            kinds("x[-1]"),
            vec![
                Token::Ident,
                Token::LBracket,
                Token::Minus,
                Token::Number(1.0),
                Token::RBracket
            ]
        );
    }

    #[test]
    fn comments_and_newlines() {
        assert_eq!(
            kinds("x <- 1 # note\n\ny"),
            vec![
                Token::Ident,
                Token::Assign,
                Token::Number(1.0),
                Token::Newline,
                Token::Ident
            ]
        );
    }

    #[test]
    fn bad_character_is_reported() {
        let result = lex("x <- 1 $ 2");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.tokens.len(), 4);
    }
}

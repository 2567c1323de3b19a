//! Tokenizer and literal coercion.
//!
//! Whitespace separates tokens; `(`, `)` and `'` are always tokens on their
//! own, so `'(a b)` and `(f'x)` split the same way as their padded forms.

use logos::Logos;
use opal_ir::{Atom, Symbol};

use crate::ParseError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"\s+")]
pub enum Token<'src> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    #[regex(r"[^\s()']+", |lex| lex.slice())]
    Word(&'src str),
}

/// Tokenize `text`, failing on the first unrecognized input.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut lexer = Token::lexer(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(ParseError::InvalidToken {
                    offset: lexer.span().start,
                })
            }
        }
    }
    Ok(tokens)
}

/// `-?[0-9]*\.?[0-9]+`
fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    digits.ends_with(|c: char| c.is_ascii_digit())
}

/// Coerce a bare word to its literal type.
///
/// Numbers with a decimal point are floats, other numbers integers;
/// `#t`/`#f` are booleans; anything else is a symbol.
pub fn classify(word: &str) -> Result<Atom, ParseError> {
    if is_number(word) {
        if word.contains('.') {
            if let Ok(value) = word.parse::<f64>() {
                return Ok(Atom::Float(value));
            }
        } else {
            return word
                .parse::<i64>()
                .map(Atom::Int)
                .map_err(|_| ParseError::IntegerOutOfRange {
                    literal: word.to_string(),
                });
        }
    }
    Ok(match word {
        "#t" => Atom::Bool(true),
        "#f" => Atom::Bool(false),
        _ => Atom::Symbol(Symbol::new(word)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;

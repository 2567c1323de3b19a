//! Tree building.
//!
//! Lists are assembled on an explicit frame stack, so nesting depth costs
//! heap rather than host stack.

use opal_ir::Expr;

use crate::lexer::{classify, tokenize, Token};
use crate::{ParseError, ParseResult};

/// A list under construction.
struct Frame {
    items: Vec<Expr>,
    /// Quote markers written directly before this list's `(`.
    quotes: usize,
}

impl Frame {
    fn new(quotes: usize) -> Self {
        Frame {
            items: Vec::new(),
            quotes,
        }
    }
}

fn wrap_quotes(mut expr: Expr, quotes: usize) -> Expr {
    for _ in 0..quotes {
        expr = Expr::quoted(expr);
    }
    expr
}

fn normalized(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read every top-level expression in `text`, in order.
pub fn parse_program(text: &str) -> ParseResult<Vec<Expr>> {
    let tokens = tokenize(text)?;
    let mut stack = vec![Frame::new(0)];
    let mut pending_quotes = 0usize;

    for token in tokens {
        match token {
            Token::Quote => pending_quotes += 1,
            Token::LParen => {
                stack.push(Frame::new(pending_quotes));
                pending_quotes = 0;
            }
            Token::RParen => {
                if pending_quotes > 0 {
                    return Err(ParseError::MalformedQuote {
                        text: normalized(text),
                    });
                }
                if stack.len() == 1 {
                    return Err(ParseError::UnmatchedClose {
                        text: normalized(text),
                    });
                }
                if let Some(frame) = stack.pop() {
                    let list = wrap_quotes(Expr::List(frame.items), frame.quotes);
                    if let Some(parent) = stack.last_mut() {
                        parent.items.push(list);
                    }
                }
            }
            Token::Word(word) => {
                let atom = Expr::Atom(classify(word)?);
                if let Some(top) = stack.last_mut() {
                    top.items.push(wrap_quotes(atom, pending_quotes));
                }
                pending_quotes = 0;
            }
        }
    }

    if pending_quotes > 0 {
        return Err(ParseError::MalformedQuote {
            text: normalized(text),
        });
    }
    if stack.len() > 1 {
        return Err(ParseError::UnmatchedOpen {
            text: normalized(text),
        });
    }
    let exprs = stack.pop().map(|root| root.items).unwrap_or_default();
    tracing::trace!(count = exprs.len(), "parsed program");
    Ok(exprs)
}

/// Read exactly one expression.
pub fn parse(text: &str) -> ParseResult {
    let mut exprs = parse_program(text)?;
    match exprs.len() {
        0 => Err(ParseError::Empty),
        1 => Ok(exprs.remove(0)),
        count => Err(ParseError::MultipleExpressions { count }),
    }
}

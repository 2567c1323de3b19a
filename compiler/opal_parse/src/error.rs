use thiserror::Error;

/// Malformed surface syntax.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unmatched opening parenthesis in {text}")]
    UnmatchedOpen { text: String },
    #[error("unmatched closing parenthesis in {text}")]
    UnmatchedClose { text: String },
    #[error("quote marker is not followed by an expression in {text}")]
    MalformedQuote { text: String },
    #[error("integer literal {literal} is out of range")]
    IntegerOutOfRange { literal: String },
    #[error("unrecognized input at offset {offset}")]
    InvalidToken { offset: usize },
    #[error("empty expression")]
    Empty,
    #[error("expected a single expression, found {count}")]
    MultipleExpressions { count: usize },
    #[error("unmatched closing comment in {line}")]
    UnmatchedCommentClose { line: String },
    #[error("fatal expression: {text}")]
    FatalExpression { text: String },
}

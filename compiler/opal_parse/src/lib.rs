//! OPAL Parse - the reader.
//!
//! Turns parenthesized surface text into [`Expr`] trees:
//! - [`lexer`]: logos tokenizer (parens, quote marker, atoms) and literal coercion
//! - [`parse`] / [`parse_program`]: tree building with paren-balance errors
//! - [`ExpressionBuffer`]: line accumulation with comment stripping, yielding
//!   complete chunks for a driver or for `load`
//!
//! The reader is stateless; only the buffer carries state (the nesting
//! depth of block comments and the pending text).

mod buffer;
mod error;
pub mod lexer;
mod reader;

pub use buffer::{Chunk, CommentDelimiters, ExpressionBuffer, EXTENSION_END, EXTENSION_START};
pub use error::ParseError;
pub use reader::{parse, parse_program};

use opal_ir::Expr;

/// Result of reading surface text.
pub type ParseResult<T = Expr> = Result<T, ParseError>;

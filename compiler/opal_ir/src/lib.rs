//! OPAL IR - expression trees.
//!
//! OPAL is homoiconic: the reader produces the same [`Expr`] trees that
//! programs manipulate as data. This crate holds those trees and their
//! surface formatting:
//! - [`Symbol`]: cheaply clonable identifier text
//! - [`Atom`]: integer, float, boolean, or symbol
//! - [`Expr`]: an atom or an ordered list of expressions
//!
//! Formatting is the inverse of reading: `(quote x)` prints as `'x`,
//! booleans as `#t`/`#f`.

mod expr;
mod symbol;

pub use expr::{Atom, Expr, FloatLiteral};
pub use symbol::Symbol;

/// Name of the quoting special form that `'x` expands to.
pub const QUOTE: &str = "quote";

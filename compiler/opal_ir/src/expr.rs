use std::fmt;

use crate::{Symbol, QUOTE};

/// An indivisible lexical unit.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Bool(bool),
    Symbol(Symbol),
}

/// A parsed OPAL expression: code and data share this shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Atom(Atom),
    List(Vec<Expr>),
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Atom(Atom::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Atom(Atom::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Atom(Atom::Bool(value))
    }

    pub fn symbol(text: &str) -> Self {
        Expr::Atom(Atom::Symbol(Symbol::new(text)))
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List(items)
    }

    /// Wrap `expr` as `(quote expr)`.
    pub fn quoted(expr: Expr) -> Self {
        Expr::List(vec![Expr::symbol(QUOTE), expr])
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Atom(Atom::Symbol(sym)) => Some(sym),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Expr]> {
        match self {
            Expr::List(items) => Some(items),
            Expr::Atom(_) => None,
        }
    }

    /// The operand of a two-element `(quote x)` list.
    pub fn quoted_operand(&self) -> Option<&Expr> {
        match self.as_list()? {
            [head, operand] if head.as_symbol().is_some_and(|s| s == QUOTE) => Some(operand),
            _ => None,
        }
    }
}

impl From<Atom> for Expr {
    fn from(atom: Atom) -> Self {
        Expr::Atom(atom)
    }
}

/// A float in literal syntax: positional digits and always a decimal
/// point, so the text reads back as the same float.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatLiteral(pub f64);

impl fmt::Display for FloatLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `Display` for f64 never switches to exponent notation.
        let digits = self.0.to_string();
        if self.0.is_finite() && !digits.contains('.') {
            write!(f, "{digits}.0")
        } else {
            f.write_str(&digits)
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(n) => write!(f, "{n}"),
            Atom::Float(x) => write!(f, "{}", FloatLiteral(*x)),
            Atom::Bool(true) => f.write_str("#t"),
            Atom::Bool(false) => f.write_str("#f"),
            Atom::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operand) = self.quoted_operand() {
            return write!(f, "'{operand}");
        }
        match self {
            Expr::Atom(atom) => write!(f, "{atom}"),
            Expr::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

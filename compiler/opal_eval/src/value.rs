//! Runtime values.
//!
//! A closed sum over everything the evaluator can produce: the atoms and
//! lists of the expression language plus the closure objects. Lists of
//! values are also code; `eval` and the list-head reduction rely on that.

use std::fmt;
use std::rc::Rc;

use opal_ir::{Atom, Expr, FloatLiteral, Symbol, QUOTE};

use crate::closures::{ClosureId, Frozen, Function, Instance, Lazy, Template};

#[derive(Clone, Debug)]
pub enum Value {
    /// Result of statements such as `set`, `def`, or `show`.
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Identifiers, and OPAL's string type.
    Symbol(Symbol),
    List(Rc<[Value]>),
    Function(Rc<Function>),
    Template(Rc<Template>),
    Instance(Rc<Instance>),
    Lazy(Rc<Lazy>),
    Frozen(Rc<Frozen>),
}

impl Value {
    pub fn symbol(text: &str) -> Self {
        Value::Symbol(Symbol::new(text))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::from(items))
    }

    pub fn empty_list() -> Self {
        Value::List(Rc::from(Vec::new()))
    }

    /// Wrap `value` as `(quote value)`.
    pub fn quoted(value: Value) -> Self {
        Value::list(vec![Value::symbol(QUOTE), value])
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Value::Frozen(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// The operand of a two-element `(quote x)` list.
    pub fn quoted_operand(&self) -> Option<&Value> {
        match self.as_list()? {
            [head, operand] if head.as_symbol().is_some_and(|s| s == QUOTE) => Some(operand),
            _ => None,
        }
    }

    /// Truthiness: `#f`, zero, the empty list, and void are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::List(items) => !items.is_empty(),
            Value::Symbol(sym) => !sym.as_str().is_empty(),
            Value::Function(_)
            | Value::Template(_)
            | Value::Instance(_)
            | Value::Lazy(_)
            | Value::Frozen(_) => true,
        }
    }

    /// Runtime type name, as used in type declarations and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Symbol(_) => "str",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Template(_) => "template",
            Value::Instance(_) => "instance",
            Value::Lazy(_) => "lazy",
            Value::Frozen(_) => "frozen",
        }
    }

    /// Closure-store key of a closable value.
    pub fn closure_id(&self) -> Option<ClosureId> {
        match self {
            Value::Function(f) => Some(f.id()),
            Value::Template(t) => Some(t.id()),
            Value::Instance(i) => Some(i.id()),
            _ => None,
        }
    }

    /// Whether this is the only handle to a closable value.
    ///
    /// Removing the last handle is what releases the closure-store entry.
    pub(crate) fn is_last_handle(&self) -> bool {
        match self {
            Value::Function(f) => Rc::strong_count(f) == 1,
            Value::Template(t) => Rc::strong_count(t) == 1,
            Value::Instance(i) => Rc::strong_count(i) == 1,
            _ => false,
        }
    }
}

impl From<&Expr> for Value {
    fn from(expr: &Expr) -> Self {
        match expr {
            Expr::Atom(Atom::Int(n)) => Value::Int(*n),
            Expr::Atom(Atom::Float(x)) => Value::Float(*x),
            Expr::Atom(Atom::Bool(b)) => Value::Bool(*b),
            Expr::Atom(Atom::Symbol(sym)) => Value::Symbol(sym.clone()),
            Expr::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// Structural for data, identity for closure objects.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Template(a), Value::Template(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Lazy(a), Value::Lazy(b)) => Rc::ptr_eq(a, b),
            (Value::Frozen(a), Value::Frozen(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operand) = self.quoted_operand() {
            return write!(f, "'{operand}");
        }
        match self {
            Value::Void => Ok(()),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{}", FloatLiteral(*x)),
            Value::Bool(true) => f.write_str("#t"),
            Value::Bool(false) => f.write_str("#f"),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::List(items) => {
                f.write_str("(")?;
                let mut first = true;
                for item in items.iter().filter(|v| !matches!(v, Value::Void)) {
                    if !first {
                        f.write_str(" ")?;
                    }
                    first = false;
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Value::Function(func) => write!(f, "<{} {}>", func.kind(), func.name()),
            Value::Template(template) => write!(f, "<template {}>", template.name()),
            Value::Instance(instance) => write!(f, "<instance {}>", instance.template_name()),
            Value::Lazy(lazy) => write!(f, "<lazy {}>", lazy.operator()),
            Value::Frozen(frozen) => write!(f, "<frozen {}>", frozen.expr()),
        }
    }
}

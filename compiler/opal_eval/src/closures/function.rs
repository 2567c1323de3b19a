use std::fmt;
use std::rc::Rc;

use opal_ir::Symbol;

use super::{ClosureId, ClosureStore};
use crate::environment::{Binder, Environment};
use crate::errors::malformed_form;
use crate::{EvalError, Value};

/// Name bound to a lambda inside its own body.
pub const SELF_NAME: &str = "self";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    /// Declared with `def`.
    Function,
    /// Anonymous; sees itself as `self` while running.
    Lambda,
    /// Declared with `func` inside a template.
    Method,
}

impl FunctionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Lambda => "lambda",
            FunctionKind::Method => "method",
        }
    }

    pub fn binds_self(self) -> bool {
        matches!(self, FunctionKind::Lambda)
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-defined function.
#[derive(Debug)]
pub struct Function {
    id: ClosureId,
    name: Symbol,
    kind: FunctionKind,
    params: Vec<Binder>,
    body: Value,
}

/// Read a parameter list: `(a (int b) c)`.
pub(crate) fn read_params(keyword: &str, params: &Value) -> Result<Vec<Binder>, EvalError> {
    match params {
        Value::List(items) => items.iter().map(Binder::from_value).collect(),
        _ => Err(malformed_form(keyword, params)),
    }
}

impl Function {
    /// Build a function whose closure is `closure`.
    ///
    /// Lambdas are named after their source so diagnostics can point at them.
    pub fn new(
        store: &mut ClosureStore,
        name: Symbol,
        kind: FunctionKind,
        params: &Value,
        body: Value,
        closure: Environment,
    ) -> Result<Rc<Function>, EvalError> {
        let binders = read_params(kind.as_str(), params)?;
        let name = match kind {
            FunctionKind::Lambda => Symbol::from(format!("{params} {body}")),
            FunctionKind::Function | FunctionKind::Method => name,
        };
        let id = store.allocate(closure);
        Ok(Rc::new(Function {
            id,
            name,
            kind,
            params: binders,
            body,
        }))
    }

    #[inline]
    pub fn id(&self) -> ClosureId {
        self.id
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn params(&self) -> &[Binder] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

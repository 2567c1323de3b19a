use crate::Value;

/// Call-by-need operator wrapper.
///
/// Applying it re-dispatches to `operator` with every argument wrapped as
/// [`Frozen`], leaving forcing to the callee.
#[derive(Debug)]
pub struct Lazy {
    operator: Value,
}

impl Lazy {
    pub fn new(operator: Value) -> Self {
        Lazy { operator }
    }

    pub fn operator(&self) -> &Value {
        &self.operator
    }
}

/// An unevaluated expression.
///
/// Forcing evaluates it in whatever environment is current at that moment,
/// not the one in effect when it was frozen.
#[derive(Debug)]
pub struct Frozen {
    expr: Value,
}

impl Frozen {
    pub fn new(expr: Value) -> Self {
        Frozen { expr }
    }

    pub fn expr(&self) -> &Value {
        &self.expr
    }
}

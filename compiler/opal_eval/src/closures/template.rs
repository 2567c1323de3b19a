use std::rc::Rc;

use opal_ir::Symbol;
use rustc_hash::FxHashMap;

use super::function::read_params;
use super::{ClosureId, ClosureStore, Function};
use crate::environment::{Binder, Environment};
use crate::errors::malformed_form;
use crate::{EvalError, Value};

/// Declarations found in a template body.
#[derive(Debug, Default)]
pub struct TemplateBody {
    /// `(func name (params) body)`, in order.
    pub methods: Vec<(Symbol, Value, Value)>,
    /// `(var name initializer)`, in order.
    pub variables: Vec<(Symbol, Value)>,
    /// `(init expr ...)`; the first one wins.
    pub init: Option<Vec<Value>>,
}

impl TemplateBody {
    /// Scan a template body once for its declarations.
    pub fn scan(body: &[Value]) -> Result<Self, EvalError> {
        let mut scanned = TemplateBody::default();
        for decl in body {
            let items = decl
                .as_list()
                .ok_or_else(|| malformed_form("template", decl))?;
            match items {
                [Value::Symbol(kw), Value::Symbol(name), params, body] if kw == "func" => {
                    scanned
                        .methods
                        .push((name.clone(), params.clone(), body.clone()));
                }
                [Value::Symbol(kw), Value::Symbol(name), init] if kw == "var" => {
                    scanned.variables.push((name.clone(), init.clone()));
                }
                [Value::Symbol(kw), exprs @ ..] if kw == "init" => {
                    if scanned.init.is_none() {
                        scanned.init = Some(exprs.to_vec());
                    }
                }
                _ => return Err(malformed_form("template", decl)),
            }
        }
        Ok(scanned)
    }
}

/// A prototype for instances.
#[derive(Debug)]
pub struct Template {
    id: ClosureId,
    name: Symbol,
    params: Vec<Binder>,
    methods: FxHashMap<Symbol, Rc<Function>>,
    variables: FxHashMap<Symbol, Value>,
    init: Option<Rc<[Value]>>,
}

impl Template {
    /// Build a template whose closure is `closure`.
    ///
    /// `closure` already holds the evaluated variables and the methods.
    pub fn new(
        store: &mut ClosureStore,
        name: Symbol,
        params: &Value,
        methods: FxHashMap<Symbol, Rc<Function>>,
        variables: FxHashMap<Symbol, Value>,
        init: Option<Vec<Value>>,
        closure: Environment,
    ) -> Result<Rc<Template>, EvalError> {
        let params = read_params("template", params)?;
        let id = store.allocate(closure);
        Ok(Rc::new(Template {
            id,
            name,
            params,
            methods,
            variables,
            init: init.map(Rc::from),
        }))
    }

    #[inline]
    pub fn id(&self) -> ClosureId {
        self.id
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    pub fn params(&self) -> &[Binder] {
        &self.params
    }

    pub fn method(&self, name: &str) -> Option<&Rc<Function>> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Symbol> {
        self.methods.keys()
    }

    /// Initial values of the declared variables.
    pub fn variables(&self) -> &FxHashMap<Symbol, Value> {
        &self.variables
    }

    pub fn init(&self) -> Option<&[Value]> {
        self.init.as_deref()
    }
}

/// An object created from a template.
#[derive(Debug)]
pub struct Instance {
    id: ClosureId,
    template: Rc<Template>,
}

impl Instance {
    pub fn new(store: &mut ClosureStore, template: Rc<Template>, closure: Environment) -> Rc<Instance> {
        let id = store.allocate(closure);
        Rc::new(Instance { id, template })
    }

    #[inline]
    pub fn id(&self) -> ClosureId {
        self.id
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn template_name(&self) -> &Symbol {
        self.template.name()
    }
}

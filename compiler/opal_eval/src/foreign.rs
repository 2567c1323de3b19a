//! Host modules reachable through `import`.
//!
//! The evaluator knows nothing about any particular module. Embedders
//! register [`ForeignModule`]s on the builder; `(import name)` makes one
//! visible under its name or an alias, and a `alias.member` head calls into
//! it with evaluated arguments.

use std::fmt;
use std::rc::Rc;

use opal_ir::Symbol;
use rustc_hash::FxHashMap;

use crate::errors::module_not_found;
use crate::{EvalError, EvalResult, Value};

pub trait ForeignModule {
    /// Name used by `import`.
    fn name(&self) -> &str;

    /// Call `member` with already-evaluated arguments. A member that is a
    /// constant is called with no arguments.
    fn call(&self, member: &str, args: &[Value]) -> EvalResult;
}

/// Modules available to import, and those imported so far.
#[derive(Default)]
pub struct ForeignRegistry {
    available: FxHashMap<Symbol, Rc<dyn ForeignModule>>,
    imported: FxHashMap<Symbol, Rc<dyn ForeignModule>>,
}

impl ForeignRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Rc<dyn ForeignModule>) {
        self.available.insert(Symbol::new(module.name()), module);
    }

    /// Make `name` visible as `alias`.
    pub fn import(&mut self, name: &str, alias: Symbol) -> Result<(), EvalError> {
        let module = self
            .available
            .get(name)
            .cloned()
            .ok_or_else(|| module_not_found(name))?;
        tracing::debug!(module = name, alias = %alias, "module imported");
        self.imported.insert(alias, module);
        Ok(())
    }

    pub fn imported(&self, alias: &str) -> Option<Rc<dyn ForeignModule>> {
        self.imported.get(alias).cloned()
    }

    pub fn is_imported(&self, alias: &str) -> bool {
        self.imported.contains_key(alias)
    }
}

impl fmt::Debug for ForeignRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut imported: Vec<_> = self.imported.keys().collect();
        imported.sort();
        f.debug_struct("ForeignRegistry")
            .field("available", &self.available.len())
            .field("imported", &imported)
            .finish()
    }
}

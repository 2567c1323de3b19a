//! `InterpreterBuilder` for creating sessions with a given configuration,
//! output, extension store, and foreign modules.

use std::rc::Rc;

use super::Interpreter;
use crate::config::SessionConfig;
use crate::extensions::{ExtensionRegistry, ExtensionStore};
use crate::foreign::{ForeignModule, ForeignRegistry};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::EvalError;

/// Builder for [`Interpreter`] sessions.
///
/// Without an extension store the session keeps extensions in memory;
/// without a print handler output goes to stdout.
pub struct InterpreterBuilder {
    config: SessionConfig,
    print_handler: Option<SharedPrintHandler>,
    store: Option<Box<dyn ExtensionStore>>,
    modules: Vec<Rc<dyn ForeignModule>>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            print_handler: None,
            store: None,
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Persist extensions in `store`. Its current content is the snapshot a
    /// non-permanent session rolls back to.
    #[must_use]
    pub fn extension_store(mut self, store: impl ExtensionStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Make `module` available to `import`.
    #[must_use]
    pub fn foreign_module(mut self, module: impl ForeignModule + 'static) -> Self {
        self.modules.push(Rc::new(module));
        self
    }

    /// Build the session and register the persisted extensions.
    pub fn build(self) -> Result<Interpreter, EvalError> {
        let mut foreign = ForeignRegistry::new();
        for module in self.modules {
            foreign.register(module);
        }
        let (extensions, persisted) = match self.store {
            Some(store) => ExtensionRegistry::open(store)?,
            None => (ExtensionRegistry::in_memory(), Vec::new()),
        };
        let mut interpreter = Interpreter::assemble(
            self.config,
            self.print_handler.unwrap_or_else(stdout_handler),
            extensions,
            foreign,
        );
        for block in &persisted {
            interpreter.register_extension(block)?;
        }
        interpreter.initial_keyword_count = interpreter.keywords.len();
        tracing::debug!(
            extensions = persisted.len(),
            keywords = interpreter.initial_keyword_count,
            "session started"
        );
        Ok(interpreter)
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

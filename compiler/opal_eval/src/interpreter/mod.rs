//! Tree-walking interpreter for OPAL.
//!
//! An [`Interpreter`] is one session: environment, closure store, keyword
//! table, globals, imported modules, and extension registry all live here,
//! so independent sessions never share state.
//!
//! # Evaluation
//!
//! [`Interpreter::evaluate`] walks a [`Value`] as code:
//!
//! - symbols resolve through the environment (keywords evaluate to
//!   themselves, frozen values are forced);
//! - a list headed by a closable applies it;
//! - a list headed by a keyword dispatches on the keyword's [`Keyword`]
//!   variant, which decides whether operands are evaluated first;
//! - a list headed by a bound variable has the variable's value substituted
//!   into head position, and a list headed by a list has its head reduced.
//!   Both repeat in a loop rather than by recursion, and stop at a fixpoint
//!   or after `max_call_depth` reductions;
//! - any other list is literal data and is evaluated element-wise.
//!
//! Every nested `evaluate` runs under
//! [`ensure_sufficient_stack`](opal_stack::ensure_sufficient_stack);
//! recursion in user programs is bounded separately by the call stack.
//!
//! Submodules:
//! - `function_call`: closures (functions, templates, instances, lazy values)
//! - `special_forms`: `set`, `lambda`, `cond`, `until`, ... and `c[ad]+r`
//! - `scope_guard`: RAII guards keeping the scope stack balanced on errors
//! - `builder`: [`InterpreterBuilder`]

mod builder;
mod function_call;
mod scope_guard;
mod special_forms;

pub use builder::InterpreterBuilder;
pub use scope_guard::{CallScope, ClosedScope, ScopedInterpreter};

use std::rc::Rc;

use opal_ir::{Expr, Symbol};
use opal_parse::{parse_program, Chunk, ExpressionBuffer};
use opal_stack::ensure_sufficient_stack;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;

use crate::closures::{ClosureStore, Function};
use crate::config::SessionConfig;
use crate::diagnostics::CallStack;
use crate::environment::{Binder, Environment};
use crate::errors::{
    extension_not_found, module_not_imported, not_callable, recursion_limit_exceeded,
    undefined_variable, unsupported_operand,
};
use crate::extensions::{parse_blocks, ExitReport, ExtensionBlock, ExtensionRegistry};
use crate::foreign::ForeignRegistry;
use crate::keywords::{expect_arity, import_path, is_accessor, Keyword, KeywordTable};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::{EvalError, EvalResult, Value};

/// Outcome of examining a list's head.
enum Step {
    Done(Value),
    /// Evaluate this list next.
    Reduce(Value),
}

/// A single OPAL session.
pub struct Interpreter {
    /// The running environment; the outermost frame holds top-level bindings.
    pub env: Environment,
    pub(crate) closures: ClosureStore,
    pub(crate) keywords: KeywordTable,
    pub(crate) globals: FxHashMap<Symbol, Value>,
    pub(crate) foreign: ForeignRegistry,
    pub(crate) extensions: ExtensionRegistry,
    pub(crate) call_stack: CallStack,
    pub(crate) config: SessionConfig,
    pub(crate) print_handler: SharedPrintHandler,
    initial_keyword_count: usize,
    error_count: usize,
}

impl Interpreter {
    /// A session with default configuration, stdout output, and an
    /// in-memory extension store.
    pub fn new() -> Self {
        Interpreter::assemble(
            SessionConfig::default(),
            stdout_handler(),
            ExtensionRegistry::in_memory(),
            ForeignRegistry::new(),
        )
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    fn assemble(
        config: SessionConfig,
        print_handler: SharedPrintHandler,
        extensions: ExtensionRegistry,
        foreign: ForeignRegistry,
    ) -> Self {
        let keywords = KeywordTable::with_builtins();
        let initial_keyword_count = keywords.len();
        Interpreter {
            env: Environment::new(),
            closures: ClosureStore::new(),
            keywords,
            globals: FxHashMap::default(),
            foreign,
            extensions,
            call_stack: CallStack::new(Some(config.max_call_depth)),
            config,
            print_handler,
            initial_keyword_count,
            error_count: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    /// Keywords currently registered, extensions included.
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Keywords registered when the session started.
    pub fn initial_keyword_count(&self) -> usize {
        self.initial_keyword_count
    }

    pub fn keyword_names(&self) -> Vec<Symbol> {
        self.keywords.names()
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.keywords.is_keyword(name)
    }

    /// Errors surfaced to the driver so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Live closure-store entries.
    pub fn closure_count(&self) -> usize {
        self.closures.len()
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    // Evaluation

    /// Evaluate `expr` in the current environment.
    pub fn evaluate(&mut self, expr: &Value) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(expr))
    }

    pub fn evaluate_expr(&mut self, expr: &Expr) -> EvalResult {
        self.evaluate(&Value::from(expr))
    }

    /// Parse and evaluate every expression in `source`, returning the last
    /// value. This is the driver's entry point: errors are counted, and in
    /// chaos mode each one costs a keyword.
    ///
    /// Earlier values are discarded; the returned one is the caller's to
    /// [`discard`](Self::discard).
    pub fn evaluate_source(&mut self, source: &str) -> EvalResult {
        let result = self.evaluate_program(source);
        result.map_err(|err| self.record_error(err))
    }

    /// Run a chunk produced by an [`ExpressionBuffer`]. Extension blocks are
    /// registered durably.
    pub fn run_chunk(&mut self, chunk: &Chunk) -> EvalResult {
        let result = self.run_chunk_inner(chunk);
        result.map_err(|err| self.record_error(err))
    }

    /// Run a whole source file's text.
    pub fn run_script(&mut self, text: &str) -> EvalResult {
        let chunks = ExpressionBuffer::split(text, self.config.comments.clone())?;
        let mut last = Value::Void;
        for chunk in &chunks {
            let value = self.run_chunk_inner(chunk)?;
            let previous = std::mem::replace(&mut last, value);
            self.discard(previous);
        }
        Ok(last)
    }

    fn run_chunk_inner(&mut self, chunk: &Chunk) -> EvalResult {
        match chunk {
            Chunk::Expressions(text) => self.evaluate_program(text),
            Chunk::Extension(body) => {
                self.extend(body, true)?;
                Ok(Value::Void)
            }
        }
    }

    fn evaluate_program(&mut self, source: &str) -> EvalResult {
        let mut last = Value::Void;
        for expr in parse_program(source)? {
            let value = self.evaluate_expr(&expr)?;
            let previous = std::mem::replace(&mut last, value);
            self.discard(previous);
        }
        Ok(last)
    }

    fn record_error(&mut self, err: EvalError) -> EvalError {
        self.error_count += 1;
        if !self.config.flags.chaos {
            return err;
        }
        match self.lose_random_keyword() {
            Some(lost) => err.with_note(format!(
                "chaos mode deleted the keyword '{lost}' ({} of {} remain)",
                self.keywords.len(),
                self.initial_keyword_count
            )),
            None => err,
        }
    }

    fn lose_random_keyword(&mut self) -> Option<Symbol> {
        let names = self.keywords.names();
        let lost = names.choose(&mut rand::thread_rng())?.clone();
        if let Some(Keyword::Extension(func)) = self.keywords.remove(lost.as_str()) {
            self.closures.release(Value::Function(func));
        }
        tracing::warn!(keyword = %lost, "chaos mode deleted a keyword");
        Some(lost)
    }

    fn eval_inner(&mut self, expr: &Value) -> EvalResult {
        let mut current = expr.clone();
        let mut reductions = 0usize;
        loop {
            let items = match &current {
                Value::Symbol(name) => return self.eval_symbol(name),
                Value::Frozen(frozen) => return self.thaw(frozen),
                Value::List(items) => Rc::clone(items),
                other => return Ok(other.clone()),
            };
            let Some((head, tail)) = items.split_first() else {
                return Ok(current);
            };
            let next = match head {
                Value::List(_) => {
                    let reduced = self.evaluate(head)?;
                    let next = with_head(reduced, tail);
                    if next == current {
                        return Ok(next);
                    }
                    next
                }
                Value::Symbol(name) => match self.apply_symbol(name, tail)? {
                    Step::Done(value) => return Ok(value),
                    Step::Reduce(next) => next,
                },
                Value::Function(_) | Value::Template(_) | Value::Instance(_) => {
                    let head = head.clone();
                    let tail = tail.to_vec();
                    drop(items);
                    drop(current);
                    return self.apply_closable(head, &tail);
                }
                Value::Lazy(lazy) => return self.apply_lazy(lazy, tail),
                Value::Void
                | Value::Int(_)
                | Value::Float(_)
                | Value::Bool(_)
                | Value::Frozen(_) => return self.eval_elements(&items),
            };
            reductions += 1;
            if reductions > self.config.max_call_depth {
                return Err(recursion_limit_exceeded(self.config.max_call_depth));
            }
            current = next;
        }
    }

    /// Apply a closable in head position, then release it if it was a
    /// temporary such as `((make-adder 1) 2)` or `((new T) m)`.
    fn apply_closable(&mut self, head: Value, tail: &[Value]) -> EvalResult {
        let result = match &head {
            Value::Function(func) => self.call_function(func, tail),
            Value::Template(template) => self.instantiate(template, tail),
            Value::Instance(instance) => self.invoke_member(instance, tail),
            other => Err(not_callable(other)),
        };
        self.discard(head);
        result
    }

    /// Drop a value that nothing will hold on to. A closable with no other
    /// handle loses its closure-store entry.
    pub fn discard(&mut self, value: Value) {
        self.closures.release(value);
    }

    fn eval_symbol(&mut self, name: &Symbol) -> EvalResult {
        if self.keywords.is_keyword(name.as_str()) {
            return Ok(Value::Symbol(name.clone()));
        }
        if let Some((module, member)) = import_path(name.as_str()) {
            if self.foreign.is_imported(module) {
                return self.call_foreign(module, member, &[]);
            }
        }
        self.lookup(name.as_str())
    }

    fn apply_symbol(&mut self, name: &Symbol, tail: &[Value]) -> Result<Step, EvalError> {
        let name = name.as_str();
        if let Some((module, member)) = import_path(name) {
            return self.call_foreign(module, member, tail).map(Step::Done);
        }
        if let Some(keyword) = self.keywords.get(name).cloned() {
            return self.apply_keyword(name, keyword, tail).map(Step::Done);
        }
        if is_accessor(name) {
            return self.apply_accessor(name, tail).map(Step::Done);
        }
        let value = self.lookup(name)?;
        Ok(Step::Reduce(with_head(value, tail)))
    }

    fn apply_keyword(&mut self, name: &str, keyword: Keyword, tail: &[Value]) -> EvalResult {
        match keyword {
            Keyword::Eager(handler) => {
                let args = self.eval_args(tail)?;
                let result = handler(self, &args);
                for arg in args {
                    self.discard(arg);
                }
                result
            }
            Keyword::Deferred(handler) | Keyword::EnvironmentOp(handler) => handler(self, tail),
            Keyword::BooleanCoerced { arity, handler } => {
                expect_arity(name, tail, arity)?;
                let mut flags = Vec::with_capacity(arity);
                for operand in tail {
                    let value = self.evaluate(operand)?;
                    flags.push(value.is_truthy());
                    self.discard(value);
                }
                Ok(Value::Bool(handler(&flags)))
            }
            Keyword::Extension(func) => {
                expect_arity(name, tail, func.arity())?;
                self.apply_function(&func, tail.to_vec())
            }
            Keyword::Special(form) => self.eval_special(form, tail),
        }
    }

    fn call_foreign(&mut self, module: &str, member: &str, tail: &[Value]) -> EvalResult {
        let target = self
            .foreign
            .imported(module)
            .ok_or_else(|| module_not_imported(module))?;
        let args = self.eval_args(tail)?;
        target.call(member, &args)
    }

    pub(crate) fn eval_args(&mut self, tail: &[Value]) -> Result<Vec<Value>, EvalError> {
        tail.iter().map(|operand| self.evaluate(operand)).collect()
    }

    fn eval_elements(&mut self, items: &[Value]) -> EvalResult {
        self.eval_args(items).map(Value::list)
    }

    // Environment access

    /// Resolve `name`, forcing a frozen value.
    ///
    /// An unbound name that is an imported module's alias is reported
    /// rather than treated as an error.
    pub fn lookup(&mut self, name: &str) -> EvalResult {
        match self.env.get(name) {
            Some(Value::Frozen(frozen)) => self.thaw(&frozen),
            Some(value) => Ok(value),
            None if self.foreign.is_imported(name) => {
                tracing::info!(module = name, "imported module referenced as a value");
                self.print_handler
                    .println(&format!("'{name}' is an imported module."));
                Ok(Value::Void)
            }
            None => Err(undefined_variable(name)),
        }
    }

    /// Bind in the innermost frame.
    pub(crate) fn bind_local(&mut self, binder: &Binder, value: Value) -> Result<(), EvalError> {
        self.env.set(binder, value, None, &mut self.closures)
    }

    pub(crate) fn assign(
        &mut self,
        binder: &Binder,
        value: Value,
        scope: Option<usize>,
    ) -> Result<(), EvalError> {
        self.env.set(binder, value, scope, &mut self.closures)
    }

    pub(crate) fn define(&mut self, name: Symbol, value: Value) -> Result<(), EvalError> {
        self.env.define(name, value, &mut self.closures)
    }

    pub(crate) fn delete(&mut self, name: &str) -> Result<(), EvalError> {
        self.env.delete(name, &mut self.closures)
    }

    pub(crate) fn end_scopes(&mut self, count: usize) {
        self.env.end_scope(count, &mut self.closures);
        tracing::trace!(depth = self.env.depth(), "scopes closed");
    }

    // Extensions

    /// Register every block in `source` as an extension keyword. Durable
    /// registrations are also appended to the persisted store.
    ///
    /// Either every block is registered (and persisted, if durable) or none
    /// is: all handlers are evaluated before any keyword is installed.
    pub fn extend(&mut self, source: &str, durable: bool) -> Result<Vec<Symbol>, EvalError> {
        let blocks = parse_blocks(source)?;
        let mut handlers = Vec::with_capacity(blocks.len());
        for block in &blocks {
            match self.compile_extension(block) {
                Ok(handler) => handlers.push(handler),
                Err(err) => return Err(self.abandon_extensions(handlers, err)),
            }
        }
        if durable {
            if let Err(err) = self.extensions.persist(&blocks) {
                return Err(self.abandon_extensions(handlers, err));
            }
        }
        for (block, handler) in blocks.iter().zip(handlers) {
            self.install_extension(block, handler);
        }
        Ok(blocks.into_iter().map(|block| block.alias).collect())
    }

    pub(crate) fn register_extension(&mut self, block: &ExtensionBlock) -> Result<(), EvalError> {
        let handler = self.compile_extension(block)?;
        self.install_extension(block, handler);
        Ok(())
    }

    /// Evaluate a block's body to its handler without touching the keyword
    /// table. Builtin names, `c[ad]+r` accessors included, are off limits.
    fn compile_extension(&mut self, block: &ExtensionBlock) -> Result<Rc<Function>, EvalError> {
        let alias = block.alias.as_str();
        let builtin = is_accessor(alias)
            || self
                .keywords
                .get(alias)
                .is_some_and(|kw| !matches!(kw, Keyword::Extension(_)));
        if builtin {
            return Err(EvalError::new(format!(
                "cannot register extension '{alias}': it is a builtin keyword"
            )));
        }
        match self.evaluate_program(&block.body)? {
            Value::Function(func) => Ok(func),
            other => {
                let err = unsupported_operand("extension", &other);
                self.discard(other);
                Err(err)
            }
        }
    }

    fn install_extension(&mut self, block: &ExtensionBlock, handler: Rc<Function>) {
        tracing::debug!(alias = %block.alias, name = %block.name, "extension registered");
        if let Some(Keyword::Extension(old)) = self
            .keywords
            .insert(block.alias.as_str(), Keyword::Extension(handler))
        {
            self.discard(Value::Function(old));
        }
    }

    fn abandon_extensions(&mut self, handlers: Vec<Rc<Function>>, err: EvalError) -> EvalError {
        for handler in handlers {
            self.discard(Value::Function(handler));
        }
        err
    }

    /// Remove an extension keyword and its persisted record.
    pub fn delete_extension(&mut self, alias: &str) -> Result<(), EvalError> {
        if !matches!(self.keywords.get(alias), Some(Keyword::Extension(_))) {
            return Err(extension_not_found(alias));
        }
        self.extensions.remove(alias)?;
        if let Some(Keyword::Extension(func)) = self.keywords.remove(alias) {
            self.closures.release(Value::Function(func));
        }
        tracing::debug!(alias, "extension deleted");
        Ok(())
    }

    /// End the session: keep or roll back this session's durable extensions
    /// according to the permanent-extensions flag.
    pub fn finish(&mut self) -> Result<ExitReport, EvalError> {
        self.extensions
            .finish(self.config.flags.permanent_extensions)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// `(value . tail)`
fn with_head(head: Value, tail: &[Value]) -> Value {
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(head);
    items.extend(tail.iter().cloned());
    Value::list(items)
}

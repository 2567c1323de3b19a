//! OPAL Eval - the evaluator and session runtime.
//!
//! # Architecture
//!
//! - [`Interpreter`]: one session. Owns the environment, the closure store,
//!   the keyword table, globals, imports, and the extension registry.
//! - [`Environment`]: a stack of shared scope frames; closures hold their own.
//! - [`ClosureStore`]: closure environments keyed by [`ClosureId`], released
//!   when the last handle to a function, template, or instance drops.
//! - [`KeywordTable`]: builtin and extension keywords with their evaluation
//!   category.
//! - [`ExtensionRegistry`]: durable records of extension keywords, with
//!   commit-or-rollback on session exit.
//!
//! Sessions are single-threaded (values use `Rc`). Only the extension store
//! is shared across sessions, behind a process-wide lock.

mod closures;
pub mod config;
mod diagnostics;
mod environment;
pub mod errors;
pub mod extensions;
pub mod foreign;
pub mod interpreter;
pub mod keywords;
mod print_handler;
mod value;

pub use closures::{
    ClosureId, ClosureStore, Frozen, Function, FunctionKind, Instance, Lazy, Template,
    TemplateBody, SELF_NAME,
};
pub use config::{SessionConfig, SessionFlags, DEFAULT_MAX_CALL_DEPTH};
pub use diagnostics::{CallFrame, CallStack};
pub use environment::{Binder, DeclaredType, Environment, LocalScope, Scope, Variable};
pub use errors::{ErrorCategory, EvalError, EvalErrorKind, EvalResult};
pub use extensions::{
    ExitReport, ExtensionBlock, ExtensionRegistry, ExtensionStore, FileStore, MemoryStore,
};
pub use foreign::{ForeignModule, ForeignRegistry};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use keywords::{Keyword, KeywordTable, SpecialForm};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use value::Value;

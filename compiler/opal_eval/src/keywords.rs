//! Keyword registry.
//!
//! One table maps every keyword name to a [`Keyword`], whose variant fixes
//! how the evaluator treats the operands before the handler runs. Builtins
//! are registered by the submodules; extensions are added and removed at
//! runtime, and chaos mode may remove anything.

mod arithmetic;
mod boolean;
mod control;
mod environment_ops;
mod lists;
mod predicates;

use std::fmt;
use std::rc::Rc;

use opal_ir::Symbol;
use rustc_hash::FxHashMap;

use crate::closures::Function;
use crate::errors::arity_mismatch;
use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult, Value};

/// A keyword implementation receiving its operands.
pub type Handler = fn(&mut Interpreter, &[Value]) -> EvalResult;

/// Forms whose evaluation rules live in the evaluator itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    Set,
    Lazy,
    Freeze,
    New,
    Until,
    Lambda,
    Cond,
    Quote,
}

impl SpecialForm {
    pub const ALL: [SpecialForm; 8] = [
        SpecialForm::Set,
        SpecialForm::Lazy,
        SpecialForm::Freeze,
        SpecialForm::New,
        SpecialForm::Until,
        SpecialForm::Lambda,
        SpecialForm::Cond,
        SpecialForm::Quote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Set => "set",
            SpecialForm::Lazy => "lazy",
            SpecialForm::Freeze => "freeze",
            SpecialForm::New => "new",
            SpecialForm::Until => "until",
            SpecialForm::Lambda => "lambda",
            SpecialForm::Cond => "cond",
            SpecialForm::Quote => opal_ir::QUOTE,
        }
    }
}

/// Evaluation strategy plus handler.
#[derive(Clone)]
pub enum Keyword {
    /// Operands are evaluated first.
    Eager(Handler),
    /// Operands are passed unevaluated; the handler decides what to force.
    Deferred(Handler),
    /// Operands are evaluated and coerced to booleans.
    BooleanCoerced {
        arity: usize,
        handler: fn(&[bool]) -> bool,
    },
    /// Operands are passed unevaluated to a handler that reshapes the environment.
    EnvironmentOp(Handler),
    /// A runtime-registered extension, called with unevaluated operands as data.
    Extension(Rc<Function>),
    Special(SpecialForm),
}

impl Keyword {
    pub fn category(&self) -> &'static str {
        match self {
            Keyword::Eager(_) => "regular",
            Keyword::Deferred(_) => "irregular",
            Keyword::BooleanCoerced { .. } => "boolean",
            Keyword::EnvironmentOp(_) => "environment",
            Keyword::Extension(_) => "extension",
            Keyword::Special(_) => "special",
        }
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Extension(func) => write!(f, "Extension({})", func.name()),
            Keyword::Special(form) => write!(f, "Special({})", form.name()),
            other => write!(f, "{}", other.category()),
        }
    }
}

/// Name to keyword.
#[derive(Clone, Debug, Default)]
pub struct KeywordTable {
    entries: FxHashMap<Symbol, Keyword>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The language's builtin keyword set.
    pub fn with_builtins() -> Self {
        let mut table = KeywordTable::new();
        arithmetic::register(&mut table);
        lists::register(&mut table);
        predicates::register(&mut table);
        boolean::register(&mut table);
        control::register(&mut table);
        environment_ops::register(&mut table);
        for form in SpecialForm::ALL {
            table.insert(form.name(), Keyword::Special(form));
        }
        table
    }

    pub fn insert(&mut self, name: &str, keyword: Keyword) -> Option<Keyword> {
        self.entries.insert(Symbol::new(name), keyword)
    }

    pub fn remove(&mut self, name: &str) -> Option<Keyword> {
        self.entries.remove(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Keyword> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names or accessor names.
    pub fn is_keyword(&self, name: &str) -> bool {
        self.contains(name) || is_accessor(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<Symbol> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

/// `c[ad]+r`
pub fn is_accessor(name: &str) -> bool {
    name.len() > 2
        && name
            .strip_prefix('c')
            .and_then(|rest| rest.strip_suffix('r'))
            .is_some_and(|ops| ops.chars().all(|c| c == 'a' || c == 'd'))
}

/// Split a `module.member` head.
pub fn import_path(name: &str) -> Option<(&str, &str)> {
    let (module, member) = name.split_once('.')?;
    let module_ok = !module.is_empty()
        && module
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == ',');
    let member_ok = !member.is_empty() && member.chars().all(|c| c.is_ascii_alphabetic());
    (module_ok && member_ok).then_some((module, member))
}

/// Fail unless exactly `expected` operands were given.
pub(crate) fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_mismatch(name, expected, args.len()))
    }
}

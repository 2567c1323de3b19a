//! Environment for variable scoping in the interpreter.
//!
//! An [`Environment`] is a stack of [`Scope`] frames. Frames are shared
//! handles ([`LocalScope`]): splicing a closure's environment into the
//! running one shares its frames, so assignments made during a call land in
//! the closure itself. [`Environment::deep_clone`] is the only way to get
//! independent frames.
//!
//! Frames are stored outermost first; depths handed out by
//! [`Environment::find_scope`] count from the innermost frame (0).

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use opal_ir::Symbol;
use rustc_hash::FxHashMap;

use crate::closures::ClosureStore;
use crate::errors::{
    delete_before_assignment, malformed_form, strict_type_violation, unknown_type,
};
use crate::{EvalError, Value};

/// A single-threaded scope wrapper for reference-counted interior mutability.
///
/// All frame allocations go through [`LocalScope::new`]. Clones share the
/// frame.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether no other environment shares this frame.
    #[inline]
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Types a variable may be declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Int,
    Float,
    Str,
    Lazy,
    List,
    Frozen,
    Function,
    Bool,
}

impl DeclaredType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => DeclaredType::Int,
            "float" => DeclaredType::Float,
            "str" => DeclaredType::Str,
            "lazy" => DeclaredType::Lazy,
            "list" => DeclaredType::List,
            "frozen" => DeclaredType::Frozen,
            "function" => DeclaredType::Function,
            "bool" => DeclaredType::Bool,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclaredType::Int => "int",
            DeclaredType::Float => "float",
            DeclaredType::Str => "str",
            DeclaredType::Lazy => "lazy",
            DeclaredType::List => "list",
            DeclaredType::Frozen => "frozen",
            DeclaredType::Function => "function",
            DeclaredType::Bool => "bool",
        }
    }

    /// The type predicate.
    pub fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DeclaredType::Int, Value::Int(_))
                | (DeclaredType::Float, Value::Float(_))
                | (DeclaredType::Str, Value::Symbol(_))
                | (DeclaredType::Lazy, Value::Lazy(_))
                | (DeclaredType::List, Value::List(_))
                | (DeclaredType::Frozen, Value::Frozen(_))
                | (DeclaredType::Function, Value::Function(_))
                | (DeclaredType::Bool, Value::Bool(_))
        )
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The left-hand side of a binding: `name` or `(type name)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binder {
    pub name: Symbol,
    pub declared: Option<DeclaredType>,
}

impl Binder {
    pub fn latent(name: Symbol) -> Self {
        Binder {
            name,
            declared: None,
        }
    }

    /// Read a binder from its surface form.
    pub fn from_value(spec: &Value) -> Result<Self, EvalError> {
        match spec {
            Value::Symbol(name) => Ok(Binder::latent(name.clone())),
            Value::List(items) => match &items[..] {
                [Value::Symbol(ty), Value::Symbol(name)] => {
                    let declared =
                        DeclaredType::from_name(ty.as_str()).ok_or_else(|| unknown_type(ty.as_str()))?;
                    Ok(Binder {
                        name: name.clone(),
                        declared: Some(declared),
                    })
                }
                _ => Err(malformed_form("binding", spec)),
            },
            _ => Err(malformed_form("binding", spec)),
        }
    }
}

/// A bound value, optionally with a declared type.
///
/// Strict variables (declared type present) never hold a value outside
/// their type; assignment is checked before anything changes.
#[derive(Clone, Debug)]
pub struct Variable {
    declared: Option<DeclaredType>,
    value: Value,
}

impl Variable {
    pub fn latent(value: Value) -> Self {
        Variable {
            declared: None,
            value,
        }
    }

    pub fn strict(name: &str, declared: DeclaredType, value: Value) -> Result<Self, EvalError> {
        if !declared.admits(&value) {
            return Err(strict_type_violation(
                name,
                declared.as_str(),
                value.type_name(),
            ));
        }
        Ok(Variable {
            declared: Some(declared),
            value,
        })
    }

    pub(crate) fn from_binder(binder: &Binder, value: Value) -> Result<Self, EvalError> {
        match binder.declared {
            Some(declared) => Variable::strict(binder.name.as_str(), declared, value),
            None => Ok(Variable::latent(value)),
        }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn declared(&self) -> Option<DeclaredType> {
        self.declared
    }

    pub fn is_strict(&self) -> bool {
        self.declared.is_some()
    }

    /// Declared type for strict variables, current value's type otherwise.
    pub fn type_name(&self) -> &'static str {
        self.declared
            .map_or_else(|| self.value.type_name(), DeclaredType::as_str)
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }

    /// Replace the value, returning the previous one.
    fn assign(&mut self, name: &str, value: Value) -> Result<Value, EvalError> {
        if let Some(declared) = self.declared {
            if !declared.admits(&value) {
                return Err(strict_type_violation(
                    name,
                    declared.as_str(),
                    value.type_name(),
                ));
            }
        }
        Ok(std::mem::replace(&mut self.value, value))
    }
}

/// One frame of bindings.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Symbol, Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.bindings.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bind without type checks against an existing variable.
    pub fn insert(&mut self, name: Symbol, variable: Variable) -> Option<Variable> {
        self.bindings.insert(name, variable)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.bindings.remove(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Symbol> {
        self.bindings.keys()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (Symbol, Variable)> + '_ {
        self.bindings.drain()
    }
}

/// Stack of frames. Never empty.
#[derive(Clone, Debug)]
pub struct Environment {
    frames: Vec<LocalScope<Scope>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            frames: vec![LocalScope::new(Scope::new())],
        }
    }

    /// Number of frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frames, outermost first.
    pub fn frames(&self) -> &[LocalScope<Scope>] {
        &self.frames
    }

    /// Push an empty frame.
    pub fn begin_scope(&mut self) {
        self.frames.push(LocalScope::new(Scope::new()));
    }

    /// Pop `n` frames. Popping every frame leaves a single empty one.
    pub fn end_scope(&mut self, n: usize, store: &mut ClosureStore) {
        let keep = self.frames.len().saturating_sub(n);
        self.truncate(keep, store);
    }

    /// Pop frames until `depth` remain (at least one).
    pub fn truncate(&mut self, depth: usize, store: &mut ClosureStore) {
        while self.frames.len() > depth {
            if let Some(frame) = self.frames.pop() {
                store.release_frame(frame);
            }
        }
        if self.frames.is_empty() {
            self.begin_scope();
        }
    }

    /// Pop the innermost frame unless it is the last one.
    pub(crate) fn pop_frame(&mut self) -> Option<LocalScope<Scope>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Splice `other`'s frames in as the innermost frames, sharing them.
    pub fn extend(&mut self, other: &Environment) {
        self.frames.extend(other.frames.iter().cloned());
    }

    /// Copy every frame so the result shares nothing with `self`.
    #[must_use]
    pub fn deep_clone(&self) -> Environment {
        Environment {
            frames: self
                .frames
                .iter()
                .map(|frame| LocalScope::new(frame.borrow().clone()))
                .collect(),
        }
    }

    /// Copies of every frame except the outermost.
    #[must_use]
    pub(crate) fn capture_locals(&self) -> Vec<LocalScope<Scope>> {
        self.frames
            .iter()
            .skip(1)
            .map(|frame| LocalScope::new(frame.borrow().clone()))
            .collect()
    }

    pub(crate) fn from_frames(frames: Vec<LocalScope<Scope>>) -> Environment {
        if frames.is_empty() {
            return Environment::new();
        }
        Environment { frames }
    }

    pub(crate) fn into_frames(self) -> Vec<LocalScope<Scope>> {
        self.frames
    }

    /// Depth of the innermost frame binding `name` (0 = innermost).
    pub fn find_scope(&self, name: &str) -> Option<usize> {
        self.frames
            .iter()
            .rev()
            .position(|frame| frame.borrow().contains(name))
    }

    /// Frame at `depth` from the innermost.
    pub fn frame(&self, depth: usize) -> Option<&LocalScope<Scope>> {
        let index = self.frames.len().checked_sub(depth + 1)?;
        self.frames.get(index)
    }

    pub fn innermost(&self) -> &LocalScope<Scope> {
        // frames is never empty
        &self.frames[self.frames.len() - 1]
    }

    /// The raw bound value, frozen values left unforced.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(name).map(|var| var.value().clone()))
    }

    /// Declared or inferred type of a bound variable.
    pub fn type_of(&self, name: &str) -> Option<&'static str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(name).map(Variable::type_name))
    }

    /// Bind `binder` to `value` in the frame at `scope` (innermost if `None`).
    ///
    /// An existing strict variable in that frame keeps its declared type and
    /// rejects the value before changing anything; otherwise a fresh
    /// variable replaces whatever was there. A closable that loses its last
    /// binding here releases its closure.
    pub fn set(
        &mut self,
        binder: &Binder,
        value: Value,
        scope: Option<usize>,
        store: &mut ClosureStore,
    ) -> Result<(), EvalError> {
        let frame = scope
            .and_then(|depth| self.frame(depth))
            .unwrap_or_else(|| self.innermost())
            .clone();
        let replaced = {
            let mut frame = frame.borrow_mut();
            let name = binder.name.as_str();
            if frame.get(name).is_some_and(Variable::is_strict) {
                frame
                    .bindings
                    .get_mut(name)
                    .map(|var| var.assign(name, value))
                    .transpose()?
            } else {
                let var = Variable::from_binder(binder, value)?;
                frame.insert(binder.name.clone(), var).map(Variable::into_value)
            }
        };
        if let Some(old) = replaced {
            store.release(old);
        }
        Ok(())
    }

    /// Bind a latent variable in the innermost frame.
    pub fn define(&mut self, name: Symbol, value: Value, store: &mut ClosureStore) -> Result<(), EvalError> {
        self.set(&Binder::latent(name), value, None, store)
    }

    /// Remove the innermost binding of `name`.
    pub fn delete(&mut self, name: &str, store: &mut ClosureStore) -> Result<(), EvalError> {
        let depth = self
            .find_scope(name)
            .ok_or_else(|| delete_before_assignment(name))?;
        let removed = self
            .frame(depth)
            .and_then(|frame| frame.borrow_mut().remove(name));
        if let Some(var) = removed {
            store.release(var.into_value());
        }
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, frame) in self.frames.iter().rev().enumerate() {
            writeln!(f, "Scope {depth}")?;
            let frame = frame.borrow();
            if frame.is_empty() {
                writeln!(f, "  None")?;
            }
            let mut names: Vec<_> = frame.bindings.iter().collect();
            names.sort_by(|a, b| a.0.cmp(b.0));
            for (name, var) in names {
                let kind = if var.is_strict() { "strict" } else { "latent" };
                writeln!(f, "  {name} : <{kind} {} {}>", var.type_name(), var.value())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;

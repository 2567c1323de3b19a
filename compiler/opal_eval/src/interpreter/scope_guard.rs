//! RAII-style scope guards for Interpreter environment management.
//!
//! Each guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`, so
//! code inside the scope uses the interpreter as usual. Cleanup runs in
//! `Drop`, on every exit path including `?` and unwinding:
//!
//! - [`ScopedInterpreter`]: one local frame (`let`, `do`, `until`).
//! - [`ClosedScope`]: a closure spliced in plus a local frame; new bindings
//!   in the local frame are absorbed into the closure on exit. Instance
//!   methods and `init` blocks run here, which is how instances keep state.
//! - [`CallScope`]: a function's closure spliced in with a fresh call frame
//!   pushed onto it, and a [`CallFrame`] on the call stack.
//!
//! ```text
//! interpreter.with_env_scope(|scoped| {
//!     scoped.bind_local(&binder, value)?;
//!     scoped.evaluate(body)
//! })
//! ```

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::closures::{ClosureId, Function};
use crate::diagnostics::CallFrame;
use crate::environment::Environment;
use crate::errors::missing_closure;
use crate::EvalError;

/// Pops the local frame on drop.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    base_depth: usize,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        let interp = &mut *self.interpreter;
        interp.env.truncate(self.base_depth, &mut interp.closures);
        tracing::trace!(depth = interp.env.depth(), "scope closed");
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

/// Runs with a closure spliced in; absorbs new local bindings into it on drop.
pub struct ClosedScope<'guard> {
    interpreter: &'guard mut Interpreter,
    closure: ClosureId,
    base_depth: usize,
    local_index: usize,
}

impl Drop for ClosedScope<'_> {
    fn drop(&mut self) {
        let interp = &mut *self.interpreter;
        if let Some(local) = interp.env.frames().get(self.local_index).cloned() {
            let bindings: Vec<_> = local.borrow_mut().drain().collect();
            let target = interp
                .closures
                .get(self.closure)
                .map(|env| env.innermost().clone());
            let mut released = Vec::new();
            match target {
                Some(frame) => {
                    let mut frame = frame.borrow_mut();
                    for (name, var) in bindings {
                        if let Some(old) = frame.insert(name, var) {
                            released.push(old.into_value());
                        }
                    }
                }
                None => released.extend(bindings.into_iter().map(|(_, var)| var.into_value())),
            }
            for value in released {
                interp.closures.release(value);
            }
        }
        interp.env.truncate(self.base_depth, &mut interp.closures);
    }
}

impl Deref for ClosedScope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ClosedScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

/// An active function call.
pub struct CallScope<'guard> {
    interpreter: &'guard mut Interpreter,
    closure: ClosureId,
    base_depth: usize,
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        let interp = &mut *self.interpreter;
        interp.env.truncate(self.base_depth, &mut interp.closures);
        let frame = interp
            .closures
            .get_mut(self.closure)
            .and_then(Environment::pop_frame);
        if let Some(frame) = frame {
            interp.closures.release_frame(frame);
        }
        interp.call_stack.pop();
    }
}

impl Deref for CallScope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for CallScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Push a local frame, popped when the guard drops.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        let base_depth = self.env.depth();
        self.env.begin_scope();
        tracing::trace!(depth = self.env.depth(), "scope opened");
        ScopedInterpreter {
            interpreter: self,
            base_depth,
        }
    }

    /// Run `f` in a fresh local frame.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Splice the closure `id` in and push a local frame.
    ///
    /// `owner` names the closable for the error raised when the closure is
    /// gone.
    pub(crate) fn closed(&mut self, id: ClosureId, owner: &str) -> Result<ClosedScope<'_>, EvalError> {
        let closure = self
            .closures
            .get(id)
            .cloned()
            .ok_or_else(|| missing_closure(owner))?;
        let base_depth = self.env.depth();
        self.env.extend(&closure);
        drop(closure);
        let local_index = self.env.depth();
        self.env.begin_scope();
        Ok(ClosedScope {
            interpreter: self,
            closure: id,
            base_depth,
            local_index,
        })
    }

    /// Enter a call of `func`: check the depth limit, push a call frame onto
    /// its closure, and splice the closure in.
    pub(crate) fn enter_call(&mut self, func: &Function) -> Result<CallScope<'_>, EvalError> {
        self.call_stack.push(CallFrame::new(func.name().clone()))?;
        let Some(closure) = self.closures.get_mut(func.id()) else {
            self.call_stack.pop();
            return Err(missing_closure(func.name().as_str()));
        };
        closure.begin_scope();
        let closure = closure.clone();
        let base_depth = self.env.depth();
        self.env.extend(&closure);
        drop(closure);
        Ok(CallScope {
            interpreter: self,
            closure: func.id(),
            base_depth,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;

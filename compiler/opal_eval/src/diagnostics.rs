//! Call tracking for the evaluator.
//!
//! Every function and method call pushes a [`CallFrame`]; the depth check
//! lives in [`CallStack::push`], so runaway recursion becomes a
//! `RecursionError` instead of a host stack overflow. Debug sessions snapshot
//! the stack onto errors as a backtrace.

use opal_ir::Symbol;

use crate::errors::recursion_limit_exceeded;
use crate::EvalError;

/// A single active call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub name: Symbol,
}

impl CallFrame {
    pub fn new(name: Symbol) -> Self {
        CallFrame { name }
    }
}

/// Live call stack.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `None` means no limit.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing when the limit is reached. The frame is not
    /// pushed on failure.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Names of the active calls, most recent first.
    pub fn capture(&self) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.name.to_string())
            .collect()
    }

    /// Attach a backtrace unless the error already carries one.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }

    /// Drop every frame. Used when a session recovers from an error.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}

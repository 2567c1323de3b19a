use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::environment::{Environment, LocalScope, Scope};
use crate::Value;

/// Key of a closure environment. Handed out in increasing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureId(u64);

impl fmt::Display for ClosureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session-scoped arena of closure environments.
///
/// Every live closable has exactly one entry. An entry is removed when the
/// last handle to its closable is released: a binding going away (deletion,
/// overwrite, or its frame being popped) or the evaluator dropping a
/// temporary. Entries reachable only through a removed entry are removed
/// with it.
#[derive(Debug, Default)]
pub struct ClosureStore {
    entries: FxHashMap<ClosureId, Environment>,
    next: u64,
}

impl ClosureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `env` under a fresh id.
    pub fn allocate(&mut self, env: Environment) -> ClosureId {
        let id = ClosureId(self.next);
        self.next += 1;
        self.entries.insert(id, env);
        tracing::trace!(%id, "closure allocated");
        id
    }

    /// The id the next allocation will receive.
    ///
    /// Every closable created after this call compares greater or equal.
    pub fn watermark(&self) -> ClosureId {
        ClosureId(self.next)
    }

    #[inline]
    pub fn get(&self, id: ClosureId) -> Option<&Environment> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ClosureId) -> Option<&mut Environment> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: ClosureId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swap in a new environment for `id`, releasing the old one.
    pub fn replace(&mut self, id: ClosureId, env: Environment) {
        if let Some(old) = self.entries.insert(id, env) {
            let mut pending = Vec::new();
            for frame in old.into_frames() {
                collect_frame(frame, &mut pending);
            }
            self.release_all(pending);
        }
    }

    /// Drop a binding's value, releasing its closure if it was the last handle.
    pub fn release(&mut self, value: Value) {
        self.release_all(vec![value]);
    }

    /// Release the bindings of a popped frame no one else shares.
    pub(crate) fn release_frame(&mut self, frame: LocalScope<Scope>) {
        let mut pending = Vec::new();
        collect_frame(frame, &mut pending);
        self.release_all(pending);
    }

    fn release_all(&mut self, mut pending: Vec<Value>) {
        while let Some(value) = pending.pop() {
            if let Value::List(mut items) = value {
                if let Some(items) = Rc::get_mut(&mut items) {
                    pending.extend(items.iter_mut().map(|v| std::mem::replace(v, Value::Void)));
                }
                continue;
            }
            if !value.is_last_handle() {
                continue;
            }
            let Some(id) = value.closure_id() else {
                continue;
            };
            // Drop the closable before its frames so handles it owned become last handles.
            drop(value);
            if let Some(env) = self.entries.remove(&id) {
                tracing::trace!(%id, "closure released");
                for frame in env.into_frames() {
                    collect_frame(frame, &mut pending);
                }
            }
        }
    }
}

fn collect_frame(frame: LocalScope<Scope>, pending: &mut Vec<Value>) {
    if frame.is_unique() {
        let mut scope = frame.borrow_mut();
        pending.extend(scope.drain().map(|(_, var)| var.into_value()));
    }
}

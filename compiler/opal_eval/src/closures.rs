//! Closure objects and the store that owns their environments.
//!
//! Functions, templates, and instances never own their environment. Each
//! holds a [`ClosureId`] into the interpreter's [`ClosureStore`], so a
//! function and the scope that contains it cannot form a reference cycle.

mod function;
mod lazy;
mod store;
mod template;

pub(crate) use function::read_params;
pub use function::{Function, FunctionKind, SELF_NAME};
pub use lazy::{Frozen, Lazy};
pub use store::{ClosureId, ClosureStore};
pub use template::{Instance, Template, TemplateBody};

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;

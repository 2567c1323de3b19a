use opal_ir::Symbol;
use pretty_assertions::assert_eq;

use super::*;
use crate::closures::FunctionKind;
use crate::environment::Binder;
use crate::errors::{undefined_variable, EvalErrorKind};
use crate::print_handler::silent_handler;
use crate::Value;

fn session() -> Interpreter {
    Interpreter::builder()
        .print_handler(silent_handler())
        .build()
        .unwrap()
}

#[test]
fn test_scoped_pops_frame_on_drop() {
    let mut interp = session();
    {
        let mut scoped = interp.scoped();
        assert_eq!(scoped.env.depth(), 2);
        scoped
            .bind_local(&Binder::latent(Symbol::new("tmp")), Value::Int(1))
            .unwrap();
    }
    assert_eq!(interp.env.depth(), 1);
    assert!(interp.env.get("tmp").is_none());
}

#[test]
fn test_with_env_scope_pops_frame_on_error() {
    let mut interp = session();
    let result: Result<(), EvalError> = interp.with_env_scope(|scoped| {
        scoped.env.begin_scope();
        scoped.env.begin_scope();
        Err(undefined_variable("x"))
    });
    assert!(result.is_err());
    assert_eq!(interp.env.depth(), 1);
}

#[test]
fn test_closed_scope_absorbs_new_bindings() {
    let mut interp = session();
    let func = interp
        .make_function(
            Symbol::new("holder"),
            FunctionKind::Function,
            &Value::empty_list(),
            Value::Void,
        )
        .unwrap();
    let id = func.closure_id().unwrap();
    {
        let mut closed = interp.closed(id, "holder").unwrap();
        closed
            .bind_local(&Binder::latent(Symbol::new("kept")), Value::Int(7))
            .unwrap();
    }
    assert_eq!(interp.env.depth(), 1);
    assert!(interp.env.get("kept").is_none());
    let closure = interp.closures.get(id).unwrap();
    assert_eq!(closure.get("kept"), Some(Value::Int(7)));
}

#[test]
fn test_closed_scope_on_missing_closure() {
    let mut interp = session();
    let func = interp
        .make_function(
            Symbol::new("gone"),
            FunctionKind::Function,
            &Value::empty_list(),
            Value::Void,
        )
        .unwrap();
    let id = func.closure_id().unwrap();
    interp.closures.release(func);
    let err = interp.closed(id, "gone").err().unwrap();
    assert!(matches!(err.kind, EvalErrorKind::MissingClosure { .. }));
    assert_eq!(interp.env.depth(), 1);
}

#[test]
fn test_call_scope_balances_closure_and_call_stack() {
    let mut interp = session();
    let Value::Function(func) = interp
        .make_function(
            Symbol::new("f"),
            FunctionKind::Function,
            &Value::empty_list(),
            Value::Void,
        )
        .unwrap()
    else {
        panic!("expected a function");
    };
    let closure_depth = interp.closures.get(func.id()).unwrap().depth();
    {
        let call = interp.enter_call(&func).unwrap();
        assert_eq!(call.call_stack.depth(), 1);
        assert_eq!(call.env.depth(), 1 + closure_depth + 1);
    }
    assert!(interp.call_stack.is_empty());
    assert_eq!(interp.env.depth(), 1);
    assert_eq!(
        interp.closures.get(func.id()).unwrap().depth(),
        closure_depth
    );
}

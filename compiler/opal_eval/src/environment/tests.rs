use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

fn sym(name: &str) -> Symbol {
    Symbol::new(name)
}

fn strict(name: &str, declared: DeclaredType) -> Binder {
    Binder {
        name: sym(name),
        declared: Some(declared),
    }
}

#[test]
fn test_define_and_get() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(1)));
    assert_eq!(env.get("y"), None);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    env.define(sym("x"), Value::Int(2), &mut store).unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(2)));
    assert_eq!(env.find_scope("x"), Some(0));
    env.end_scope(1, &mut store);
    assert_eq!(env.get("x"), Some(Value::Int(1)));
}

#[test]
fn test_find_scope_counts_from_innermost() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("outer"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    env.begin_scope();
    assert_eq!(env.find_scope("outer"), Some(2));
    assert_eq!(env.find_scope("missing"), None);
}

#[test]
fn test_set_at_scope_updates_outer_binding() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    let scope = env.find_scope("x");
    env.set(&Binder::latent(sym("x")), Value::Int(5), scope, &mut store)
        .unwrap();
    assert!(!env.innermost().borrow().contains("x"));
    env.end_scope(1, &mut store);
    assert_eq!(env.get("x"), Some(Value::Int(5)));
}

#[test]
fn test_strict_variable_rejects_wrong_type() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.set(&strict("n", DeclaredType::Int), Value::Int(1), None, &mut store)
        .unwrap();

    let err = env
        .set(&Binder::latent(sym("n")), Value::symbol("a"), None, &mut store)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StrictTypeViolation { .. }));
    assert_eq!(
        err.message,
        "variable n requires value of type <int> but received <str>"
    );
    // unchanged
    assert_eq!(env.get("n"), Some(Value::Int(1)));

    env.set(&Binder::latent(sym("n")), Value::Int(7), None, &mut store)
        .unwrap();
    assert_eq!(env.get("n"), Some(Value::Int(7)));
    assert_eq!(env.type_of("n"), Some("int"));
}

#[test]
fn test_strict_declaration_checks_initial_value() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    let err = env
        .set(&strict("f", DeclaredType::Float), Value::Int(1), None, &mut store)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StrictTypeViolation { .. }));
    assert_eq!(env.get("f"), None);
}

#[test]
fn test_latent_variable_takes_any_type() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("v"), Value::Int(1), &mut store).unwrap();
    env.define(sym("v"), Value::symbol("text"), &mut store).unwrap();
    assert_eq!(env.type_of("v"), Some("str"));
}

#[test]
fn test_delete_removes_innermost_binding() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    env.define(sym("x"), Value::Int(2), &mut store).unwrap();
    env.delete("x", &mut store).unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(1)));
}

#[test]
fn test_delete_unbound_is_an_error() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    let err = env.delete("ghost", &mut store).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::DeleteBeforeAssignment { .. }
    ));
}

#[test]
fn test_ending_every_scope_leaves_empty_global() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    env.end_scope(10, &mut store);
    assert_eq!(env.depth(), 1);
    assert_eq!(env.get("x"), None);
}

#[test]
fn test_extend_shares_frames() {
    let mut store = ClosureStore::new();
    let mut closure = Environment::new();
    closure
        .define(sym("count"), Value::Int(0), &mut store)
        .unwrap();

    let mut running = Environment::new();
    running.extend(&closure);
    running
        .define(sym("count"), Value::Int(1), &mut store)
        .unwrap();

    assert_eq!(closure.get("count"), Some(Value::Int(1)));
}

#[test]
fn test_deep_clone_is_independent() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    let mut copy = env.deep_clone();
    copy.define(sym("x"), Value::Int(2), &mut store).unwrap();
    assert_eq!(env.get("x"), Some(Value::Int(1)));
    assert_eq!(copy.get("x"), Some(Value::Int(2)));
    assert!(!env.innermost().ptr_eq(copy.innermost()));
}

#[test]
fn test_capture_locals_skips_global_frame() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("g"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    env.define(sym("l"), Value::Int(2), &mut store).unwrap();

    let captured = Environment::from_frames(env.capture_locals());
    assert_eq!(captured.get("l"), Some(Value::Int(2)));
    assert_eq!(captured.get("g"), None);
}

#[test]
fn test_pop_frame_keeps_last_frame() {
    let mut env = Environment::new();
    assert!(env.pop_frame().is_none());
    env.begin_scope();
    assert!(env.pop_frame().is_some());
    assert_eq!(env.depth(), 1);
}

#[test]
fn test_binder_from_value() {
    let binder = Binder::from_value(&Value::list(vec![
        Value::symbol("list"),
        Value::symbol("xs"),
    ]))
    .unwrap();
    assert_eq!(binder.name, "xs");
    assert_eq!(binder.declared, Some(DeclaredType::List));

    let err = Binder::from_value(&Value::list(vec![
        Value::symbol("widget"),
        Value::symbol("w"),
    ]))
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnknownType { .. }));

    assert!(Binder::from_value(&Value::Int(3)).is_err());
}

#[test]
fn test_display_lists_scopes_innermost_first() {
    let mut store = ClosureStore::new();
    let mut env = Environment::new();
    env.define(sym("x"), Value::Int(1), &mut store).unwrap();
    env.begin_scope();
    let text = env.to_string();
    assert_eq!(text, "Scope 0\n  None\nScope 1\n  x : <latent int 1>\n");
}

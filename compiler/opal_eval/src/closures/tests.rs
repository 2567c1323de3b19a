use std::rc::Rc;

use opal_ir::Symbol;
use pretty_assertions::assert_eq;

use super::*;
use crate::environment::Environment;
use crate::Value;

fn params(names: &[&str]) -> Value {
    Value::list(names.iter().map(|name| Value::symbol(name)).collect())
}

fn function(store: &mut ClosureStore, name: &str, closure: Environment) -> Rc<Function> {
    Function::new(
        store,
        Symbol::new(name),
        FunctionKind::Function,
        &params(&["x"]),
        Value::symbol("x"),
        closure,
    )
    .unwrap()
}

#[test]
fn test_ids_increase_and_watermark_tracks_next() {
    let mut store = ClosureStore::new();
    let mark = store.watermark();
    let a = store.allocate(Environment::new());
    let b = store.allocate(Environment::new());
    assert!(a >= mark);
    assert!(b > a);
    assert!(store.watermark() > b);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_release_of_last_handle_removes_entry() {
    let mut store = ClosureStore::new();
    let func = function(&mut store, "id", Environment::new());
    let id = func.id();
    assert!(store.contains(id));
    store.release(Value::Function(func));
    assert!(!store.contains(id));
    assert!(store.is_empty());
}

#[test]
fn test_release_with_other_handles_keeps_entry() {
    let mut store = ClosureStore::new();
    let func = function(&mut store, "id", Environment::new());
    let id = func.id();
    store.release(Value::Function(Rc::clone(&func)));
    assert!(store.contains(id));
    drop(func);
}

#[test]
fn test_release_cascades_through_closure_frames() {
    let mut store = ClosureStore::new();
    let inner = function(&mut store, "inner", Environment::new());
    let inner_id = inner.id();

    let mut closure = Environment::new();
    closure
        .define(Symbol::new("helper"), Value::Function(inner), &mut store)
        .unwrap();
    let outer = function(&mut store, "outer", closure);

    store.release(Value::Function(outer));
    assert!(!store.contains(inner_id));
    assert!(store.is_empty());
}

#[test]
fn test_release_descends_into_lists() {
    let mut store = ClosureStore::new();
    let func = function(&mut store, "f", Environment::new());
    let id = func.id();
    store.release(Value::list(vec![Value::Int(1), Value::Function(func)]));
    assert!(!store.contains(id));
}

#[test]
fn test_replace_releases_previous_environment() {
    let mut store = ClosureStore::new();
    let captured = function(&mut store, "captured", Environment::new());
    let captured_id = captured.id();

    let mut closure = Environment::new();
    closure
        .define(Symbol::new("c"), Value::Function(captured), &mut store)
        .unwrap();
    let owner = function(&mut store, "owner", closure);

    store.replace(owner.id(), Environment::new());
    assert!(!store.contains(captured_id));
    assert!(store.contains(owner.id()));
}

#[test]
fn test_lambda_is_named_after_its_source() {
    let mut store = ClosureStore::new();
    let lambda = Function::new(
        &mut store,
        Symbol::new("lambda"),
        FunctionKind::Lambda,
        &params(&["x"]),
        Value::list(vec![Value::symbol("+"), Value::symbol("x"), Value::Int(1)]),
        Environment::new(),
    )
    .unwrap();
    assert_eq!(lambda.name().as_str(), "(x) (+ x 1)");
    assert!(lambda.kind().binds_self());
    assert_eq!(lambda.arity(), 1);
}

#[test]
fn test_bad_parameter_list_allocates_nothing() {
    let mut store = ClosureStore::new();
    let result = Function::new(
        &mut store,
        Symbol::new("f"),
        FunctionKind::Function,
        &Value::Int(3),
        Value::Void,
        Environment::new(),
    );
    assert!(result.is_err());
    assert!(store.is_empty());
}

#[test]
fn test_template_body_scan() {
    let body = vec![
        Value::list(vec![
            Value::symbol("var"),
            Value::symbol("count"),
            Value::Int(0),
        ]),
        Value::list(vec![
            Value::symbol("func"),
            Value::symbol("bump"),
            params(&[]),
            Value::symbol("count"),
        ]),
        Value::list(vec![Value::symbol("init"), Value::Int(1)]),
        Value::list(vec![Value::symbol("init"), Value::Int(2)]),
    ];
    let scanned = TemplateBody::scan(&body).unwrap();
    assert_eq!(scanned.variables.len(), 1);
    assert_eq!(scanned.methods.len(), 1);
    assert_eq!(scanned.methods[0].0.as_str(), "bump");
    assert_eq!(scanned.init, Some(vec![Value::Int(1)]));
}

#[test]
fn test_template_body_rejects_unknown_declaration() {
    let body = vec![Value::list(vec![Value::symbol("field"), Value::symbol("x")])];
    assert!(TemplateBody::scan(&body).is_err());
    assert!(TemplateBody::scan(&[Value::Int(1)]).is_err());
}

#[test]
fn test_instances_get_their_own_entry() {
    let mut store = ClosureStore::new();
    let template = Template::new(
        &mut store,
        Symbol::new("Point"),
        &params(&["x"]),
        rustc_hash::FxHashMap::default(),
        rustc_hash::FxHashMap::default(),
        None,
        Environment::new(),
    )
    .unwrap();
    let a = Instance::new(&mut store, Rc::clone(&template), Environment::new());
    let b = Instance::new(&mut store, Rc::clone(&template), Environment::new());
    assert_ne!(a.id(), b.id());
    assert_eq!(a.template_name().as_str(), "Point");
    assert_eq!(store.len(), 3);

    store.release(Value::Instance(a));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_frozen_keeps_expression() {
    let expr = Value::list(vec![Value::symbol("+"), Value::Int(1), Value::Int(2)]);
    let frozen = Frozen::new(expr.clone());
    assert_eq!(frozen.expr(), &expr);
    let lazy = Lazy::new(Value::symbol("f"));
    assert_eq!(lazy.operator(), &Value::symbol("f"));
}

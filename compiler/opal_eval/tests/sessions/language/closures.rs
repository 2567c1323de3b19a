use opal_eval::Value;
use pretty_assertions::assert_eq;

use crate::common::{run, session};

#[test]
fn test_returned_function_resolves_defining_scope() {
    let mut interp = session();
    run(
        &mut interp,
        "(def make-greeter (greeting) (lambda (name) (list greeting name)))",
    );
    run(&mut interp, "(set hello (make-greeter 'hello))");
    // an unrelated caller binding the same name must not leak in
    run(&mut interp, "(def call-with-greeting (f greeting) (f 'ann))");
    assert_eq!(
        run(&mut interp, "(call-with-greeting hello 'bye)").to_string(),
        "(hello ann)"
    );
}

#[test]
fn test_nested_returned_functions() {
    let mut interp = session();
    run(
        &mut interp,
        "(def curry3 (a) (lambda (b) (lambda (c) (+ a (+ b c)))))",
    );
    run(&mut interp, "(set step (curry3 1))");
    run(&mut interp, "(set last (step 10))");
    assert_eq!(run(&mut interp, "(last 100)"), Value::Int(111));
}

#[test]
fn test_functions_as_arguments() {
    let mut interp = session();
    run(
        &mut interp,
        "(def map (f xs) (cond ((null? xs) ()) (else (cons (f (car xs)) (map f (cdr xs))))))",
    );
    assert_eq!(
        run(&mut interp, "(map (lambda (x) (* x x)) (1 2 3))").to_string(),
        "(1 4 9)"
    );
}

#[test]
fn test_closure_store_does_not_grow_with_calls() {
    let mut interp = session();
    run(&mut interp, "(def add (a b) (+ a b))");
    let before = interp.closure_count();
    for _ in 0..10 {
        run(&mut interp, "(add 1 2)");
    }
    assert_eq!(interp.closure_count(), before);
}

#[test]
fn test_temporary_closables_are_released() {
    let mut interp = session();
    run(&mut interp, "(def mk (n) (lambda (x) (+ x n)))");
    run(&mut interp, "(template Cell () (var v 1) (func get () v))");
    let before = interp.closure_count();
    for _ in 0..10 {
        assert_eq!(run(&mut interp, "((mk 1) 2)"), Value::Int(3));
        assert_eq!(run(&mut interp, "((new Cell) get)"), Value::Int(1));
        assert_eq!(run(&mut interp, "((lambda (x) x) 4)"), Value::Int(4));
        run(&mut interp, "(show (mk 5) (new Cell))");
        run(&mut interp, "(mk 6) (new Cell) 0");
    }
    assert_eq!(interp.closure_count(), before);
}

#[test]
fn test_discarding_a_returned_closable_releases_it() {
    let mut interp = session();
    run(&mut interp, "(def mk (n) (lambda (x) (+ x n)))");
    let before = interp.closure_count();
    let adder = run(&mut interp, "(mk 1)");
    assert_eq!(interp.closure_count(), before + 1);
    interp.discard(adder);
    assert_eq!(interp.closure_count(), before);
}

#[test]
fn test_lazy_callee_controls_forcing() {
    let mut interp = session();
    run(&mut interp, "(def pick (flag a b) (cond (flag a) (else b)))");
    run(&mut interp, "(set lazy-pick (lazy pick))");
    assert_eq!(run(&mut interp, "(lazy-pick #t 1 (car ()))"), Value::Int(1));
    assert_eq!(run(&mut interp, "(lazy-pick #f (car ()) 2)"), Value::Int(2));
}

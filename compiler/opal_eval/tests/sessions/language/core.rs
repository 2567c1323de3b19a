use opal_eval::{ErrorCategory, EvalErrorKind, Value};
use opal_parse::parse;
use pretty_assertions::assert_eq;

use crate::common::{output, run, session};

#[test]
fn test_arithmetic_results() {
    let mut interp = session();
    for (source, expected) in [
        ("(+ 1 2)", Value::Int(3)),
        ("(* 4 3)", Value::Int(12)),
        ("(/ 1 2)", Value::Float(0.5)),
        ("(// 5 2)", Value::Int(2)),
    ] {
        let expr = parse(source).unwrap();
        assert_eq!(interp.evaluate_expr(&expr).unwrap(), expected, "{source}");
    }
}

#[test]
fn test_parse_then_format_is_stable() {
    for source in ["(+ 1 2)", "(def f (x) (* x 2.5))", "(cond ((null? xs) #f) (else 'a))"] {
        assert_eq!(parse(source).unwrap().to_string(), source);
    }
}

#[test]
fn test_scope_bindings_vanish_after_surface() {
    let mut interp = session();
    run(&mut interp, "(set x 'outer)");
    run(&mut interp, "(burrow)");
    run(&mut interp, "(set y 1)");
    assert_eq!(interp.env.find_scope("x"), Some(1));
    run(&mut interp, "(surface)");

    let err = interp.evaluate_source("y").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);
    assert_eq!(run(&mut interp, "x"), Value::symbol("outer"));
}

#[test]
fn test_inner_binding_does_not_alter_outer() {
    let mut interp = session();
    run(&mut interp, "(set x 1)");
    assert_eq!(run(&mut interp, "(let ((x 2)) x)"), Value::Int(2));
    assert_eq!(run(&mut interp, "x"), Value::Int(1));
}

#[test]
fn test_strict_variable_keeps_its_type() {
    let mut interp = session();
    run(&mut interp, "(set (int x) 1)");
    let err = interp.evaluate_source("(set x 'text)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Type);
    run(&mut interp, "(set x 2)");
    assert_eq!(interp.env.type_of("x"), Some("int"));
    assert_eq!(run(&mut interp, "x"), Value::Int(2));
}

#[test]
fn test_arity_error_names_function_and_counts() {
    let mut interp = session();
    run(&mut interp, "(def pair (a b) (list a b))");
    let err = interp.evaluate_source("(pair 1)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Type);
    assert!(err.message.contains("pair"));
    assert!(err.message.contains('2'));
    assert!(err.message.contains('1'));
}

#[test]
fn test_thaw_uses_environment_at_force_time() {
    let mut interp = session();
    run(&mut interp, "(set v 'outer)");
    run(&mut interp, "(set frozen (freeze v))");
    assert_eq!(run(&mut interp, "(let ((v 'inner)) frozen)"), Value::symbol("inner"));
    assert_eq!(run(&mut interp, "frozen"), Value::symbol("outer"));
}

#[test]
fn test_errors_leave_scope_stack_balanced() {
    let mut interp = session();
    run(&mut interp, "(def explode (n) (let ((m n)) (do ((set k 1)) (car n))))");
    for _ in 0..3 {
        let err = interp.evaluate_source("(explode 5)").unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::UnsupportedOperand { .. }));
        assert_eq!(interp.env.depth(), 1);
    }
}

#[test]
fn test_deep_recursion_reports_limit() {
    let mut interp = session();
    run(&mut interp, "(def down (n) (cond ((== n 0) 0) (else (down (- n 1)))))");
    assert_eq!(run(&mut interp, "(down 500)"), Value::Int(0));
    let err = interp.evaluate_source("(down 5000)").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StackOverflow { .. }));
    assert_eq!(run(&mut interp, "(down 3)"), Value::Int(0));
}

#[test]
fn test_show_formats_values() {
    let mut interp = session();
    run(&mut interp, "(show (1 2.0 #t) 'done)");
    run(&mut interp, "(show (set z 1))");
    assert_eq!(output(&interp), "(1 2.0 #t) done\n\n");
}

#[test]
fn test_parse_errors_are_syntax_errors() {
    let mut interp = session();
    let err = interp.evaluate_source("(+ 1 2").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
    let err = interp.evaluate_source("(cxr (1))").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);
}

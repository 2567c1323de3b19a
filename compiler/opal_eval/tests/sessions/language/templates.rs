use opal_eval::{ErrorCategory, Value};
use pretty_assertions::assert_eq;

use crate::common::{run, session};

const STACK: &str = "(template Stack (label)
    (var items ())
    (var pushes 0)
    (init (set pushes 0))
    (func push (x) (do ((set items (cons x items)) (set pushes (++ pushes))) pushes))
    (func top () (car items))
    (func size () (len items)))";

#[test]
fn test_instances_have_independent_state() {
    let mut interp = session();
    run(&mut interp, STACK);
    run(&mut interp, "(set a (new Stack 'first))");
    run(&mut interp, "(set b (new Stack 'second))");

    run(&mut interp, "(a push 1)");
    run(&mut interp, "(a push 2)");
    run(&mut interp, "(b push 9)");

    assert_eq!(run(&mut interp, "(a size)"), Value::Int(2));
    assert_eq!(run(&mut interp, "(a top)"), Value::Int(2));
    assert_eq!(run(&mut interp, "(b size)"), Value::Int(1));
    assert_eq!(run(&mut interp, "(b top)"), Value::Int(9));
    assert_eq!(run(&mut interp, "(a label)"), Value::symbol("first"));

    // the template itself is untouched
    run(&mut interp, "(set c (new Stack 'third))");
    assert_eq!(run(&mut interp, "(c size)"), Value::Int(0));
}

#[test]
fn test_unknown_member_is_a_name_error() {
    let mut interp = session();
    run(&mut interp, STACK);
    run(&mut interp, "(set s (new Stack 'x))");
    let err = interp.evaluate_source("(s pop)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Name);
}

#[test]
fn test_instance_without_member_is_itself() {
    let mut interp = session();
    run(&mut interp, STACK);
    run(&mut interp, "(set s (new Stack 'x))");
    assert_eq!(run(&mut interp, "(s)").to_string(), "<instance Stack>");
}

#[test]
fn test_instance_as_argument() {
    let mut interp = session();
    run(&mut interp, STACK);
    run(&mut interp, "(def fill (stack n) (repeat n (stack push n)))");
    run(&mut interp, "(set s (new Stack 'x))");
    run(&mut interp, "(fill s 3)");
    assert_eq!(run(&mut interp, "(s size)"), Value::Int(3));
}

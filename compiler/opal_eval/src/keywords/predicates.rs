use super::{expect_arity, Keyword, KeywordTable};
use crate::interpreter::Interpreter;
use crate::{EvalResult, Value};

pub(super) fn register(table: &mut KeywordTable) {
    table.insert("null?", Keyword::Eager(is_null));
    table.insert("atom?", Keyword::Eager(is_atom));
    table.insert("number?", Keyword::Eager(is_number));
    table.insert("bool?", Keyword::Eager(is_bool));
    table.insert("list?", Keyword::Eager(is_list));
    table.insert("string?", Keyword::Eager(is_string));
}

fn predicate(name: &str, args: &[Value], test: fn(&Value) -> bool) -> EvalResult {
    expect_arity(name, args, 1)?;
    Ok(Value::Bool(test(&args[0])))
}

fn is_null(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("null?", args, |v| v.as_list().is_some_and(<[Value]>::is_empty))
}

fn is_atom(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("atom?", args, |v| !v.is_list())
}

fn is_number(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("number?", args, |v| matches!(v, Value::Int(_) | Value::Float(_)))
}

fn is_bool(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("bool?", args, |v| matches!(v, Value::Bool(_)))
}

fn is_list(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("list?", args, Value::is_list)
}

fn is_string(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    predicate("string?", args, |v| matches!(v, Value::Symbol(_)))
}

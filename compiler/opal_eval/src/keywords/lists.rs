//! List and string operations, `show`, and `usrin`.

use std::cmp::Ordering;
use std::rc::Rc;

use super::arithmetic::{compare, values_equal};
use super::{expect_arity, Keyword, KeywordTable};
use crate::errors::{index_out_of_bounds, io_error, unsupported_operand};
use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult, Value};

pub(super) fn register(table: &mut KeywordTable) {
    table.insert("len", Keyword::Eager(len));
    table.insert("sort", Keyword::Eager(sort));
    table.insert("append", Keyword::Eager(append));
    table.insert("cons", Keyword::Eager(cons));
    table.insert("elem", Keyword::Eager(elem));
    table.insert("ref", Keyword::Eager(list_ref));
    table.insert("list", Keyword::Eager(list));
    table.insert("show", Keyword::Eager(show));
    table.insert("usrin", Keyword::Eager(usrin));
}

fn count(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn len(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("len", args, 1)?;
    match &args[0] {
        Value::List(items) => Ok(count(items.len())),
        Value::Symbol(text) => Ok(count(text.as_str().chars().count())),
        other => Err(unsupported_operand("len", other)),
    }
}

fn sort(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("sort", args, 1)?;
    let Value::List(items) = &args[0] else {
        return Err(unsupported_operand("sort", &args[0]));
    };
    let mut sorted = items.to_vec();
    // Check every pair up front; sort_by cannot propagate errors.
    for pair in sorted.windows(2) {
        compare("sort", &pair[0], &pair[1])?;
    }
    sorted.sort_by(|a, b| compare("sort", a, b).unwrap_or(Ordering::Equal));
    Ok(Value::list(sorted))
}

fn append(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("append", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::List(a), Value::List(b)) => Ok(Value::List(
            a.iter().chain(b.iter()).cloned().collect::<Rc<[Value]>>(),
        )),
        (Value::List(_), other) | (other, _) => Err(unsupported_operand("append", other)),
    }
}

fn cons(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("cons", args, 2)?;
    let Value::List(tail) = &args[1] else {
        return Err(unsupported_operand("cons", &args[1]));
    };
    Ok(Value::List(
        std::iter::once(args[0].clone())
            .chain(tail.iter().cloned())
            .collect::<Rc<[Value]>>(),
    ))
}

fn elem(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("elem", args, 2)?;
    match (&args[0], &args[1]) {
        (needle, Value::List(items)) => {
            Ok(Value::Bool(items.iter().any(|item| values_equal(needle, item))))
        }
        (Value::Symbol(needle), Value::Symbol(haystack)) => {
            Ok(Value::Bool(haystack.as_str().contains(needle.as_str())))
        }
        (_, other) => Err(unsupported_operand("elem", other)),
    }
}

/// Resolve a possibly negative index against `len`.
fn resolve_index(index: i64, len: usize) -> Result<usize, EvalError> {
    let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { index + signed_len } else { index };
    usize::try_from(resolved)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| index_out_of_bounds(index, len))
}

fn list_ref(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("ref", args, 2)?;
    let Value::List(items) = &args[0] else {
        return Err(unsupported_operand("ref", &args[0]));
    };
    let Value::Int(index) = args[1] else {
        return Err(unsupported_operand("ref", &args[1]));
    };
    let i = resolve_index(index, items.len())?;
    Ok(items[i].clone())
}

/// Copy of `items` with the element at `index` replaced.
pub(super) fn replace_at(items: &[Value], index: i64, value: Value) -> Result<Value, EvalError> {
    let i = resolve_index(index, items.len())?;
    let mut updated = items.to_vec();
    updated[i] = value;
    Ok(Value::list(updated))
}

fn list(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    Ok(Value::list(args.to_vec()))
}

fn joined(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn show(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    interp.print_handler.println(&joined(args));
    Ok(Value::Void)
}

/// `(usrin prompt ...)`: one line of input, as a string.
fn usrin(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let prompt = format!("{} ", joined(args));
    let line = interp
        .print_handler
        .read_line(&prompt)
        .map_err(|err| io_error(format!("could not read input: {err}")))?;
    Ok(Value::symbol(&line))
}

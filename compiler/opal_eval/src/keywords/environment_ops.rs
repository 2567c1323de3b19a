//! Keywords that reshape the environment: definitions, deletion, explicit
//! scope control, and extension removal.

use opal_ir::Symbol;

use super::{Keyword, KeywordTable};
use crate::closures::FunctionKind;
use crate::errors::{malformed_form, unsupported_operand};
use crate::interpreter::Interpreter;
use crate::{EvalResult, Value};

pub(super) fn register(table: &mut KeywordTable) {
    table.insert("def", Keyword::EnvironmentOp(def));
    table.insert("template", Keyword::EnvironmentOp(template));
    table.insert("del", Keyword::EnvironmentOp(del));
    table.insert("burrow", Keyword::EnvironmentOp(burrow));
    table.insert("surface", Keyword::EnvironmentOp(surface));
    table.insert("delex", Keyword::EnvironmentOp(delex));
}

fn whole(keyword: &str, tail: &[Value]) -> Value {
    let mut items = vec![Value::symbol(keyword)];
    items.extend(tail.iter().cloned());
    Value::list(items)
}

/// `(def name (params) body)`
fn def(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [Value::Symbol(name), params, body] = tail else {
        return Err(malformed_form("def", &whole("def", tail)));
    };
    let func = interp.make_function(name.clone(), FunctionKind::Function, params, body.clone())?;
    interp.define(name.clone(), func)?;
    Ok(Value::Void)
}

/// `(template name (params) declaration ...)`
fn template(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [Value::Symbol(name), params, decls @ ..] = tail else {
        return Err(malformed_form("template", &whole("template", tail)));
    };
    let template = interp.make_template(name.clone(), params, decls)?;
    interp.define(name.clone(), template)?;
    Ok(Value::Void)
}

/// `(del name ...)`
fn del(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    if tail.is_empty() {
        return Err(malformed_form("del", &whole("del", tail)));
    }
    let names = tail
        .iter()
        .map(|v| v.as_symbol().cloned().ok_or_else(|| malformed_form("del", v)))
        .collect::<Result<Vec<Symbol>, _>>()?;
    for name in names {
        interp.delete(name.as_str())?;
    }
    Ok(Value::Void)
}

/// `(burrow)`: open a scope that stays open until `surface`.
fn burrow(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    if !tail.is_empty() {
        return Err(malformed_form("burrow", &whole("burrow", tail)));
    }
    interp.env.begin_scope();
    tracing::trace!(depth = interp.env.depth(), "scope opened");
    Ok(Value::Void)
}

/// `(surface)` or `(surface n)`: close scopes. Closing every scope leaves an
/// empty global one.
fn surface(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let count = match tail {
        [] => 1,
        [n] => {
            let n = interp.evaluate(n)?;
            n.as_int()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| unsupported_operand("surface", &n))?
        }
        _ => return Err(malformed_form("surface", &whole("surface", tail))),
    };
    interp.end_scopes(count);
    Ok(Value::Void)
}

/// `(delex alias)`
fn delex(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [Value::Symbol(alias)] = tail else {
        return Err(malformed_form("delex", &whole("delex", tail)));
    };
    interp.delete_extension(alias.as_str())?;
    Ok(Value::Void)
}

//! Keywords that decide for themselves which operands to evaluate.

use opal_ir::Symbol;

use super::lists::replace_at;
use super::{expect_arity, Keyword, KeywordTable};
use crate::environment::Binder;
use crate::errors::{io_error, malformed_form, undefined_global, unsupported_operand};
use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult, Value};

/// Source files `load` accepts.
pub const SOURCE_EXTENSION: &str = ".op";

pub(super) fn register(table: &mut KeywordTable) {
    table.insert("let", Keyword::Deferred(let_form));
    table.insert("do", Keyword::Deferred(do_form));
    table.insert("repeat", Keyword::Deferred(repeat));
    table.insert("eval", Keyword::Deferred(eval));
    table.insert("global", Keyword::Deferred(global));
    table.insert("import", Keyword::Deferred(import));
    table.insert("load", Keyword::Deferred(load));
    table.insert("getfile", Keyword::Deferred(getfile));
    table.insert("setref", Keyword::Deferred(setref));
}

fn symbol_operand<'a>(keyword: &str, operand: &'a Value) -> Result<&'a Symbol, EvalError> {
    operand
        .as_symbol()
        .ok_or_else(|| malformed_form(keyword, operand))
}

/// `(let ((name value) ...) body)`
fn let_form(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [bindings, body] = tail else {
        return Err(malformed_form("let", &Value::list(tail.to_vec())));
    };
    let pairs = bindings
        .as_list()
        .ok_or_else(|| malformed_form("let", bindings))?;
    let mut bound = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let [spec, init] = pair.as_list().unwrap_or_default() else {
            return Err(malformed_form("let", pair));
        };
        let binder = Binder::from_value(spec)?;
        bound.push((binder, interp.evaluate(init)?));
    }
    interp.with_env_scope(|scoped| {
        for (binder, value) in bound {
            scoped.bind_local(&binder, value)?;
        }
        scoped.evaluate(body)
    })
}

/// `(do (expr ...) body)`
fn do_form(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [steps, body] = tail else {
        return Err(malformed_form("do", &Value::list(tail.to_vec())));
    };
    let steps = steps.as_list().ok_or_else(|| malformed_form("do", steps))?;
    interp.with_env_scope(|scoped| {
        for step in steps {
            let value = scoped.evaluate(step)?;
            scoped.discard(value);
        }
        scoped.evaluate(body)
    })
}

/// `(repeat n body)`
fn repeat(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [count, body] = tail else {
        return Err(malformed_form("repeat", &Value::list(tail.to_vec())));
    };
    let count = interp.evaluate(count)?;
    let times = count
        .as_int()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| unsupported_operand("repeat", &count))?;
    for _ in 0..times {
        let value = interp.evaluate(body)?;
        interp.discard(value);
    }
    Ok(Value::Void)
}

/// `(eval expr)`: the value of `expr` is itself evaluated.
fn eval(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    expect_arity("eval", tail, 1)?;
    let code = interp.evaluate(&tail[0])?;
    interp.evaluate(&code)
}

/// `(global name)` reads, `(global name value)` writes.
fn global(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    match tail {
        [name] => {
            let name = symbol_operand("global", name)?;
            interp
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| undefined_global(name.as_str()))
        }
        [name, value] => {
            let name = symbol_operand("global", name)?.clone();
            let value = interp.evaluate(value)?;
            if let Some(old) = interp.globals.insert(name, value) {
                interp.closures.release(old);
            }
            Ok(Value::Void)
        }
        _ => Err(malformed_form("global", &Value::list(tail.to_vec()))),
    }
}

/// `(import module)` or `(import module as alias)`
fn import(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let (module, alias) = match tail {
        [module] => {
            let module = symbol_operand("import", module)?;
            (module, module)
        }
        [module, Value::Symbol(kw), alias] if kw == "as" => (
            symbol_operand("import", module)?,
            symbol_operand("import", alias)?,
        ),
        _ => return Err(malformed_form("import", &Value::list(tail.to_vec()))),
    };
    interp.foreign.import(module.as_str(), alias.clone())?;
    Ok(Value::Void)
}

/// A path operand, with surrounding double quotes removed.
fn path_operand(keyword: &str, tail: &[Value]) -> Result<String, EvalError> {
    expect_arity(keyword, tail, 1)?;
    let path = symbol_operand(keyword, &tail[0])?;
    Ok(path.as_str().trim_matches('"').to_string())
}

/// `(load "file.op")`
fn load(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let path = path_operand("load", tail)?;
    if !path.ends_with(SOURCE_EXTENSION) {
        return Err(io_error(format!(
            "file '{path}' must have extension '{SOURCE_EXTENSION}'"
        )));
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|err| io_error(format!("could not load '{path}': {err}")))?;
    tracing::debug!(%path, "loading source file");
    interp.run_script(&text)
}

/// `(getfile path)`: the file's lines as a list.
fn getfile(_: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let path = path_operand("getfile", tail)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|err| io_error(format!("could not read '{path}': {err}")))?;
    Ok(Value::list(text.lines().map(Value::symbol).collect()))
}

/// `(setref name index value)`
fn setref(interp: &mut Interpreter, tail: &[Value]) -> EvalResult {
    let [name, index, value] = tail else {
        return Err(malformed_form("setref", &Value::list(tail.to_vec())));
    };
    let name = symbol_operand("setref", name)?.clone();
    let index = interp.evaluate(index)?;
    let Value::Int(index) = index else {
        return Err(unsupported_operand("setref", &index));
    };
    let value = interp.evaluate(value)?;
    let current = interp.lookup(name.as_str())?;
    let Value::List(items) = &current else {
        return Err(unsupported_operand("setref", &current));
    };
    let updated = replace_at(items, index, value)?;
    let scope = interp.env.find_scope(name.as_str());
    interp.assign(&Binder::latent(name), updated, scope)?;
    Ok(Value::Void)
}

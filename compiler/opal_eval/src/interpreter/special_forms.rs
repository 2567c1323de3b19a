//! Forms with evaluation rules of their own, and the `c[ad]+r` accessors.

use std::rc::Rc;

use opal_ir::Symbol;

use super::Interpreter;
use crate::closures::{Frozen, FunctionKind, Lazy};
use crate::environment::Binder;
use crate::errors::{malformed_accessor, malformed_form, malformed_quote, unsupported_operand};
use crate::keywords::SpecialForm;
use crate::{EvalResult, Value};

/// Name given to anonymous functions before their source is attached.
const LAMBDA: &str = "lambda";

fn form(form: SpecialForm, tail: &[Value]) -> Value {
    let mut items = vec![Value::symbol(form.name())];
    items.extend(tail.iter().cloned());
    Value::list(items)
}

impl Interpreter {
    pub(crate) fn eval_special(&mut self, special: SpecialForm, tail: &[Value]) -> EvalResult {
        match (special, tail) {
            (SpecialForm::Set, [spec, expr]) => self.eval_set(spec, expr),
            (SpecialForm::Lazy, [operator]) => Ok(Value::Lazy(Rc::new(Lazy::new(operator.clone())))),
            (SpecialForm::Freeze, [expr]) => Ok(Value::Frozen(Rc::new(Frozen::new(expr.clone())))),
            (SpecialForm::New, [template, args @ ..]) => {
                let template = self.evaluate(template)?;
                match &template {
                    Value::Template(template) => self.instantiate(template, args),
                    other => Err(unsupported_operand("new", other)),
                }
            }
            (SpecialForm::Until, [Value::List(header), body]) => match &header[..] {
                [test, step] => self.eval_until(test, step, body),
                _ => Err(malformed_form("until", &form(special, tail))),
            },
            (SpecialForm::Lambda, [params, body]) => {
                self.make_function(Symbol::new(LAMBDA), FunctionKind::Lambda, params, body.clone())
            }
            (SpecialForm::Cond, clauses) => self.eval_cond(clauses),
            (SpecialForm::Quote, [operand]) => Ok(operand.clone()),
            (SpecialForm::Quote, _) => Err(malformed_quote(&form(special, tail))),
            _ => Err(malformed_form(special.name(), &form(special, tail))),
        }
    }

    /// `(set name value)`: re-uses the scope of an existing binding.
    fn eval_set(&mut self, spec: &Value, expr: &Value) -> EvalResult {
        let binder = Binder::from_value(spec)?;
        let value = self.evaluate(expr)?;
        let scope = self.env.find_scope(binder.name.as_str());
        self.assign(&binder, value, scope)?;
        Ok(Value::Void)
    }

    /// `(until (test step) body)`: loop in a fresh scope until `test` holds.
    fn eval_until(&mut self, test: &Value, step: &Value, body: &Value) -> EvalResult {
        self.with_env_scope(|scoped| {
            loop {
                let done = scoped.evaluate(test)?;
                if done.is_truthy() {
                    break;
                }
                scoped.discard(done);
                let value = scoped.evaluate(body)?;
                scoped.discard(value);
                let value = scoped.evaluate(step)?;
                scoped.discard(value);
            }
            Ok(Value::Void)
        })
    }

    /// `(cond (guard body) ... (else body))`
    fn eval_cond(&mut self, clauses: &[Value]) -> EvalResult {
        for clause in clauses {
            let [guard, body] = clause.as_list().unwrap_or_default() else {
                return Err(malformed_form("cond", clause));
            };
            let taken = guard.as_symbol().is_some_and(|s| s == "else") || {
                let value = self.evaluate(guard)?;
                let truthy = value.is_truthy();
                self.discard(value);
                truthy
            };
            if taken {
                return self.evaluate(body);
            }
        }
        Ok(Value::Void)
    }

    /// `(cadr x)` and friends: letters apply right to left.
    pub(crate) fn apply_accessor(&mut self, name: &str, tail: &[Value]) -> EvalResult {
        let [operand] = tail else {
            return Err(malformed_accessor(name));
        };
        let ops = name
            .strip_prefix('c')
            .and_then(|rest| rest.strip_suffix('r'))
            .ok_or_else(|| malformed_accessor(name))?;
        let mut value = self.evaluate(operand)?;
        for op in ops.chars().rev() {
            value = match (op, &value) {
                ('a', Value::List(items)) if !items.is_empty() => items[0].clone(),
                ('d', Value::List(items)) => Value::List(items.iter().skip(1).cloned().collect()),
                ('a', other) => return Err(unsupported_operand("car", other)),
                (_, other) => return Err(unsupported_operand("cdr", other)),
            };
        }
        Ok(value)
    }
}

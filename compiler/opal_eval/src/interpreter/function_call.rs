//! Applying closables: function calls, template instantiation, instance
//! member access, lazy operators, and forcing frozen expressions.

use std::rc::Rc;

use opal_ir::Symbol;
use rustc_hash::FxHashMap;

use super::Interpreter;
use crate::closures::{
    read_params, ClosureId, Frozen, Function, FunctionKind, Instance, Lazy, Template,
    TemplateBody, SELF_NAME,
};
use crate::environment::{Environment, LocalScope, Scope, Variable};
use crate::errors::{
    arity_mismatch, malformed_form, missing_closure, not_callable, undefined_member,
};
use crate::{EvalError, EvalResult, Value};

impl Interpreter {
    /// Call arguments: evaluated, unless every one is already frozen.
    fn call_arguments(&mut self, raw: &[Value]) -> Result<Vec<Value>, EvalError> {
        if !raw.is_empty() && raw.iter().all(Value::is_frozen) {
            Ok(raw.to_vec())
        } else {
            self.eval_args(raw)
        }
    }

    pub(crate) fn call_function(&mut self, func: &Rc<Function>, raw: &[Value]) -> EvalResult {
        let args = self.call_arguments(raw)?;
        self.apply_function(func, args)
    }

    /// Apply `func` to already-prepared arguments.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %func.name()))]
    pub(crate) fn apply_function(&mut self, func: &Rc<Function>, args: Vec<Value>) -> EvalResult {
        if args.len() != func.arity() {
            let err = arity_mismatch(func.name().as_str(), func.arity(), args.len());
            for arg in args {
                self.discard(arg);
            }
            return Err(err);
        }
        let watermark = self.closures.watermark();
        let debug = self.config.flags.debug;
        let mut call = self.enter_call(func)?;
        match call.run_body(func, args, watermark) {
            Err(err) if debug => Err(call.call_stack.attach_backtrace(err)),
            result => result,
        }
    }

    fn run_body(&mut self, func: &Rc<Function>, args: Vec<Value>, watermark: ClosureId) -> EvalResult {
        for (binder, value) in func.params().iter().zip(args) {
            self.bind_local(binder, value)?;
        }
        if func.kind().binds_self() {
            self.define(Symbol::new(SELF_NAME), Value::Function(Rc::clone(func)))?;
        }
        let value = self.evaluate(func.body())?;
        if let Value::Function(returned) = &value {
            if returned.id() >= watermark {
                self.reparent(returned, func.id());
            }
        }
        Ok(value)
    }

    /// Give a function escaping from a call a copy of the caller's closure,
    /// its own frames innermost.
    fn reparent(&mut self, returned: &Rc<Function>, caller: ClosureId) {
        let Some(mut env) = self.closures.get(caller).map(Environment::deep_clone) else {
            return;
        };
        let Some(own) = self.closures.get(returned.id()).cloned() else {
            return;
        };
        env.extend(&own);
        drop(own);
        // A function bound inside its own closure would never be released.
        for frame in env.frames() {
            let mut scope = frame.borrow_mut();
            let cyclic: Vec<Symbol> = scope
                .names()
                .filter(|name| {
                    matches!(
                        scope.get(name.as_str()).map(Variable::value),
                        Some(Value::Function(f)) if Rc::ptr_eq(f, returned)
                    )
                })
                .cloned()
                .collect();
            for name in cyclic {
                scope.remove(name.as_str());
            }
        }
        tracing::trace!(function = %returned.name(), "closure re-parented");
        self.closures.replace(returned.id(), env);
    }

    /// `(new T args...)`, or a template in head position.
    pub(crate) fn instantiate(&mut self, template: &Rc<Template>, raw: &[Value]) -> EvalResult {
        let args = self.eval_args(raw)?;
        let params = template.params();
        if args.len() != params.len() {
            return Err(arity_mismatch(template.name().as_str(), params.len(), args.len()));
        }
        let defining = self
            .closures
            .get(template.id())
            .map(Environment::deep_clone)
            .ok_or_else(|| missing_closure(template.name().as_str()))?;
        let mut bound = Scope::new();
        for (binder, value) in params.iter().zip(args) {
            bound.insert(binder.name.clone(), Variable::from_binder(binder, value)?);
        }
        let mut frames = defining.into_frames();
        frames.push(LocalScope::new(bound));
        let instance = Instance::new(
            &mut self.closures,
            Rc::clone(template),
            Environment::from_frames(frames),
        );
        tracing::debug!(template = %template.name(), id = %instance.id(), "instance created");
        if let Some(init) = template.init() {
            if let Err(err) = self.run_init(&instance, init) {
                self.closures.release(Value::Instance(instance));
                return Err(err);
            }
        }
        Ok(Value::Instance(instance))
    }

    fn run_init(&mut self, instance: &Rc<Instance>, init: &[Value]) -> Result<(), EvalError> {
        let mut closed = self.closed(instance.id(), instance.template_name().as_str())?;
        for expr in init {
            closed.evaluate(expr)?;
        }
        Ok(())
    }

    /// `(instance member args...)`
    ///
    /// Methods run with the instance's closure spliced in, so assignments
    /// to its fields persist. A field with no arguments yields its value.
    #[tracing::instrument(level = "debug", skip_all, fields(template = %instance.template_name()))]
    pub(crate) fn invoke_member(&mut self, instance: &Rc<Instance>, tail: &[Value]) -> EvalResult {
        let Some((member, raw_args)) = tail.split_first() else {
            return Ok(Value::Instance(Rc::clone(instance)));
        };
        let Value::Symbol(member) = member else {
            return Err(malformed_form("instance", member));
        };
        let owner = instance.template_name().as_str();
        let value = self
            .closures
            .get(instance.id())
            .and_then(|env| env.get(member.as_str()))
            .ok_or_else(|| undefined_member(owner, member.as_str()))?;
        match value {
            Value::Function(method) => {
                let args = self.call_arguments(raw_args)?;
                let mut closed = self.closed(instance.id(), owner)?;
                closed.apply_function(&method, args)
            }
            Value::Frozen(frozen) if raw_args.is_empty() => self.thaw(&frozen),
            field if raw_args.is_empty() => Ok(field),
            other => Err(not_callable(&other)),
        }
    }

    /// Re-dispatch to the operator with every argument frozen.
    pub(crate) fn apply_lazy(&mut self, lazy: &Lazy, tail: &[Value]) -> EvalResult {
        let mut call = Vec::with_capacity(tail.len() + 1);
        call.push(lazy.operator().clone());
        call.extend(
            tail.iter()
                .map(|arg| Value::Frozen(Rc::new(Frozen::new(arg.clone())))),
        );
        self.evaluate(&Value::list(call))
    }

    /// Force a frozen expression in the current environment.
    pub(crate) fn thaw(&mut self, frozen: &Frozen) -> EvalResult {
        self.evaluate(frozen.expr())
    }

    /// A function closing over copies of the current local frames.
    pub(crate) fn make_function(
        &mut self,
        name: Symbol,
        kind: FunctionKind,
        params: &Value,
        body: Value,
    ) -> EvalResult {
        let closure = Environment::from_frames(self.env.capture_locals());
        let func = Function::new(&mut self.closures, name, kind, params, body, closure)?;
        tracing::trace!(function = %func.name(), id = %func.id(), "function created");
        Ok(Value::Function(func))
    }

    /// Build a template from its declarations. Variable initializers are
    /// evaluated now, in the defining environment.
    pub(crate) fn make_template(&mut self, name: Symbol, params: &Value, decls: &[Value]) -> EvalResult {
        let body = TemplateBody::scan(decls)?;
        read_params("template", params)?;
        for (_, method_params, _) in &body.methods {
            read_params(FunctionKind::Method.as_str(), method_params)?;
        }

        let mut frame = Scope::new();
        let mut variables = FxHashMap::default();
        for (var, init) in &body.variables {
            let value = self.evaluate(init)?;
            variables.insert(var.clone(), value.clone());
            frame.insert(var.clone(), Variable::latent(value));
        }
        let mut methods = FxHashMap::default();
        for (method, method_params, method_body) in body.methods {
            let func = Function::new(
                &mut self.closures,
                method.clone(),
                FunctionKind::Method,
                &method_params,
                method_body,
                Environment::new(),
            )?;
            frame.insert(method.clone(), Variable::latent(Value::Function(Rc::clone(&func))));
            methods.insert(method, func);
        }

        let closure = Environment::from_frames(vec![LocalScope::new(frame)]);
        let template = Template::new(
            &mut self.closures,
            name,
            params,
            methods,
            variables,
            body.init,
            closure,
        )?;
        tracing::debug!(template = %template.name(), id = %template.id(), "template defined");
        Ok(Value::Template(template))
    }
}

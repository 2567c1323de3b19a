//! Numeric operators and comparisons.
//!
//! Integers stay integers unless a float is involved or the operator is
//! `/`. Integer overflow is an error rather than a wrap. `//` and `%`
//! round toward negative infinity, so `(% -7 2)` is `1`.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{expect_arity, Keyword, KeywordTable};
use crate::errors::{division_by_zero, integer_overflow, unsupported_operand};
use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult, Value};

pub(super) fn register(table: &mut KeywordTable) {
    table.insert("+", Keyword::Eager(add));
    table.insert("-", Keyword::Eager(subtract));
    table.insert("*", Keyword::Eager(multiply));
    table.insert("/", Keyword::Eager(true_divide));
    table.insert("//", Keyword::Eager(floor_divide));
    table.insert("%", Keyword::Eager(modulo));
    table.insert("**", Keyword::Eager(power));
    table.insert("++", Keyword::Eager(increment));
    table.insert("==", Keyword::Eager(equal));
    table.insert("eq", Keyword::Eager(equal));
    table.insert("!=", Keyword::Eager(not_equal));
    table.insert("<", Keyword::Eager(less));
    table.insert(">", Keyword::Eager(greater));
    table.insert("<=", Keyword::Eager(less_equal));
    table.insert(">=", Keyword::Eager(greater_equal));
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

#[expect(clippy::cast_precision_loss, reason = "int to float promotion is the language's rule")]
fn to_f64(n: i64) -> f64 {
    n as f64
}

impl Num {
    fn of(op: &str, value: &Value) -> Result<Num, EvalError> {
        match value {
            Value::Int(n) => Ok(Num::Int(*n)),
            Value::Float(x) => Ok(Num::Float(*x)),
            other => Err(unsupported_operand(op, other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => to_f64(n),
            Num::Float(x) => x,
        }
    }
}

fn operands<'a>(op: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), EvalError> {
    expect_arity(op, args, 2)?;
    Ok((&args[0], &args[1]))
}

fn numbers(op: &str, args: &[Value]) -> Result<(Num, Num), EvalError> {
    let (a, b) = operands(op, args)?;
    Ok((Num::of(op, a)?, Num::of(op, b)?))
}

/// Apply an integer op when both sides are ints, the float op otherwise.
fn numeric(
    op: &str,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    match numbers(op, args)? {
        (Num::Int(a), Num::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow(op)),
        (a, b) => Ok(Value::Float(float_op(a.as_f64(), b.as_f64()))),
    }
}

fn add(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (a, b) = operands("+", args)?;
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            Ok(Value::List(x.iter().chain(y.iter()).cloned().collect::<Rc<[Value]>>()))
        }
        (Value::Symbol(x), Value::Symbol(y)) => {
            Ok(Value::symbol(&format!("{}{}", x.as_str(), y.as_str())))
        }
        _ => numeric("+", args, i64::checked_add, |x, y| x + y),
    }
}

fn subtract(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    numeric("-", args, i64::checked_sub, |x, y| x - y)
}

fn multiply(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    numeric("*", args, i64::checked_mul, |x, y| x * y)
}

fn true_divide(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (a, b) = numbers("/", args)?;
    let divisor = b.as_f64();
    if divisor == 0.0 {
        return Err(division_by_zero());
    }
    Ok(Value::Float(a.as_f64() / divisor))
}

fn floor_div_int(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn floor_mod_float(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r + b
    } else {
        r
    }
}

fn is_zero(n: Num) -> bool {
    match n {
        Num::Int(n) => n == 0,
        Num::Float(x) => x == 0.0,
    }
}

fn floor_divide(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (_, b) = numbers("//", args)?;
    if is_zero(b) {
        return Err(division_by_zero());
    }
    numeric("//", args, floor_div_int, |x, y| (x / y).floor())
}

fn modulo(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (_, b) = numbers("%", args)?;
    if is_zero(b) {
        return Err(division_by_zero());
    }
    numeric("%", args, floor_mod_int, floor_mod_float)
}

fn power(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    match numbers("**", args)? {
        (Num::Int(base), Num::Int(exp)) if exp >= 0 => u32::try_from(exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("**")),
        (base, exp) => {
            if is_zero(base) && exp.as_f64() < 0.0 {
                return Err(division_by_zero());
            }
            Ok(Value::Float(base.as_f64().powf(exp.as_f64())))
        }
    }
}

fn increment(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    expect_arity("++", args, 1)?;
    match Num::of("++", &args[0])? {
        Num::Int(n) => n
            .checked_add(1)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("++")),
        Num::Float(x) => Ok(Value::Float(x + 1.0)),
    }
}

/// Equality as the language sees it: `1` equals `1.0`, lists compare element-wise.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => to_f64(*x) == *y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        _ => a == b,
    }
}

fn equal(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (a, b) = operands("==", args)?;
    Ok(Value::Bool(values_equal(a, b)))
}

fn not_equal(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    let (a, b) = operands("!=", args)?;
    Ok(Value::Bool(!values_equal(a, b)))
}

/// Ordering between two numbers or two symbols.
pub(crate) fn compare(op: &str, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Symbol(x), Value::Symbol(y)) => Ok(x.cmp(y)),
        _ => {
            let x = Num::of(op, a)?.as_f64();
            let y = Num::of(op, b)?.as_f64();
            Ok(x.total_cmp(&y))
        }
    }
}

fn ordered(op: &str, args: &[Value], accept: fn(Ordering) -> bool) -> EvalResult {
    let (a, b) = operands(op, args)?;
    Ok(Value::Bool(accept(compare(op, a, b)?)))
}

fn less(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    ordered("<", args, Ordering::is_lt)
}

fn greater(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    ordered(">", args, Ordering::is_gt)
}

fn less_equal(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    ordered("<=", args, Ordering::is_le)
}

fn greater_equal(_: &mut Interpreter, args: &[Value]) -> EvalResult {
    ordered(">=", args, Ordering::is_ge)
}

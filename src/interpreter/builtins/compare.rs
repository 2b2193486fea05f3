//! Comparison and logical built-in functions.

use std::cmp::Ordering;

use crate::value::Value;
use super::super::error::InterpreterError;
use super::require_args;

/// Numbers compare numerically, strings lexicographically by byte.
fn compare(args: &[Value], name: &str) -> Result<Option<Ordering>, InterpreterError> {
    let (left, right) = (&args[0], &args[1]);
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(a.partial_cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.as_string(), right.as_string()) {
        return Ok(Some(a.cmp(b)));
    }
    Err(InterpreterError::type_mismatch(
        name,
        format!("cannot compare a {} with a {}", left.type_name(), right.type_name()),
    ))
}

macro_rules! ordering_builtin {
    ($name:ident, $symbol:expr, $test:expr) => {
        pub fn $name(args: &[Value]) -> Result<Value, InterpreterError> {
            require_args!(args, 2, $symbol);
            let ordering = compare(args, $symbol)?;
            Ok(Value::bool(ordering.map_or(false, $test)))
        }
    };
}

ordering_builtin!(builtin_lt, "<", |o: Ordering| o == Ordering::Less);
ordering_builtin!(builtin_gt, ">", |o: Ordering| o == Ordering::Greater);
ordering_builtin!(builtin_le, "<=", |o: Ordering| o != Ordering::Greater);
ordering_builtin!(builtin_ge, ">=", |o: Ordering| o != Ordering::Less);

pub fn builtin_eq(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 2, "==");
    Ok(Value::bool(args[0] == args[1]))
}

pub fn builtin_ne(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 2, "!=");
    Ok(Value::bool(args[0] != args[1]))
}

pub fn builtin_not(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 1, "not");
    Ok(Value::bool(!args[0].is_truthy()))
}

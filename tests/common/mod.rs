#![allow(dead_code)]

use a9::interpreter::{run, run_with_limits, EvalLimits};
use a9::{Error, InterpreterError, Value};

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn string(s: &str) -> Value {
    Value::string(s)
}

/// Evaluate `invocation` against `source`, panicking on any error.
pub fn eval(source: &str, invocation: &str) -> Value {
    match run(source, invocation) {
        Ok(value) => value,
        Err(err) => panic!("`{}` failed: {}", invocation, err),
    }
}

pub fn eval_err(source: &str, invocation: &str) -> Error {
    match run(source, invocation) {
        Ok(value) => panic!("`{}` should fail, produced {}", invocation, value),
        Err(err) => err,
    }
}

/// The evaluation error, panicking if lexing or parsing failed instead.
pub fn runtime_err(source: &str, invocation: &str) -> InterpreterError {
    match eval_err(source, invocation) {
        Error::Eval(err) => err,
        other => panic!("expected an evaluation error, got {:?}", other),
    }
}

/// Small limits for tests that recurse without bound.
pub fn tight_limits() -> EvalLimits {
    EvalLimits {
        max_depth: 48,
        max_steps: Some(100_000),
        ..EvalLimits::default()
    }
}

pub fn eval_limited(source: &str, invocation: &str, limits: EvalLimits) -> Result<Value, Error> {
    run_with_limits(source, invocation, limits)
}

pub const PRELUDE_DEMO: &str = r#"
# arithmetic helpers
{def {double x} = {+ x x}}
{def {square x} = {* x x}}
{def {id x} = x}
{def {compose f g} = {{x} => {f {g x}}}}
{def {twice f} = {compose f f}}
{def {fact n} = {1 if {< n 2} else {* n {fact {- n 1}}}}}
{def {fib n} = {n if {< n 2} else {+ {fib {- n 1}} {fib {- n 2}}}}}
"#;

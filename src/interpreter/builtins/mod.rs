//! The prelude: native functions bound in program scope.
//!
//! Functions are organized into categories:
//! - **Math**: arithmetic on numbers (`+ - * / %`)
//! - **Compare**: ordering, equality and negation (`< > <= >= == != not`)
//! - **String**: concatenation (`++`)
//!
//! Every builtin has a fixed arity. Comparisons produce `1` or `0`.
//! User definitions with the same name shadow these.

mod compare;
mod math;
mod string;

pub use compare::*;
pub use math::*;
pub use string::*;

use std::fmt;

use crate::value::Value;
use super::error::InterpreterError;

pub type NativeFn = fn(&[Value]) -> Result<Value, InterpreterError>;

pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl Builtin {
    pub fn call(&self, args: &[Value]) -> Result<Value, InterpreterError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

macro_rules! builtin {
    ($name:expr, $arity:expr, $func:path) => {
        Builtin { name: $name, arity: $arity, func: $func }
    };
}

pub static BUILTINS: [Builtin; 13] = [
    builtin!("+", 2, builtin_add),
    builtin!("-", 2, builtin_sub),
    builtin!("*", 2, builtin_mul),
    builtin!("/", 2, builtin_div),
    builtin!("%", 2, builtin_rem),
    builtin!("<", 2, builtin_lt),
    builtin!(">", 2, builtin_gt),
    builtin!("<=", 2, builtin_le),
    builtin!(">=", 2, builtin_ge),
    builtin!("==", 2, builtin_eq),
    builtin!("!=", 2, builtin_ne),
    builtin!("++", 2, builtin_concat),
    builtin!("not", 1, builtin_not),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

macro_rules! require_args {
    ($args:expr, $n:expr, $name:expr) => {
        if $args.len() != $n {
            return Err(InterpreterError::arity_mismatch_at(
                $name,
                $n,
                $args.len(),
                crate::diagnostic::Span::dummy(),
            ));
        }
    };
}

macro_rules! with_numbers {
    ($args:expr, $name:expr, $body:expr) => {
        match ($args[0].as_number(), $args[1].as_number()) {
            (Some(left), Some(right)) => $body(left, right),
            (Some(_), None) => Err(InterpreterError::type_mismatch(
                $name,
                format!("expected two numbers, found a {}", $args[1].type_name()),
            )),
            (None, _) => Err(InterpreterError::type_mismatch(
                $name,
                format!("expected two numbers, found a {}", $args[0].type_name()),
            )),
        }
    };
}

pub(crate) use require_args;
pub(crate) use with_numbers;

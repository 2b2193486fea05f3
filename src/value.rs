use std::fmt;
use std::rc::Rc;

use crate::ast::Expr;
use crate::format::format_number;
use crate::interpreter::builtins::Builtin;
use crate::interpreter::Environment;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Closure(Rc<Closure>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(left_num), Value::Number(right_num)) => left_num == right_num,
            (Value::String(left_str), Value::String(right_str)) => left_str == right_str,
            (Value::Closure(left_fn), Value::Closure(right_fn)) => Rc::ptr_eq(left_fn, right_fn),
            _ => false,
        }
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn bool(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(numeric_value) = self {
            Some(*numeric_value)
        } else {
            None
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(string_ref) = self {
            Some(string_ref.as_ref())
        } else {
            None
        }
    }

    /// Only the number zero is false. NaN counts as non-zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(_) | Value::Closure(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Closure(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Closure(closure) => write!(f, "{}", closure),
        }
    }
}

/// A callable value: either a user lambda or a prelude builtin.
#[derive(Debug)]
pub enum Closure {
    Lambda(Lambda),
    Native(&'static Builtin),
}

impl Closure {
    pub fn arity(&self) -> usize {
        match self {
            Closure::Lambda(lambda) => lambda.params.len(),
            Closure::Native(builtin) => builtin.arity,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Closure::Lambda(lambda) => lambda.name.as_deref(),
            Closure::Native(builtin) => Some(builtin.name),
        }
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Lambda(Lambda { name: Some(name), .. }) => write!(f, "<function {}>", name),
            Closure::Lambda(_) => write!(f, "<function>"),
            Closure::Native(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}

pub struct Lambda {
    /// Set for closures created from a definition with parameters.
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: Rc<Expr>,
    pub env: Environment,
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

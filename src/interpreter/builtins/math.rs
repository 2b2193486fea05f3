//! Arithmetic built-in functions.

use crate::value::Value;
use super::super::error::InterpreterError;
use super::{require_args, with_numbers};

macro_rules! binary_math {
    ($name:ident, $op:tt, $symbol:expr) => {
        pub fn $name(args: &[Value]) -> Result<Value, InterpreterError> {
            require_args!(args, 2, $symbol);
            with_numbers!(args, $symbol, |a: f64, b: f64| Ok(Value::Number(a $op b)))
        }
    };
}

binary_math!(builtin_add, +, "+");
binary_math!(builtin_sub, -, "-");
binary_math!(builtin_mul, *, "*");

pub fn builtin_div(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 2, "/");
    with_numbers!(args, "/", |a: f64, b: f64| {
        if b == 0.0 {
            Err(InterpreterError::division_by_zero("/"))
        } else {
            Ok(Value::Number(a / b))
        }
    })
}

/// Remainder with the sign of the dividend.
pub fn builtin_rem(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 2, "%");
    with_numbers!(args, "%", |a: f64, b: f64| {
        if b == 0.0 {
            Err(InterpreterError::division_by_zero("%"))
        } else {
            Ok(Value::Number(a % b))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(a: f64, b: f64) -> [Value; 2] {
        [Value::Number(a), Value::Number(b)]
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(builtin_add(&nums(40.0, 2.0)).unwrap(), Value::Number(42.0));
        assert_eq!(builtin_sub(&nums(1.0, 3.0)).unwrap(), Value::Number(-2.0));
        assert_eq!(builtin_mul(&nums(6.0, 7.0)).unwrap(), Value::Number(42.0));
        assert_eq!(builtin_div(&nums(1.0, 4.0)).unwrap(), Value::Number(0.25));
    }

    #[test]
    fn test_remainder_keeps_dividend_sign() {
        assert_eq!(builtin_rem(&nums(7.0, 3.0)).unwrap(), Value::Number(1.0));
        assert_eq!(builtin_rem(&nums(-7.0, 3.0)).unwrap(), Value::Number(-1.0));
        assert_eq!(builtin_rem(&nums(7.5, 2.0)).unwrap(), Value::Number(1.5));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            builtin_div(&nums(1.0, 0.0)),
            Err(InterpreterError::DivisionByZero { .. })
        ));
        assert!(matches!(
            builtin_rem(&nums(1.0, -0.0)),
            Err(InterpreterError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_strings_are_not_added() {
        let args = [Value::string("1"), Value::Number(1.0)];
        assert!(matches!(builtin_add(&args), Err(InterpreterError::TypeMismatch { .. })));
    }
}

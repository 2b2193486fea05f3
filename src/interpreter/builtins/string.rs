use crate::format::format_number;
use crate::value::Value;
use super::super::error::InterpreterError;
use super::require_args;

fn concat_part(value: &Value, out: &mut String) -> Result<(), InterpreterError> {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::Closure(_) => {
            return Err(InterpreterError::type_mismatch("++", "cannot concatenate a function"));
        }
    }
    Ok(())
}

/// `{++ a b}`: strings and numbers, numbers in their printed form.
pub fn builtin_concat(args: &[Value]) -> Result<Value, InterpreterError> {
    require_args!(args, 2, "++");
    let mut out = String::new();
    concat_part(&args[0], &mut out)?;
    concat_part(&args[1], &mut out)?;
    Ok(Value::string(out))
}

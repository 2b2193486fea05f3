pub mod parser;
pub mod environment;
pub mod error;
pub mod builtins;
pub mod evaluator;

pub use error::{DepthLimit, Error, InterpreterError};
pub use environment::Environment;
pub use parser::{TokenParser, ParseError, ParseResult, MAX_NESTING};
pub use evaluator::{
    parse_invocation, parse_program, run, run_with_diagnostics, run_with_limits, EvalLimits, Interpreter,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_NESTING, DEFAULT_MAX_STEPS, DEFAULT_STACK_SIZE, INVOCATION_SOURCE,
    PROGRAM_SOURCE,
};

//! Lexer, parser and evaluator for A9, a small functional expression language.
//!
//! ```text
//! {def {double x} = {+ x x}}
//! {def {greeting} = {{++ "hello " who} where {[who := "world"]}}}
//! ```

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod format;
pub mod interpreter;
pub mod lexer;
pub mod token;
pub mod value;

pub use ast::{Definition, Expr, ExprKind, Program};
pub use interpreter::{run, Error, EvalLimits, Interpreter, InterpreterError, ParseError};
pub use lexer::LexError;
pub use token::Token;
pub use value::Value;

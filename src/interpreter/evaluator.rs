use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Binding, Definition, Expr, ExprKind, Program};
use crate::diagnostic::{Diagnostic, SourceId, Span};
use crate::lexer::tokenize;
use crate::value::{Closure, Lambda, Value};
use super::builtins::{self, BUILTINS};
use super::environment::Environment;
use super::error::{Error, InterpreterError};
use super::parser::TokenParser;

pub const DEFAULT_MAX_DEPTH: usize = 256;
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

/// Native stack assumed by [`EvalLimits::default`]: what Rust gives a
/// spawned thread, test threads included.
pub const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Native stack one nested evaluation may take, rounded up over debug and
/// release builds.
const STACK_PER_NESTING: usize = 4 * 1024;

pub const DEFAULT_MAX_NESTING: usize = DEFAULT_STACK_SIZE / STACK_PER_NESTING;

/// Source ids used by [`run`] and [`run_with_diagnostics`]: the program is
/// registered first, the invocation second.
pub const PROGRAM_SOURCE: SourceId = SourceId(0);
pub const INVOCATION_SOURCE: SourceId = SourceId(1);

/// Bounds on a single evaluation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Nested function calls (and definition forcings) allowed at once.
    pub max_depth: usize,
    /// Expressions evaluated per request; `None` means unbounded.
    pub max_steps: Option<u64>,
    /// Expressions under evaluation at once, calls or not. Every level costs
    /// native stack, so this must fit the stack the evaluator runs on.
    pub max_nesting: usize,
}

impl EvalLimits {
    /// Default limits with the nesting bound sized for a thread whose stack
    /// is `stack_size` bytes.
    pub fn for_stack(stack_size: usize) -> Self {
        Self {
            max_nesting: (stack_size / STACK_PER_NESTING).max(1),
            ..Self::default()
        }
    }
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: Some(DEFAULT_MAX_STEPS),
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

enum GlobalState {
    /// Definitions with parameters are closures from the start.
    Function(Value),
    Unforced,
    Forcing,
    Forced(Value),
}

struct Global {
    definition: Rc<Definition>,
    state: GlobalState,
}

pub struct Interpreter {
    definitions: IndexMap<Rc<str>, Global>,
    prelude: HashMap<&'static str, Value>,
    root: Environment,
    limits: EvalLimits,
    depth: usize,
    nesting: usize,
    steps: u64,
}

impl Interpreter {
    /// Load a program's definitions into program scope.
    pub fn new(program: Program) -> Result<Self, InterpreterError> {
        Self::with_limits(program, EvalLimits::default())
    }

    pub fn with_limits(program: Program, limits: EvalLimits) -> Result<Self, InterpreterError> {
        let root = Environment::new();
        let mut definitions: IndexMap<Rc<str>, Global> = IndexMap::with_capacity(program.definitions.len());

        for definition in program.definitions {
            if let Some(previous) = definitions.get(&definition.name) {
                return Err(InterpreterError::duplicate_definition_at(
                    definition.name.as_ref(),
                    definition.name_span,
                    previous.definition.name_span,
                ));
            }

            let state = if definition.is_value() {
                GlobalState::Unforced
            } else {
                GlobalState::Function(Value::Closure(Rc::new(Closure::Lambda(Lambda {
                    name: Some(definition.name.clone()),
                    params: definition.params.clone(),
                    body: definition.body.clone(),
                    env: root.clone(),
                }))))
            };
            definitions.insert(
                definition.name.clone(),
                Global {
                    definition: Rc::new(definition),
                    state,
                },
            );
        }

        let prelude = BUILTINS
            .iter()
            .map(|builtin| (builtin.name, Value::Closure(Rc::new(Closure::Native(builtin)))))
            .collect();

        Ok(Self {
            definitions,
            prelude,
            root,
            limits,
            depth: 0,
            nesting: 0,
            steps: 0,
        })
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: EvalLimits) {
        self.limits = limits;
    }

    /// Loaded definitions in source order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> + '_ {
        self.definitions.values().map(|global| global.definition.as_ref())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || builtins::lookup(name).is_some()
    }

    fn reset_counters(&mut self) {
        self.depth = 0;
        self.nesting = 0;
        self.steps = 0;
    }

    /// Evaluate an expression in program scope.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, InterpreterError> {
        self.reset_counters();
        let root = self.root.clone();
        self.eval(expr, &root)
    }

    /// Invoke a definition (or builtin) by name with already evaluated arguments.
    /// A value definition called with no arguments yields its value.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
        self.reset_counters();
        let value = self
            .lookup_global(name, Span::dummy())?
            .ok_or_else(|| InterpreterError::unbound_identifier(name))?;

        let is_value_definition = self
            .definitions
            .get(name)
            .map_or(false, |global| global.definition.is_value());
        if args.is_empty() && is_value_definition {
            return Ok(value);
        }

        let span = self
            .definitions
            .get(name)
            .map_or_else(Span::dummy, |global| global.definition.name_span);
        let closure = match value {
            Value::Closure(closure) => closure,
            other => return Err(InterpreterError::not_callable_at(other.type_name(), span)),
        };
        self.check_arity(&closure, args.len(), span)?;
        self.apply(&closure, args, span)
    }

    fn eval(&mut self, expr: &Expr, env: &Environment) -> Result<Value, InterpreterError> {
        if self.nesting >= self.limits.max_nesting {
            return Err(InterpreterError::nesting_exhausted_at(self.limits.max_nesting, expr.span));
        }
        self.nesting += 1;
        let result = self.eval_expr(expr, env);
        self.nesting -= 1;
        result
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Result<Value, InterpreterError> {
        self.steps += 1;
        if let Some(limit) = self.limits.max_steps {
            if self.steps > limit {
                return Err(InterpreterError::step_limit_exceeded_at(limit, expr.span));
            }
        }

        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::Identifier(name) => self.lookup(name, env, expr.span),
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.eval(then_branch, env)
                } else {
                    self.eval(else_branch, env)
                }
            }
            ExprKind::Where { body, bindings } => self.eval_where(body, bindings, env),
            ExprKind::Lambda { params, body } => Ok(Value::Closure(Rc::new(Closure::Lambda(Lambda {
                name: None,
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            })))),
            ExprKind::Application { callee, args } => {
                let closure = match self.eval(callee, env)? {
                    Value::Closure(closure) => closure,
                    other => return Err(InterpreterError::not_callable_at(other.type_name(), callee.span)),
                };

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(arg, env)?);
                }

                self.check_arity(&closure, arg_values.len(), expr.span)?;
                self.apply(&closure, arg_values, expr.span)
            }
        }
    }

    fn lookup(&mut self, name: &str, env: &Environment, span: Span) -> Result<Value, InterpreterError> {
        if let Some(value) = env.get(name) {
            return Ok(value);
        }
        self.lookup_global(name, span)?
            .ok_or_else(|| InterpreterError::unbound_identifier_at(name, span))
    }

    /// Program definitions first, then the prelude. Value definitions are
    /// forced on first use and the result kept.
    #[inline(never)]
    fn lookup_global(&mut self, name: &str, span: Span) -> Result<Option<Value>, InterpreterError> {
        let Some(index) = self.definitions.get_index_of(name) else {
            return Ok(self.prelude.get(name).cloned());
        };

        let body = match &self.definitions[index].state {
            GlobalState::Function(value) | GlobalState::Forced(value) => return Ok(Some(value.clone())),
            GlobalState::Forcing => return Err(InterpreterError::cyclic_definition_at(name, span)),
            GlobalState::Unforced => self.definitions[index].definition.body.clone(),
        };

        self.enter(span)?;
        self.definitions[index].state = GlobalState::Forcing;
        let root = self.root.clone();
        let result = self.eval(&body, &root);
        self.depth -= 1;

        self.definitions[index].state = match &result {
            Ok(value) => GlobalState::Forced(value.clone()),
            Err(_) => GlobalState::Unforced,
        };
        result.map(Some)
    }

    #[inline(never)]
    fn eval_where(&mut self, body: &Expr, bindings: &[Binding], env: &Environment) -> Result<Value, InterpreterError> {
        let mut bound: Vec<(Rc<str>, Value)> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let scope = if bound.is_empty() {
                env.clone()
            } else {
                env.extend(bound.iter().cloned())
            };
            let value = self.eval(&binding.value, &scope)?;
            bound.push((binding.name.clone(), value));
        }
        let scope = env.extend(bound);
        self.eval(body, &scope)
    }

    fn check_arity(&self, closure: &Closure, found: usize, span: Span) -> Result<(), InterpreterError> {
        let expected = closure.arity();
        if expected == found {
            return Ok(());
        }
        let callee = closure
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| closure.to_string());
        Err(InterpreterError::arity_mismatch_at(callee, expected, found, span))
    }

    fn enter(&mut self, span: Span) -> Result<(), InterpreterError> {
        if self.depth >= self.limits.max_depth {
            return Err(InterpreterError::stack_exhausted_at(self.limits.max_depth, span));
        }
        self.depth += 1;
        Ok(())
    }

    #[inline(never)]
    fn apply(&mut self, closure: &Closure, args: Vec<Value>, span: Span) -> Result<Value, InterpreterError> {
        match closure {
            Closure::Native(builtin) => builtin.call(&args).map_err(|err| err.with_span_if_missing(span)),
            Closure::Lambda(lambda) => {
                self.enter(span)?;
                let scope = lambda.env.extend(lambda.params.iter().cloned().zip(args));
                let result = self.eval(&lambda.body, &scope);
                self.depth -= 1;
                result
            }
        }
    }
}

/// Lex and parse a whole program.
pub fn parse_program(source: &str, source_id: SourceId) -> Result<Program, Error> {
    let tokens = tokenize(source, source_id)?;
    Ok(TokenParser::new(tokens).parse_program()?)
}

/// Lex and parse a single expression, such as a command-line invocation.
pub fn parse_invocation(source: &str, source_id: SourceId) -> Result<Expr, Error> {
    let tokens = tokenize(source, source_id)?;
    Ok(TokenParser::new(tokens).parse_invocation()?)
}

/// Load `source` and evaluate `invocation` against it.
pub fn run(source: &str, invocation: &str) -> Result<Value, Error> {
    run_with_limits(source, invocation, EvalLimits::default())
}

pub fn run_with_limits(source: &str, invocation: &str, limits: EvalLimits) -> Result<Value, Error> {
    let program = parse_program(source, PROGRAM_SOURCE)?;
    let entry = parse_invocation(invocation, INVOCATION_SOURCE)?;
    let mut interpreter = Interpreter::with_limits(program, limits)?;
    Ok(interpreter.evaluate(&entry)?)
}

/// Like [`run`], but failures come back as diagnostics whose spans refer to
/// [`PROGRAM_SOURCE`] and [`INVOCATION_SOURCE`].
pub fn run_with_diagnostics(source: &str, invocation: &str) -> Result<Value, Vec<Diagnostic>> {
    run(source, invocation).map_err(|err| err.to_diagnostics())
}

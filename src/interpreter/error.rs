use std::fmt;

use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer::LexError;

use super::parser::ParseError;

/// Which recursion bound a [`InterpreterError::StackExhausted`] ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLimit {
    /// Nested function calls.
    Calls,
    /// Nested expression evaluations, bounded by the native stack.
    Nesting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterError {
    UnboundIdentifier { name: String, span: Span },
    NotCallable { type_name: &'static str, span: Span },
    ArityMismatch { callee: String, expected: usize, found: usize, span: Span },
    StackExhausted { limit: usize, kind: DepthLimit, span: Span },
    StepLimitExceeded { limit: u64, span: Span },
    TypeMismatch { operation: String, message: String, span: Span },
    DivisionByZero { operation: String, span: Span },
    CyclicDefinition { name: String, span: Span },
    DuplicateDefinition { name: String, span: Span, previous: Span },
}

impl InterpreterError {
    // Builtins have no view of the call site; the evaluator fills the span in.
    pub fn type_mismatch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch { operation: operation.into(), message: message.into(), span: Span::dummy() }
    }

    pub fn division_by_zero(operation: impl Into<String>) -> Self {
        Self::DivisionByZero { operation: operation.into(), span: Span::dummy() }
    }

    pub fn unbound_identifier(name: impl Into<String>) -> Self {
        Self::UnboundIdentifier { name: name.into(), span: Span::dummy() }
    }

    pub fn unbound_identifier_at(name: impl Into<String>, span: Span) -> Self {
        Self::UnboundIdentifier { name: name.into(), span }
    }

    pub fn not_callable_at(type_name: &'static str, span: Span) -> Self {
        Self::NotCallable { type_name, span }
    }

    pub fn arity_mismatch_at(callee: impl Into<String>, expected: usize, found: usize, span: Span) -> Self {
        Self::ArityMismatch { callee: callee.into(), expected, found, span }
    }

    pub fn stack_exhausted_at(limit: usize, span: Span) -> Self {
        Self::StackExhausted { limit, kind: DepthLimit::Calls, span }
    }

    pub fn nesting_exhausted_at(limit: usize, span: Span) -> Self {
        Self::StackExhausted { limit, kind: DepthLimit::Nesting, span }
    }

    pub fn step_limit_exceeded_at(limit: u64, span: Span) -> Self {
        Self::StepLimitExceeded { limit, span }
    }

    pub fn cyclic_definition_at(name: impl Into<String>, span: Span) -> Self {
        Self::CyclicDefinition { name: name.into(), span }
    }

    pub fn duplicate_definition_at(name: impl Into<String>, span: Span, previous: Span) -> Self {
        Self::DuplicateDefinition { name: name.into(), span, previous }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnboundIdentifier { span, .. }
            | Self::NotCallable { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::StackExhausted { span, .. }
            | Self::StepLimitExceeded { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::DivisionByZero { span, .. }
            | Self::CyclicDefinition { span, .. }
            | Self::DuplicateDefinition { span, .. } => *span,
        }
    }

    fn span_mut(&mut self) -> &mut Span {
        match self {
            Self::UnboundIdentifier { span, .. }
            | Self::NotCallable { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::StackExhausted { span, .. }
            | Self::StepLimitExceeded { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::DivisionByZero { span, .. }
            | Self::CyclicDefinition { span, .. }
            | Self::DuplicateDefinition { span, .. } => span,
        }
    }

    /// Attach `span` unless the error already points somewhere.
    pub fn with_span_if_missing(mut self, span: Span) -> Self {
        let current = self.span_mut();
        if current.is_dummy() {
            *current = span;
        }
        self
    }

    /// Convert to a diagnostic for pretty printing
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UnboundIdentifier { name, span } => Diagnostic::error(format!("unbound identifier `{}`", name))
                .with_code("E0201")
                .with_label(Label::primary(*span, "not found in this scope")),
            Self::NotCallable { type_name, span } => Diagnostic::error(format!("cannot call a {}", type_name))
                .with_code("E0202")
                .with_label(Label::primary(*span, format!("this is a {}, not a function", type_name))),
            Self::ArityMismatch { callee, expected, found, span } => Diagnostic::error(format!(
                "`{}` takes {} argument{} but {} {} supplied",
                callee,
                expected,
                plural(*expected),
                found,
                if *found == 1 { "was" } else { "were" }
            ))
            .with_code("E0203")
            .with_label(Label::primary(*span, format!("expected {} argument{}", expected, plural(*expected)))),
            Self::StackExhausted { limit, kind: DepthLimit::Calls, span } => {
                Diagnostic::error("call depth limit exceeded")
                    .with_code("E0204")
                    .with_label(Label::primary(*span, "while evaluating this call"))
                    .with_note(format!("the limit is {} nested calls", limit))
                    .with_help("raise it with `--max-depth`")
            }
            Self::StackExhausted { limit, kind: DepthLimit::Nesting, span } => {
                Diagnostic::error("evaluation nested too deeply")
                    .with_code("E0204")
                    .with_label(Label::primary(*span, "while evaluating this expression"))
                    .with_note(format!("the limit is {} nested expressions", limit))
            }
            Self::StepLimitExceeded { limit, span } => Diagnostic::error("evaluation step limit exceeded")
                .with_code("E0205")
                .with_label(Label::primary(*span, "while evaluating this expression"))
                .with_note(format!("the limit is {} steps", limit))
                .with_help("raise it with `--max-steps`, or pass 0 to disable it"),
            Self::TypeMismatch { operation, message, span } => Diagnostic::error(format!("type mismatch in `{}`", operation))
                .with_code("E0206")
                .with_label(Label::primary(*span, message.clone())),
            Self::DivisionByZero { operation, span } => Diagnostic::error("division by zero")
                .with_code("E0207")
                .with_label(Label::primary(*span, format!("`{}` with a zero divisor", operation))),
            Self::CyclicDefinition { name, span } => Diagnostic::error(format!("definition `{}` depends on itself", name))
                .with_code("E0208")
                .with_label(Label::primary(*span, "referenced here while it is still being evaluated")),
            Self::DuplicateDefinition { name, span, previous } => {
                Diagnostic::error(format!("`{}` is defined more than once", name))
                    .with_code("E0209")
                    .with_label(Label::primary(*span, "redefined here"))
                    .with_label(Label::secondary(*previous, "first defined here"))
            }
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpreterError::UnboundIdentifier { name, .. } => write!(f, "Unbound identifier: {}", name),
            InterpreterError::NotCallable { type_name, .. } => write!(f, "Not callable: value is a {}", type_name),
            InterpreterError::ArityMismatch { callee, expected, found, .. } => {
                write!(f, "Arity mismatch: {} expects {} argument(s), got {}", callee, expected, found)
            }
            InterpreterError::StackExhausted { limit, kind: DepthLimit::Calls, .. } => {
                write!(f, "Stack exhausted: call depth exceeded {}", limit)
            }
            InterpreterError::StackExhausted { limit, kind: DepthLimit::Nesting, .. } => {
                write!(f, "Stack exhausted: expressions nested deeper than {}", limit)
            }
            InterpreterError::StepLimitExceeded { limit, .. } => {
                write!(f, "Step limit exceeded: more than {} evaluation steps", limit)
            }
            InterpreterError::TypeMismatch { operation, message, .. } => {
                write!(f, "Type mismatch in {}: {}", operation, message)
            }
            InterpreterError::DivisionByZero { operation, .. } => write!(f, "Division by zero in {}", operation),
            InterpreterError::CyclicDefinition { name, .. } => write!(f, "Cyclic definition: {}", name),
            InterpreterError::DuplicateDefinition { name, .. } => write!(f, "Duplicate definition: {}", name),
        }
    }
}

impl std::error::Error for InterpreterError {}

/// Any failure on the way from source text to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lex(LexError),
    Parse(Vec<ParseError>),
    Eval(InterpreterError),
}

impl Error {
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Lex(err) => vec![err.to_diagnostic()],
            Error::Parse(errors) => errors.iter().map(ParseError::to_diagnostic).collect(),
            Error::Eval(err) => vec![err.to_diagnostic()],
        }
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::Lex(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(vec![err])
    }
}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Error::Parse(errors)
    }
}

impl From<InterpreterError> for Error {
    fn from(err: InterpreterError) -> Self {
        Error::Eval(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(err) => write!(f, "{}", err),
            Error::Parse(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join("\n"))
            }
            Error::Eval(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceId;

    #[test]
    fn test_span_filled_only_when_missing() {
        let call_site = Span::new(SourceId(0), 4, 9);
        let err = InterpreterError::division_by_zero("/").with_span_if_missing(call_site);
        assert_eq!(err.span(), call_site);

        let original = Span::new(SourceId(0), 1, 2);
        let err = InterpreterError::unbound_identifier_at("y", original).with_span_if_missing(call_site);
        assert_eq!(err.span(), original);
    }

    #[test]
    fn test_display_names_the_culprit() {
        assert_eq!(InterpreterError::unbound_identifier("y").to_string(), "Unbound identifier: y");
        let err = InterpreterError::arity_mismatch_at("double", 1, 2, Span::dummy());
        assert!(err.to_string().contains("double"));
        assert!(InterpreterError::type_mismatch("+", "expected number").to_string().contains('+'));
    }

    #[test]
    fn test_diagnostic_codes() {
        let diag = InterpreterError::unbound_identifier("y").to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("E0201"));
        let diag = InterpreterError::cyclic_definition_at("loop", Span::dummy()).to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("E0208"));
    }

    #[test]
    fn test_depth_limits_are_told_apart() {
        let calls = InterpreterError::stack_exhausted_at(20, Span::dummy()).to_diagnostic();
        assert_eq!(calls.code.as_deref(), Some("E0204"));
        assert!(calls.notes.iter().any(|note| note == "the limit is 20 nested calls"));

        let nesting = InterpreterError::nesting_exhausted_at(512, Span::dummy());
        assert!(matches!(nesting, InterpreterError::StackExhausted { kind: DepthLimit::Nesting, .. }));
        assert_eq!(nesting.to_diagnostic().code.as_deref(), Some("E0204"));
        assert!(nesting.to_string().contains("512"));
    }

    #[test]
    fn test_arity_message_grammar() {
        let diag = InterpreterError::arity_mismatch_at("id", 1, 2, Span::dummy()).to_diagnostic();
        assert_eq!(diag.message, "`id` takes 1 argument but 2 were supplied");
    }
}

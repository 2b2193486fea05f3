use std::rc::Rc;

use crate::diagnostic::Span;

/// A whole source file: one or more definitions, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

/// `{def {name param ...} = body}`
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub body: Rc<Expr>,
    pub span: Span,
    /// Span of the name inside the definition head.
    pub name_span: Span,
}

impl Definition {
    /// Zero-parameter definitions are values rather than functions.
    pub fn is_value(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// One `[name := value]` entry of a where clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Rc<str>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(Rc<str>),
    Identifier(Rc<str>),
    /// `{then_branch if condition else else_branch}`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `{body where {[name := value] ...}}`
    Where {
        body: Box<Expr>,
        bindings: Vec<Binding>,
    },
    /// `{{param ...} => body}`
    Lambda {
        params: Vec<Rc<str>>,
        body: Rc<Expr>,
    },
    /// `{callee arg ...}`
    Application {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

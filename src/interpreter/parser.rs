use std::fmt;
use std::rc::Rc;

use crate::ast::{Binding, Definition, Expr, ExprKind, Program};
use crate::diagnostic::{Diagnostic, Label, Position, Span};
use crate::lexer::SpannedToken;
use crate::token::Token;

/// Deepest bracket nesting accepted before parsing gives up.
pub const MAX_NESTING: usize = 128;

const MAX_ERRORS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub position: Position,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            message: message.into(),
            span,
            position,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    /// The headline message: `expected ..., found ...` when known.
    pub fn summary(&self) -> String {
        if self.expected.is_empty() {
            return self.message.clone();
        }
        let mut msg = format!("expected {}", self.expected.join(" or "));
        if let Some(found) = &self.found {
            msg.push_str(&format!(", found {}", found));
        }
        msg
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = if self.expected.is_empty() { "" } else { self.message.as_str() };
        let mut diag = Diagnostic::error(self.summary())
            .with_code("E0101")
            .with_label(Label::primary(self.span, label));

        if self.expected.len() == 1 {
            diag = diag.with_help(format!("expected {} here", self.expected[0]));
        }

        diag
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: parse error: {}", self.position, self.summary())
    }
}

impl std::error::Error for ParseError {}

pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct TokenParser {
    tokens: Vec<SpannedToken>,
    current: usize,
    errors: Vec<ParseError>,
    depth: usize,
}

impl TokenParser {
    /// `tokens` normally come from [`crate::lexer::tokenize`]; a missing
    /// terminating `End` token is supplied here.
    pub fn new(mut tokens: Vec<SpannedToken>) -> Self {
        if !matches!(tokens.last(), Some(SpannedToken { token: Token::End, .. })) {
            let (span, position) = tokens
                .last()
                .map(|st| (Span::new(st.span.source, st.span.end, st.span.end), st.position))
                .unwrap_or_else(|| (Span::dummy(), Position { line: 1, column: 1 }));
            tokens.push(SpannedToken { token: Token::End, span, position });
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn current(&self) -> &SpannedToken {
        let last = self.tokens.len() - 1;
        &self.tokens[self.current.min(last)]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn peek_token(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + offset).min(last)].token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::End)
    }

    fn advance(&mut self) -> SpannedToken {
        let st = self.current().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        st
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let st = self.current();
        ParseError::new(message, st.span, st.position)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let message = if self.is_at_end() { "unexpected end of input" } else { "unexpected token" };
        self.error_here(message)
            .with_expected(vec![expected.to_string()])
            .with_found(self.current_token().to_string())
    }

    fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if std::mem::discriminant(self.current_token()) == std::mem::discriminant(&expected) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(Rc<str>, Span), ParseError> {
        match self.current_token() {
            Token::Ident(name) => {
                let name = Rc::from(name.as_str());
                Ok((name, self.advance().span))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Skip to the next `{ def`, the only place a fresh definition can start.
    /// Always moves past the token at `failed_at` so recovery makes progress.
    fn synchronize(&mut self, failed_at: usize) {
        if self.current == failed_at {
            self.advance();
        }
        while !self.is_at_end() {
            if matches!(self.current_token(), Token::LBrace) && matches!(self.peek_token(1), Token::Def) {
                return;
            }
            self.advance();
        }
    }

    /// Parse a whole program. Any error fails the parse, and all errors
    /// collected during recovery (at most ten) are returned.
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let result = self.parse_with_errors();
        if result.is_ok() {
            Ok(result.program)
        } else {
            Err(result.errors)
        }
    }

    /// Parse a whole program, collecting up to ten errors.
    pub fn parse_with_errors(&mut self) -> ParseResult {
        let mut definitions = Vec::new();

        if self.is_at_end() {
            self.errors.push(
                self.error_here("a program needs at least one definition")
                    .with_expected(vec!["`{def ...}`".to_string()])
                    .with_found(self.current_token().to_string()),
            );
        }

        while !self.is_at_end() {
            let start = self.current;
            match self.parse_definition() {
                Ok(definition) => definitions.push(definition),
                Err(err) => {
                    self.errors.push(err);
                    if self.errors.len() >= MAX_ERRORS {
                        break;
                    }
                    self.synchronize(start);
                }
            }
        }

        ParseResult {
            program: Program { definitions },
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Parse exactly one expression followed by end of input.
    pub fn parse_invocation(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if !self.is_at_end() {
            return Err(self
                .error_here("trailing input after the expression")
                .with_expected(vec![Token::End.to_string()])
                .with_found(self.current_token().to_string()));
        }
        Ok(expr)
    }

    fn parse_definition(&mut self) -> Result<Definition, ParseError> {
        let start = self.expect(Token::LBrace)?;
        self.expect(Token::Def)?;
        self.expect(Token::LBrace)?;
        let (name, name_span) = self.expect_ident("definition name")?;
        let params = self.parse_params()?;
        self.expect(Token::Assign)?;
        let body = self.parse_expr()?;
        let end = self.expect(Token::RBrace)?;

        Ok(Definition {
            name,
            params,
            body: Rc::new(body),
            span: start.merge(end),
            name_span,
        })
    }

    /// `id* }`; the opening brace has already been consumed.
    fn parse_params(&mut self) -> Result<Vec<Rc<str>>, ParseError> {
        let mut params: Vec<Rc<str>> = Vec::new();
        while !matches!(self.current_token(), Token::RBrace) {
            let position = self.current().position;
            let (param, span) = self.expect_ident("parameter name or `}`")?;
            if params.contains(&param) {
                return Err(ParseError::new(format!("duplicate parameter `{}`", param), span, position));
            }
            params.push(param);
        }
        self.advance();
        Ok(params)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!("expression nested more than {} levels deep", MAX_NESTING)));
        }
        self.depth += 1;
        let result = self.parse_expr_inner();
        self.depth -= 1;
        result
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let kind = match self.current_token() {
            Token::Number(n) => ExprKind::Number(*n),
            Token::String(s) => ExprKind::String(Rc::from(s.as_str())),
            Token::Ident(name) => ExprKind::Identifier(Rc::from(name.as_str())),
            Token::LBrace => return self.parse_braced(),
            token if token.is_keyword() => {
                return Err(self
                    .error_here(format!("unexpected {}", token))
                    .with_expected(vec!["expression".to_string()])
                    .with_found(token.to_string()));
            }
            _ => return Err(self.unexpected("expression")),
        };
        let span = self.advance().span;
        Ok(Expr::new(kind, span))
    }

    /// Lookahead for `{ id* } =>` right after an opening brace.
    fn is_lambda_head(&self) -> bool {
        if !matches!(self.current_token(), Token::LBrace) {
            return false;
        }
        let mut offset = 1;
        while matches!(self.peek_token(offset), Token::Ident(_)) {
            offset += 1;
        }
        matches!(self.peek_token(offset), Token::RBrace) && matches!(self.peek_token(offset + 1), Token::Arrow)
    }

    fn parse_braced(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(Token::LBrace)?;

        if self.is_lambda_head() {
            self.advance();
            let params = self.parse_params()?;
            self.expect(Token::Arrow)?;
            let body = self.parse_expr()?;
            let end = self.expect(Token::RBrace)?;
            return Ok(Expr::new(
                ExprKind::Lambda { params, body: Rc::new(body) },
                start.merge(end),
            ));
        }

        if matches!(self.current_token(), Token::RBrace) {
            return Err(self.unexpected("expression"));
        }

        let first = self.parse_expr()?;

        let kind = match self.current_token() {
            Token::If => {
                self.advance();
                let condition = self.parse_expr()?;
                self.expect(Token::Else)?;
                let else_branch = self.parse_expr()?;
                ExprKind::Conditional {
                    condition: Box::new(condition),
                    then_branch: Box::new(first),
                    else_branch: Box::new(else_branch),
                }
            }
            Token::Where => {
                self.advance();
                let bindings = self.parse_bindings()?;
                ExprKind::Where { body: Box::new(first), bindings }
            }
            _ => {
                let mut args = Vec::new();
                while !matches!(self.current_token(), Token::RBrace) {
                    if self.is_at_end() {
                        return Err(self.unexpected(&Token::RBrace.to_string()));
                    }
                    args.push(self.parse_expr()?);
                }
                ExprKind::Application { callee: Box::new(first), args }
            }
        };

        let end = self.expect(Token::RBrace)?;
        Ok(Expr::new(kind, start.merge(end)))
    }

    /// `{ [id := expr] ... }`
    fn parse_bindings(&mut self) -> Result<Vec<Binding>, ParseError> {
        self.expect(Token::LBrace)?;
        let mut bindings = Vec::new();
        while !matches!(self.current_token(), Token::RBrace) {
            if !matches!(self.current_token(), Token::LBracket) {
                return Err(self.unexpected("`[` or `}`"));
            }
            let start = self.advance().span;
            let (name, _) = self.expect_ident("binding name")?;
            self.expect(Token::Define)?;
            let value = self.parse_expr()?;
            let end = self.expect(Token::RBracket)?;
            bindings.push(Binding { name, value, span: start.merge(end) });
        }
        self.advance();
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceId;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Program {
        let tokens = tokenize(source, SourceId(0)).expect("Lexer failed");
        TokenParser::new(tokens).parse_program().expect("Parser failed")
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        let tokens = tokenize(source, SourceId(0)).expect("Lexer failed");
        TokenParser::new(tokens).parse_program().expect_err("expected a parse error")
    }

    fn invocation(source: &str) -> Result<Expr, ParseError> {
        let tokens = tokenize(source, SourceId(0)).expect("Lexer failed");
        TokenParser::new(tokens).parse_invocation()
    }

    fn body(source: &str) -> ExprKind {
        parse(source).definitions[0].body.kind.clone()
    }

    #[test]
    fn test_definition_with_params() {
        let program = parse("{def {double x} = {+ x x}}");
        assert_eq!(program.definitions.len(), 1);
        let def = &program.definitions[0];
        assert_eq!(&*def.name, "double");
        assert_eq!(def.params, vec![Rc::<str>::from("x")]);
        assert!(!def.is_value());
        assert_eq!((def.span.start, def.span.end), (0, 26));
    }

    #[test]
    fn test_value_definition() {
        let program = parse("{def {answer} = 42}");
        assert!(program.definitions[0].is_value());
        assert_eq!(body("{def {answer} = 42}"), ExprKind::Number(42.0));
    }

    #[test]
    fn test_conditional_is_then_first() {
        match body("{def {f x} = {1 if x else 2}}") {
            ExprKind::Conditional { condition, then_branch, else_branch } => {
                assert_eq!(condition.kind, ExprKind::Identifier(Rc::from("x")));
                assert_eq!(then_branch.kind, ExprKind::Number(1.0));
                assert_eq!(else_branch.kind, ExprKind::Number(2.0));
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_where_bindings() {
        match body("{def {f} = {{+ a b} where {[a := 1] [b := 2]}}}") {
            ExprKind::Where { body, bindings } => {
                assert!(matches!(body.kind, ExprKind::Application { .. }));
                let names: Vec<&str> = bindings.iter().map(|b| &*b.name).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected where, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda() {
        match body("{def {f} = {{x y} => {+ x y}}}") {
            ExprKind::Lambda { params, .. } => assert_eq!(params.len(), 2),
            other => panic!("expected lambda, got {:?}", other),
        }
        match body("{def {f} = {{} => 1}}") {
            ExprKind::Lambda { params, .. } => assert!(params.is_empty()),
            other => panic!("expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_application_of_application() {
        match body("{def {f} = {{g 1} 2}}") {
            ExprKind::Application { callee, args } => {
                assert!(matches!(callee.kind, ExprKind::Application { .. }));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected application, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_argument_application() {
        match body("{def {f} = {g}}") {
            ExprKind::Application { args, .. } => assert!(args.is_empty()),
            other => panic!("expected application, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program_is_an_error() {
        let errors = parse_errors("  # just a comment\n");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_empty_braces_are_an_error() {
        let errors = parse_errors("{def {f} = {}}");
        assert!(errors[0].summary().contains("expected expression"));
    }

    #[test]
    fn test_duplicate_parameter() {
        let errors = parse_errors("{def {f x x} = x}");
        assert!(errors[0].message.contains("duplicate parameter `x`"));
    }

    #[test]
    fn test_stray_keyword() {
        let errors = parse_errors("{def {f x} = {g else x}}");
        assert!(errors[0].message.contains("keyword `else`"));
    }

    #[test]
    fn test_missing_close_reports_end_of_input() {
        let errors = parse_errors("{def {f x} = {+ x 1}");
        assert_eq!(errors[0].message, "unexpected end of input");
        assert_eq!(errors[0].found.as_deref(), Some("end of input"));
    }

    #[test]
    fn test_recovery_collects_errors_from_several_definitions() {
        let source = "{def {a} = {}}\n{def {b} = 1}\n{def {c x x} = x}";
        let tokens = tokenize(source, SourceId(0)).unwrap();
        let result = TokenParser::new(tokens).parse_with_errors();
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.program.definitions.len(), 1);
        assert_eq!(&*result.program.definitions[0].name, "b");
        assert_eq!(result.errors[1].position.line, 3);
    }

    #[test]
    fn test_parse_program_returns_every_collected_error() {
        let source = "{def {a} = {}}\n{def {b} = 1}\n{def {c x x} = x}";
        assert_eq!(parse_errors(source).len(), 2);

        let many = "{def {f} = {}}\n".repeat(MAX_ERRORS + 3);
        assert_eq!(parse_errors(&many).len(), MAX_ERRORS);
    }

    #[test]
    fn test_recovery_keeps_following_definition() {
        let source = "{def {a} = 1\n{def {b} = 2}";
        let tokens = tokenize(source, SourceId(0)).unwrap();
        let result = TokenParser::new(tokens).parse_with_errors();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(&*result.program.definitions[0].name, "b");
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{{def {{f}} = {}1{}}}", "{g ".repeat(MAX_NESTING + 5), "}".repeat(MAX_NESTING + 5));
        let errors = parse_errors(&deep);
        assert!(errors[0].message.contains("nested"));
    }

    #[test]
    fn test_invocation() {
        let expr = invocation("{double 21}").unwrap();
        assert!(matches!(expr.kind, ExprKind::Application { .. }));
        assert!(invocation("double 21").is_err());
        assert!(invocation("").is_err());
    }

    #[test]
    fn test_error_display_has_position() {
        let errors = parse_errors("{def {f} =\n  }");
        assert!(errors[0].to_string().starts_with("2:3: parse error"));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let source = "{def {f x} = {{x if {< x 1} else {f {- x 1}}} where {[y := 2]}}}";
        assert_eq!(parse(source), parse(source));
    }
}

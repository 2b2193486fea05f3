use chumsky::error::RichReason;
use chumsky::prelude::*;
use std::fmt;

use crate::diagnostic::{Diagnostic, Label, LineIndex, Position, SourceId, Span};
use crate::token::Token;

/// Characters that may form operator identifiers such as `+`, `<=` or `++`.
const OPERATOR_CHARS: &str = "+-*/%<>=!&|^~?";

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
    pub position: Position,
}

impl LexError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = if self.message.starts_with("unterminated") {
            "string starts here"
        } else {
            "not valid here"
        };
        Diagnostic::error(self.message.clone())
            .with_code("E0001")
            .with_label(Label::primary(Span::new(self.span.source, self.span.start, self.span.start + 1), label))
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: lex error: {}", self.position, self.message)
    }
}

impl std::error::Error for LexError {}

fn quoted<'a>(quote: char) -> impl Parser<'a, &'a str, Token, extra::Err<Rich<'a, char>>> {
    just(quote)
        .ignore_then(none_of(quote).repeated().to_slice())
        .then(just(quote).or_not())
        .validate(|(body, closing): (&str, Option<char>), e, emitter| {
            if closing.is_none() {
                emitter.emit(Rich::custom(e.span(), "unterminated string literal"));
            }
            Token::String(body.to_string())
        })
}

pub fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Rich<'a, char>>> {
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse()
                .map(Token::Number)
                .map_err(|err| Rich::custom(span, err))
        });

    let word = text::ascii::ident().map(|s: &str| match s {
        "def" => Token::Def,
        "if" => Token::If,
        "else" => Token::Else,
        "where" => Token::Where,
        _ => Token::Ident(s.to_string()),
    });

    let symbol = choice((
        just(":=").to(Token::Define),
        just("...").to(Token::Ellipsis),
        just(':').to(Token::Colon),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
    ));

    // `=` and `=>` are punctuation; every other operator run is an identifier.
    let operator = one_of(OPERATOR_CHARS)
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| match s {
            "=" => Token::Assign,
            "=>" => Token::Arrow,
            _ => Token::Ident(s.to_string()),
        });

    let comment = just('#').then(none_of('\n').repeated()).padded();

    let token = choice((number, quoted('"'), quoted('\''), word, symbol, operator))
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(comment.clone().repeated())
        .padded();

    token
        .repeated()
        .collect()
        .padded_by(comment.repeated())
        .padded()
        .then_ignore(end())
}

/// Lex a whole source text. The returned tokens always end with `Token::End`.
pub fn tokenize(source: &str, source_id: SourceId) -> Result<Vec<SpannedToken>, LexError> {
    let lines = LineIndex::new(source);
    let (output, errors) = lexer().parse(source).into_output_errors();

    if let Some(err) = errors.iter().min_by_key(|err| err.span().start) {
        let message = match err.reason() {
            RichReason::Custom(message) => message.clone(),
            _ => match err.found() {
                Some(ch) => format!("unrecognized character `{}`", ch.escape_debug()),
                None => "unexpected end of input".to_string(),
            },
        };
        let start = err.span().start;
        return Err(LexError {
            message,
            span: Span::new(source_id, start, err.span().end.max(start)),
            position: lines.position(source, start),
        });
    }

    let mut tokens: Vec<SpannedToken> = output
        .unwrap_or_default()
        .into_iter()
        .map(|(token, span)| SpannedToken {
            token,
            span: Span::new(source_id, span.start, span.end),
            position: lines.position(source, span.start),
        })
        .collect();

    tokens.push(SpannedToken {
        token: Token::End,
        span: Span::new(source_id, source.len(), source.len()),
        position: lines.position(source, source.len()),
    });

    Ok(tokens)
}

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Def,
    If,
    Else,
    Where,

    // Literals and Identifiers
    /// Word identifiers (`double`) and operator identifiers (`+`, `<=`, `++`).
    Ident(String),
    Number(f64),
    String(String),

    // Symbols
    /// `=` between a definition head and its body
    Assign,
    /// `:=` inside a where binding
    Define,
    /// `=>` between lambda parameters and body
    Arrow,
    Ellipsis,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    End,
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        matches!(self, Token::Def | Token::If | Token::Else | Token::Where)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Def => write!(f, "keyword `def`"),
            Token::If => write!(f, "keyword `if`"),
            Token::Else => write!(f, "keyword `else`"),
            Token::Where => write!(f, "keyword `where`"),
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Number(n) => write!(f, "number `{}`", n),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Assign => write!(f, "`=`"),
            Token::Define => write!(f, "`:=`"),
            Token::Arrow => write!(f, "`=>`"),
            Token::Ellipsis => write!(f, "`...`"),
            Token::Colon => write!(f, "`:`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::LBrace => write!(f, "`{{`"),
            Token::RBrace => write!(f, "`}}`"),
            Token::LBracket => write!(f, "`[`"),
            Token::RBracket => write!(f, "`]`"),
            Token::End => write!(f, "end of input"),
        }
    }
}

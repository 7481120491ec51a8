use std::fmt::{self, Display, Formatter};

use compact_str::CompactString;

use crate::range::Range;
use crate::value::format_number;

#[derive(PartialEq, Debug, Clone)]
pub struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    Amp,
    AmpAmp,
    BoolLiteral(bool),
    Caret,
    ColumnRef(CompactString),
    Comma,
    DoubleLiteral(f64),
    Eof,
    EqEq,
    Gt,
    Gte,
    Ident(CompactString),
    IntegerLiteral(i64),
    LParen,
    Lt,
    Lte,
    MacroRef(CompactString),
    Minus,
    NeEq,
    Not,
    Percent,
    Pipe,
    PipePipe,
    Plus,
    RParen,
    ScopeConstantRef(CompactString),
    Shl,
    Shr,
    Slash,
    Star,
    StringLiteral(String),
    Tilde,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self {
            TokenKind::Amp => write!(f, "&"),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::BoolLiteral(b) => write!(f, "{}", b),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::ColumnRef(name) => write!(f, "[{}]", name),
            TokenKind::Comma => write!(f, ","),
            TokenKind::DoubleLiteral(v) => write!(f, "{}", format_number(*v)),
            TokenKind::Eof => write!(f, ""),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Gte => write!(f, ">="),
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::IntegerLiteral(v) => write!(f, "{}", v),
            TokenKind::LParen => write!(f, "("),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Lte => write!(f, "<="),
            TokenKind::MacroRef(name) => write!(f, "%{{{}}}", name),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::NeEq => write!(f, "!="),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::ScopeConstantRef(name) => write!(f, "#{{{}}}", name),
            TokenKind::Shl => write!(f, "<<"),
            TokenKind::Shr => write!(f, ">>"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StringLiteral(s) => write!(f, "\"{}\"", s),
            TokenKind::Tilde => write!(f, "~"),
        }
    }
}

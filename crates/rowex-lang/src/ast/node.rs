use std::fmt::{self, Display, Formatter};

use compact_str::CompactString;
use itertools::Itertools;

use crate::range::Range;
use crate::value::format_number;

pub type Args = Vec<Node>;

#[derive(PartialEq, Debug, Clone)]
pub struct Node {
    pub expr: Expr,
    pub range: Range,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    /// A bare identifier or `[name]` reference resolved against the constant
    /// and table-column resolvers.
    Column(CompactString),
    /// A `%{name}` reference resolved against the scope resolvers.
    Macro(CompactString),
    /// A `#{name}` reference, immutable for the session and foldable.
    ScopeConstant(CompactString),
    /// A function call; operator applications desugar to calls keyed by the
    /// operator symbol.
    Call(CompactString, Args),
}

#[derive(PartialEq, Debug, Clone)]
pub enum Literal {
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Integer(v)) => write!(f, "{}", v),
            Expr::Literal(Literal::Double(v)) => write!(f, "{}", format_number(*v)),
            Expr::Literal(Literal::String(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(Literal::Boolean(b)) => write!(f, "{}", b),
            Expr::Column(name) => write!(f, "[{}]", name),
            Expr::Macro(name) => write!(f, "%{{{}}}", name),
            Expr::ScopeConstant(name) => write!(f, "#{{{}}}", name),
            Expr::Call(name, args) => {
                write!(
                    f,
                    "{}({})",
                    name,
                    args.iter().map(|a| a.expr.to_string()).join(", ")
                )
            }
        }
    }
}

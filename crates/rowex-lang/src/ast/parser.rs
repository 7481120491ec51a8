use compact_str::CompactString;

use super::error::ParseError;
use super::node::{Expr, Literal, Node};
use crate::lexer::token::{Token, TokenKind};
use crate::range::Range;

/// Precedence-climbing parser over the token stream.
///
/// Operator applications desugar to [`Expr::Call`] nodes keyed by the operator
/// symbol, so the compiler dispatches every interior node through the function
/// registry. The parser capitulates on the first violation; it never attempts
/// recovery.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Node, ParseError> {
        let node = self.parse_expr(0)?;
        let token = self.peek();

        if token.is_eof() {
            Ok(node)
        } else {
            Err(ParseError::UnexpectedToken(token.clone()))
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Node, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some((symbol, l_bp, r_bp)) = binary_operator(&self.peek().kind) {
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let range = Range::between(lhs.range, rhs.range);
            lhs = Node {
                expr: Expr::Call(CompactString::const_new(symbol), vec![lhs, rhs]),
                range,
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let token = self.peek().clone();
        let symbol = match token.kind {
            TokenKind::Minus => "-",
            TokenKind::Not => "!",
            TokenKind::Tilde => "~",
            _ => return self.parse_primary(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        let range = Range::between(token.range, operand.range);

        Ok(Node {
            expr: Expr::Call(CompactString::const_new(symbol), vec![operand]),
            range,
        })
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::IntegerLiteral(v) => Expr::Literal(Literal::Integer(v)),
            TokenKind::DoubleLiteral(v) => Expr::Literal(Literal::Double(v)),
            TokenKind::StringLiteral(s) => Expr::Literal(Literal::String(s)),
            TokenKind::BoolLiteral(b) => Expr::Literal(Literal::Boolean(b)),
            TokenKind::ColumnRef(name) => Expr::Column(name),
            TokenKind::MacroRef(name) => Expr::Macro(name),
            TokenKind::ScopeConstantRef(name) => Expr::ScopeConstant(name),
            TokenKind::Ident(name) => {
                if matches!(self.peek().kind, TokenKind::LParen) {
                    return self.parse_call(name, token.range);
                }
                Expr::Column(name)
            }
            TokenKind::LParen => {
                let node = self.parse_expr(0)?;
                let close = self.peek().clone();
                if !matches!(close.kind, TokenKind::RParen) {
                    return Err(ParseError::ExpectedClosingParen(close));
                }
                self.advance();
                return Ok(Node {
                    expr: node.expr,
                    range: Range::between(token.range, close.range),
                });
            }
            TokenKind::Eof => return Err(ParseError::UnexpectedEOFDetected),
            _ => return Err(ParseError::UnexpectedToken(token)),
        };

        Ok(Node {
            expr,
            range: token.range,
        })
    }

    fn parse_call(&mut self, name: CompactString, start: Range) -> Result<Node, ParseError> {
        self.advance();
        let mut args = Vec::new();

        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                args.push(self.parse_expr(0)?);
                match self.peek().kind {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    TokenKind::RParen => break,
                    _ => return Err(ParseError::ExpectedClosingParen(self.peek().clone())),
                }
            }
        }

        let close = self.advance();
        Ok(Node {
            expr: Expr::Call(name, args),
            range: Range::between(start, close.range),
        })
    }
}

fn binary_operator(kind: &TokenKind) -> Option<(&'static str, u8, u8)> {
    // `^` is right-associative, everything else associates to the left;
    // unary operators bind tighter than `^` (so -2^2 is (-2)^2).
    let op = match kind {
        TokenKind::PipePipe => ("||", 1, 2),
        TokenKind::AmpAmp => ("&&", 3, 4),
        TokenKind::Pipe => ("|", 5, 6),
        TokenKind::Amp => ("&", 7, 8),
        TokenKind::EqEq => ("==", 9, 10),
        TokenKind::NeEq => ("!=", 9, 10),
        TokenKind::Lt => ("<", 11, 12),
        TokenKind::Lte => ("<=", 11, 12),
        TokenKind::Gt => (">", 11, 12),
        TokenKind::Gte => (">=", 11, 12),
        TokenKind::Shl => ("<<", 13, 14),
        TokenKind::Shr => (">>", 13, 14),
        TokenKind::Plus => ("+", 15, 16),
        TokenKind::Minus => ("-", 15, 16),
        TokenKind::Star => ("*", 17, 18),
        TokenKind::Slash => ("/", 17, 18),
        TokenKind::Percent => ("%", 17, 18),
        TokenKind::Caret => ("^", 20, 19),
        _ => return None,
    };
    Some(op)
}

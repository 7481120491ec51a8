pub mod error;
pub mod token;

use compact_str::CompactString;
use error::LexerError;
use nom::Parser;
use nom::bytes::complete::is_not;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while_m_n},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, none_of, one_of},
    combinator::{map, map_opt, map_res, opt, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded},
};
use nom_locate::position;
use token::{Token, TokenKind};

use crate::range::{Range, Span};

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Token> {
            map(tag($tag), |span: Span| Token {
                range: span.into(),
                kind: $kind,
            })
            .parse(input)
        }
    };
}

/// Tokenizes the whole input, capitulating on the first character that does
/// not start a valid token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    match tokens(Span::new(input)) {
        Ok((rest, toks)) => {
            let eof: Range = rest.into();

            if eof.start == eof.end {
                Ok([
                    toks,
                    vec![Token {
                        range: eof,
                        kind: TokenKind::Eof,
                    }],
                ]
                .concat())
            } else {
                Err(unexpected(rest))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(e.input)),
        _ => unreachable!(),
    }
}

fn unexpected(span: Span) -> LexerError {
    match span.fragment().chars().next() {
        Some(c) => LexerError::UnexpectedToken(span.into(), c),
        None => LexerError::UnexpectedEOFDetected,
    }
}

fn unicode(input: Span) -> IResult<Span, char> {
    map_opt(
        map_res(
            preceded(
                char('u'),
                delimited(
                    char('{'),
                    take_while_m_n(1, 6, |c: char| c.is_ascii_hexdigit()),
                    char('}'),
                ),
            ),
            |span: Span| u32::from_str_radix(span.fragment(), 16),
        ),
        char::from_u32,
    )
    .parse(input)
}

define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(l_paren, "(", TokenKind::LParen);
define_token_parser!(r_paren, ")", TokenKind::RParen);
define_token_parser!(plus, "+", TokenKind::Plus);
define_token_parser!(minus, "-", TokenKind::Minus);
define_token_parser!(star, "*", TokenKind::Star);
define_token_parser!(slash, "/", TokenKind::Slash);
define_token_parser!(percent, "%", TokenKind::Percent);
define_token_parser!(caret, "^", TokenKind::Caret);
define_token_parser!(lte, "<=", TokenKind::Lte);
define_token_parser!(shl, "<<", TokenKind::Shl);
define_token_parser!(lt, "<", TokenKind::Lt);
define_token_parser!(gte, ">=", TokenKind::Gte);
define_token_parser!(shr, ">>", TokenKind::Shr);
define_token_parser!(gt, ">", TokenKind::Gt);
define_token_parser!(eq_eq, "==", TokenKind::EqEq);
define_token_parser!(ne_eq, "!=", TokenKind::NeEq);
define_token_parser!(not, "!", TokenKind::Not);
define_token_parser!(amp_amp, "&&", TokenKind::AmpAmp);
define_token_parser!(amp, "&", TokenKind::Amp);
define_token_parser!(pipe_pipe, "||", TokenKind::PipePipe);
define_token_parser!(pipe, "|", TokenKind::Pipe);
define_token_parser!(tilde, "~", TokenKind::Tilde);
define_token_parser!(
    empty_string,
    "\"\"",
    TokenKind::StringLiteral(String::new())
);

fn operators(input: Span) -> IResult<Span, Token> {
    alt((
        lte, shl, lt, gte, shr, gt, eq_eq, ne_eq, not, amp_amp, amp, pipe_pipe, pipe, plus, minus,
        star, slash, percent, caret, tilde,
    ))
    .parse(input)
}

fn punctuations(input: Span) -> IResult<Span, Token> {
    alt((l_paren, r_paren, comma)).parse(input)
}

fn number_literal(input: Span) -> IResult<Span, Token> {
    map_res(
        recognize((
            digit1,
            opt(preceded(char('.'), digit1)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        |span: Span| {
            let fragment = *span.fragment();
            let kind = if fragment.contains(['.', 'e', 'E']) {
                TokenKind::DoubleLiteral(fragment.parse::<f64>()?)
            } else {
                match fragment.parse::<i64>() {
                    Ok(v) => TokenKind::IntegerLiteral(v),
                    // literals beyond the i64 range degrade to real
                    Err(_) => TokenKind::DoubleLiteral(fragment.parse::<f64>()?),
                }
            };
            Ok::<_, std::num::ParseFloatError>(Token {
                range: span.into(),
                kind,
            })
        },
    )
    .parse(input)
}

fn string_literal(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, s) = delimited(
        char('"'),
        escaped_transform(
            none_of("\"\\"),
            '\\',
            alt((
                value('\\', char('\\')),
                value('\"', char('\"')),
                value('\r', char('r')),
                value('\n', char('n')),
                value('\t', char('t')),
                unicode,
            )),
        ),
        char('"'),
    )
    .parse(span)?;
    let (span, end) = position(span)?;

    Ok((
        span,
        Token {
            range: Range {
                start: start.into(),
                end: end.into(),
            },
            kind: TokenKind::StringLiteral(s.to_string()),
        },
    ))
}

fn scoped_reference(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, sigil) = alt((tag("%{"), tag("#{"))).parse(span)?;
    let (span, name) = is_not("}\r\n").parse(span)?;
    let (span, _) = char('}')(span)?;
    let (span, end) = position(span)?;

    let name = CompactString::new(name.fragment());
    let kind = if *sigil.fragment() == "%{" {
        TokenKind::MacroRef(name)
    } else {
        TokenKind::ScopeConstantRef(name)
    };

    Ok((
        span,
        Token {
            range: Range {
                start: start.into(),
                end: end.into(),
            },
            kind,
        },
    ))
}

fn column_reference(input: Span) -> IResult<Span, Token> {
    let (span, start) = position(input)?;
    let (span, name) = delimited(char('['), is_not("]\r\n"), char(']')).parse(span)?;
    let (span, end) = position(span)?;

    Ok((
        span,
        Token {
            range: Range {
                start: start.into(),
                end: end.into(),
            },
            kind: TokenKind::ColumnRef(CompactString::new(name.fragment())),
        },
    ))
}

fn literals(input: Span) -> IResult<Span, Token> {
    alt((number_literal, empty_string, string_literal)).parse(input)
}

fn ident(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| {
            let kind = match *span.fragment() {
                "true" => TokenKind::BoolLiteral(true),
                "false" => TokenKind::BoolLiteral(false),
                fragment => TokenKind::Ident(CompactString::new(fragment)),
            };
            Token {
                range: span.into(),
                kind,
            }
        },
    )
    .parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    alt((
        literals,
        scoped_reference,
        column_reference,
        operators,
        punctuations,
        ident,
    ))
    .parse(input)
}

fn tokens(input: Span) -> IResult<Span, Vec<Token>> {
    many1(delimited(multispace0, token, multispace0)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Position;
    use rstest::rstest;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[rstest]
    #[case("1 + 2", vec![
        TokenKind::IntegerLiteral(1),
        TokenKind::Plus,
        TokenKind::IntegerLiteral(2),
        TokenKind::Eof,
    ])]
    #[case("1.5*2e3", vec![
        TokenKind::DoubleLiteral(1.5),
        TokenKind::Star,
        TokenKind::DoubleLiteral(2e3),
        TokenKind::Eof,
    ])]
    #[case("a <= b << 2", vec![
        TokenKind::Ident("a".into()),
        TokenKind::Lte,
        TokenKind::Ident("b".into()),
        TokenKind::Shl,
        TokenKind::IntegerLiteral(2),
        TokenKind::Eof,
    ])]
    #[case("x && !y || z", vec![
        TokenKind::Ident("x".into()),
        TokenKind::AmpAmp,
        TokenKind::Not,
        TokenKind::Ident("y".into()),
        TokenKind::PipePipe,
        TokenKind::Ident("z".into()),
        TokenKind::Eof,
    ])]
    #[case("concat(\"a\", \"\")", vec![
        TokenKind::Ident("concat".into()),
        TokenKind::LParen,
        TokenKind::StringLiteral("a".to_string()),
        TokenKind::Comma,
        TokenKind::StringLiteral(String::new()),
        TokenKind::RParen,
        TokenKind::Eof,
    ])]
    #[case("%{macro_1} + #{scope}", vec![
        TokenKind::MacroRef("macro_1".into()),
        TokenKind::Plus,
        TokenKind::ScopeConstantRef("scope".into()),
        TokenKind::Eof,
    ])]
    #[case("[column a] % 2", vec![
        TokenKind::ColumnRef("column a".into()),
        TokenKind::Percent,
        TokenKind::IntegerLiteral(2),
        TokenKind::Eof,
    ])]
    #[case("true != false", vec![
        TokenKind::BoolLiteral(true),
        TokenKind::NeEq,
        TokenKind::BoolLiteral(false),
        TokenKind::Eof,
    ])]
    #[case("~5 & 3 | 1", vec![
        TokenKind::Tilde,
        TokenKind::IntegerLiteral(5),
        TokenKind::Amp,
        TokenKind::IntegerLiteral(3),
        TokenKind::Pipe,
        TokenKind::IntegerLiteral(1),
        TokenKind::Eof,
    ])]
    #[case("\"a\\nb\\u{0061}\"", vec![
        TokenKind::StringLiteral("a\na".to_string()),
        TokenKind::Eof,
    ])]
    fn test_tokenize(#[case] input: &str, #[case] expected: Vec<TokenKind>) {
        assert_eq!(kinds(input), expected);
    }

    #[rstest]
    #[case("2 @ 3", '@')]
    #[case("\"unclosed", '"')]
    #[case("%{unclosed", '%')]
    #[case("[unclosed", '[')]
    fn test_tokenize_error(#[case] input: &str, #[case] offending: char) {
        match tokenize(input) {
            Err(LexerError::UnexpectedToken(_, c)) => assert_eq!(c, offending),
            other => panic!("expected lexer error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_ranges() {
        let tokens = tokenize("1 + 22").unwrap();
        assert_eq!(
            tokens[0].range,
            Range {
                start: Position { line: 1, column: 1 },
                end: Position { line: 1, column: 2 }
            }
        );
        assert_eq!(
            tokens[2].range,
            Range {
                start: Position { line: 1, column: 5 },
                end: Position { line: 1, column: 7 }
            }
        );
    }

    #[test]
    fn test_integer_overflow_degrades_to_double() {
        let tokens = tokenize("99999999999999999999").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::DoubleLiteral(_)));
    }
}

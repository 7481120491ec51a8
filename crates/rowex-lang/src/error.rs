use std::fmt::Display;

use miette::{Diagnostic, LabeledSpan, SourceCode};
use thiserror::Error;

use crate::ast::error::ParseError;
use crate::eval::error::{CompileError, EvalError};
use crate::lexer::error::LexerError;
use crate::range::{Position, Range};

#[derive(Error, Debug, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{error}")]
    Eval {
        error: EvalError,
        range: Option<Range>,
    },
}

impl From<EvalError> for InnerError {
    fn from(error: EvalError) -> Self {
        InnerError::Eval { error, range: None }
    }
}

impl From<CompileError> for InnerError {
    fn from(error: CompileError) -> Self {
        InnerError::Eval {
            error: error.error,
            range: Some(error.range),
        }
    }
}

/// Any failure while tokenizing, parsing, checking or building an expression,
/// carrying the offending source for rendering.
#[derive(Error, Debug, PartialEq)]
#[error("{cause}")]
pub struct Error {
    cause: InnerError,
    source_code: String,
}

impl Error {
    pub(crate) fn new(source_code: &str, cause: impl Into<InnerError>) -> Self {
        Self {
            cause: cause.into(),
            source_code: source_code.to_string(),
        }
    }

    pub fn cause(&self) -> &InnerError {
        &self.cause
    }

    pub fn range(&self) -> Option<Range> {
        match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedToken(range, _)) => Some(*range),
            InnerError::Lexer(LexerError::UnexpectedEOFDetected) => None,
            InnerError::Parse(ParseError::UnexpectedToken(token))
            | InnerError::Parse(ParseError::ExpectedClosingParen(token)) => Some(token.range),
            InnerError::Parse(ParseError::UnexpectedEOFDetected) => None,
            InnerError::Eval { range, .. } => *range,
        }
    }

    /// 1-based line of the offending location, when one is known.
    pub fn line(&self) -> Option<u32> {
        self.range().map(|r| r.start.line)
    }

    fn code_name(&self) -> &'static str {
        match &self.cause {
            InnerError::Lexer(_) | InnerError::Parse(_) => "SyntaxError",
            InnerError::Eval { error, .. } => match error {
                EvalError::EmptyExpression => "InvalidArgumentError",
                EvalError::UnknownFunction(_)
                | EvalError::UnknownVariable(_)
                | EvalError::UnknownMacro(_)
                | EvalError::UnknownScopeConstant(_) => "UnknownNameError",
                EvalError::InvalidNumberOfArguments { .. } => "ArityError",
                EvalError::InvalidTypes { .. }
                | EvalError::InvalidRegularExpression(..)
                | EvalError::WrongResultType { .. } => "TypeError",
                EvalError::Cancelled => "CancellationError",
                EvalError::Internal(_) => "FatalInternalError",
            },
        }
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.code_name()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        let help = match self.code_name() {
            "SyntaxError" => "fix the expression near the reported location",
            "UnknownNameError" => "declare the name in the context or fix the spelling",
            "ArityError" => "pass the number of arguments the function expects",
            "TypeError" => "adjust the argument types to what the function expects",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source_code)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let range = self.range()?;
        let start = byte_offset(&self.source_code, range.start);
        let end = byte_offset(&self.source_code, range.end).max(start);
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.cause.to_string()),
            start,
            end - start,
        ))))
    }
}

fn byte_offset(source: &str, position: Position) -> usize {
    let mut offset = 0;
    for (i, line) in source.split('\n').enumerate() {
        if i + 1 == position.line as usize {
            return offset
                + line
                    .chars()
                    .take(position.column.saturating_sub(1))
                    .map(char::len_utf8)
                    .sum::<usize>();
        }
        offset += line.len() + 1;
    }
    source.len()
}

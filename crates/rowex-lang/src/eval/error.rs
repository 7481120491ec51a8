use compact_str::CompactString;
use thiserror::Error;

use crate::functions::ParamNum;
use crate::range::Range;
use crate::types::ExpressionType;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum EvalError {
    #[error("The expression is empty")]
    EmptyExpression,
    #[error("Unknown function `{0}`")]
    UnknownFunction(CompactString),
    #[error("Unknown variable `{0}`")]
    UnknownVariable(CompactString),
    #[error("Unknown macro `{0}`")]
    UnknownMacro(CompactString),
    #[error("Unknown scope constant `{0}`")]
    UnknownScopeConstant(CompactString),
    #[error("`{name}` expects {expected} but got {actual}")]
    InvalidNumberOfArguments {
        name: CompactString,
        expected: ParamNum,
        actual: usize,
    },
    #[error("Wrong argument types for `{name}`, expected {expected}")]
    InvalidTypes {
        name: CompactString,
        expected: &'static str,
    },
    #[error("Invalid regular expression `{0}`: {1}")]
    InvalidRegularExpression(String, String),
    #[error("Expression evaluation was stopped")]
    Cancelled,
    #[error("The expression evaluates to {actual} but a {expected} result was requested")]
    WrongResultType {
        expected: &'static str,
        actual: ExpressionType,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An [`EvalError`] raised while building or checking an evaluator tree,
/// anchored to the source range of the offending node.
#[derive(Error, Debug, PartialEq, Clone)]
#[error("{error}")]
pub struct CompileError {
    pub error: EvalError,
    pub range: Range,
}

impl CompileError {
    pub fn new(error: EvalError, range: Range) -> Self {
        Self { error, range }
    }
}

use thiserror::Error;

use crate::range::Range;

#[derive(Error, Debug, PartialEq)]
pub enum LexerError {
    #[error("Unexpected character `{1}`")]
    UnexpectedToken(Range, char),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected,
}

use super::lexer::Token;
use thiserror::Error;

/// Syntax error found while building an expression tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { expected: &'static str, found: Token },

    #[error("field `{field}` has no value to compare against, found {found}")]
    MissingValue { field: String, found: Token },

    #[error("expected ')' to close group, found {found}")]
    UnclosedGroup { found: Token },

    #[error("unexpected {0} after complete expression")]
    TrailingInput(Token),

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedCharacter { offset: usize, ch: char },

    #[error("parentheses nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("expression has more than {0} relations")]
    TooManyTerms(usize),
}

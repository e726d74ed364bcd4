//! Boolean filter expression DSL.
//!
//! Syntax:
//!   field value             - equality (implicit `eq`)
//!   field eq value          - equality, also `==` or `=`
//!   field neq value         - inequality, also `!=`
//!   field gt|lt value       - ordering, also `>` / `<`
//!   field geq|leq value     - ordering, also `>=` / `<=`
//!   expr1 and expr2         - AND, also `&&`
//!   expr1 or expr2          - OR, also `||` (lower precedence than and)
//!   (expr)                  - grouping
//!
//! Values are integers (`42`), floats (`1.5`, `2e3`), bare words (`foo`) or
//! quoted strings (`"two words"`, `'42'`).

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::*;
pub use error::ParseError;
pub use eval::evaluate_filter;
pub use lexer::{Lexed, StrayChar, Token, Tokenizer, TokenizerOptions, tokenize};
pub use parser::{MAX_NESTING_DEPTH, MAX_TERMS, parse_filter};
pub use value::Value;

//! Lexer/tokenizer for the filter DSL.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_till, take_while};

/// Token types for the DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Logical operators
    And, // and, &&
    Or,  // or, ||

    // Relational operators
    Eq,  // eq, ==, =
    Neq, // neq, !=
    Gt,  // gt, >
    Lt,  // lt, <
    Geq, // geq, >=
    Leq, // leq, <=

    // Punctuation
    LParen, // (
    RParen, // )

    /// Field name, looked up in the field map at evaluation time.
    Field(String),
    /// Literal compared against a field's value.
    Value(Value),

    // End of input
    End,
}

impl Token {
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Token::Eq | Token::Neq | Token::Gt | Token::Lt | Token::Geq | Token::Leq
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Eq => write!(f, "eq"),
            Token::Neq => write!(f, "neq"),
            Token::Gt => write!(f, "gt"),
            Token::Lt => write!(f, "lt"),
            Token::Geq => write!(f, "geq"),
            Token::Leq => write!(f, "leq"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Field(name) => write!(f, "field `{}`", name),
            Token::Value(value) => write!(f, "{} literal {}", value.kind_name(), value),
            Token::End => write!(f, "end of input"),
        }
    }
}

/// Tokenizer behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenizerOptions {
    /// Match keywords (`and`, `GT`, `Neq`, ...) regardless of case.
    #[serde(default)]
    pub case_insensitive: bool,
}

/// A character that could not start any lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrayChar {
    pub offset: usize,
    pub ch: char,
}

/// Result of tokenizing a whole expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    /// Tokens, always terminated by exactly one `Token::End`.
    pub tokens: Vec<Token>,
    /// Set when the stream was cut short by an unrecognized character.
    pub stray: Option<StrayChar>,
}

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Raw lexeme before keyword and field/value classification.
#[derive(Debug)]
enum Lexeme<'i> {
    Symbol(Token),
    Quoted(&'i str),
    Word(&'i str),
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            '(' | ')' | '"' | '\'' | '=' | '!' | '<' | '>' | '&' | '|'
        )
}

/// Lex a symbolic operator or parenthesis.
fn lex_symbol(input: &mut &str) -> PResult<Token> {
    alt((
        // Multi-char operators first
        "&&".value(Token::And),
        "||".value(Token::Or),
        "==".value(Token::Eq),
        "!=".value(Token::Neq),
        ">=".value(Token::Geq),
        "<=".value(Token::Leq),
        // Single-char operators
        "=".value(Token::Eq),
        ">".value(Token::Gt),
        "<".value(Token::Lt),
        "(".value(Token::LParen),
        ")".value(Token::RParen),
    ))
    .parse_next(input)
}

/// Lex a single- or double-quoted string. No escapes.
fn lex_quoted<'i>(input: &mut &'i str) -> PResult<&'i str> {
    let open_quote: char = one_of(['\'', '"']).parse_next(input)?;
    let content = take_till(0.., open_quote).parse_next(input)?;
    literal(open_quote).parse_next(input)?;
    Ok(content)
}

/// Lex an unquoted word: keyword, field name or literal.
fn lex_word<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., is_word_char).parse_next(input)
}

/// Lex a single lexeme, or `None` at end of input.
fn lex_lexeme<'i>(input: &mut &'i str) -> PResult<Option<Lexeme<'i>>> {
    take_while(0.., char::is_whitespace).parse_next(input)?;

    if input.is_empty() {
        return Ok(None);
    }

    alt((
        lex_symbol.map(Lexeme::Symbol),
        lex_quoted.map(Lexeme::Quoted),
        lex_word.map(Lexeme::Word),
    ))
    .map(Some)
    .parse_next(input)
}

/// Parse a bare word as a number: integer unless it has a fraction or exponent.
///
/// Only words that start like a number qualify, so `inf` and `nan` stay words.
/// Floats that overflow to infinity (`1e999`) also stay words.
fn parse_number(word: &str) -> Option<Value> {
    let unsigned = word.strip_prefix(['+', '-']).unwrap_or(word);
    let unsigned = unsigned.strip_prefix('.').unwrap_or(unsigned);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if !word.contains(['.', 'e', 'E']) {
        if let Ok(n) = word.parse::<i64>() {
            return Some(Value::Integer(n));
        }
    }

    word.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(Value::Float)
}

/// Streaming tokenizer over an expression, driven by an explicit byte cursor.
///
/// A word is a field name unless it follows a field or a relational operator,
/// in which case it is a literal. Numbers and quoted strings are always
/// literals. Lexing never fails: an unrecognized character ends the stream
/// with `Token::End` and is reported through [`Tokenizer::stray`].
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
    options: TokenizerOptions,
    expect_value: bool,
    stray: Option<StrayChar>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, TokenizerOptions::default())
    }

    pub fn with_options(input: &'a str, options: TokenizerOptions) -> Self {
        Tokenizer {
            input,
            cursor: 0,
            options,
            expect_value: false,
            stray: None,
            finished: false,
        }
    }

    /// Rewind to the start of the input.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.expect_value = false;
        self.stray = None;
        self.finished = false;
    }

    /// Byte offset of the next unread character.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stray(&self) -> Option<StrayChar> {
        self.stray
    }

    /// Produce the next token. Returns `Token::End` forever once exhausted.
    pub fn next_token(&mut self) -> Token {
        if self.cursor >= self.input.len() || self.stray.is_some() {
            self.cursor = self.input.len();
            return Token::End;
        }

        let mut rest = &self.input[self.cursor..];
        match lex_lexeme(&mut rest) {
            Ok(Some(lexeme)) => {
                self.cursor = self.input.len() - rest.len();
                self.classify(lexeme)
            }
            Ok(None) => {
                self.cursor = self.input.len();
                Token::End
            }
            Err(_) => {
                let remaining = &self.input[self.cursor..];
                let trimmed = remaining.trim_start();
                let offset = self.cursor + (remaining.len() - trimmed.len());
                if let Some(ch) = trimmed.chars().next() {
                    tracing::trace!("Lexer: stray {:?} at offset {}", ch, offset);
                    self.stray = Some(StrayChar { offset, ch });
                }
                self.cursor = self.input.len();
                Token::End
            }
        }
    }

    /// Tokenize everything from the current cursor to the end.
    pub fn tokenize(mut self) -> Lexed {
        let tokens: Vec<Token> = self.by_ref().collect();
        Lexed {
            tokens,
            stray: self.stray,
        }
    }

    fn keyword(&self, word: &str) -> Option<Token> {
        let folded;
        let word = if self.options.case_insensitive {
            folded = word.to_ascii_lowercase();
            folded.as_str()
        } else {
            word
        };

        match word {
            "and" => Some(Token::And),
            "or" => Some(Token::Or),
            "eq" => Some(Token::Eq),
            "neq" => Some(Token::Neq),
            "gt" => Some(Token::Gt),
            "lt" => Some(Token::Lt),
            "geq" => Some(Token::Geq),
            "leq" => Some(Token::Leq),
            _ => None,
        }
    }

    fn classify(&mut self, lexeme: Lexeme<'_>) -> Token {
        let token = match lexeme {
            Lexeme::Symbol(token) => token,
            Lexeme::Quoted(text) => Token::Value(Value::String(text.to_string())),
            Lexeme::Word(word) => {
                if let Some(keyword) = self.keyword(word) {
                    keyword
                } else if let Some(number) = parse_number(word) {
                    Token::Value(number)
                } else if self.expect_value {
                    Token::Value(Value::String(word.to_string()))
                } else {
                    Token::Field(word.to_string())
                }
            }
        };

        self.expect_value = matches!(token, Token::Field(_)) || token.is_relational();
        token
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    /// Yields every token including a single trailing `Token::End`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token == Token::End {
            self.finished = true;
        }
        Some(token)
    }
}

/// Tokenize the entire input.
pub fn tokenize(input: &str, options: TokenizerOptions) -> Lexed {
    Tokenizer::with_options(input, options).tokenize()
}

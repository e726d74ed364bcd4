//! Parser for the filter DSL.
//!
//! Grammar (in rough EBNF):
//!
//! expression          = and_operation ("or" and_operation)*
//! and_operation       = relational_or_group ("and" relational_or_group)*
//! relational_or_group = "(" expression ")" | FIELD relop? VALUE
//! relop               = "eq" | "neq" | "gt" | "lt" | "geq" | "leq"
//!
//! A missing relop means `eq`. Both connectives are left-associative.

use super::ast::{LogicalOp, Node, RelationalOp};
use super::error::ParseError;
use super::lexer::{Lexed, StrayChar, Token, TokenizerOptions, tokenize};

/// Deepest parenthesis nesting accepted before the parser gives up.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Most relations one expression may hold. Chains build left-deep trees, so
/// this also bounds the tree depth that evaluation and drop recurse through.
pub const MAX_TERMS: usize = 1024;

/// Parser state.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    terms: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            terms: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::End)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::End);
        self.pos += 1;
        tok
    }

    /// Parse OR expression: and_operation ("or" and_operation)*
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_and_operation()?;

        while matches!(self.peek(), Token::Or) {
            self.advance(); // consume or
            let right = self.parse_and_operation()?;
            left = Node::logical(LogicalOp::Or, left, right);
        }

        Ok(left)
    }

    /// Parse AND expression: relational_or_group ("and" relational_or_group)*
    fn parse_and_operation(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_relational_or_group()?;

        while matches!(self.peek(), Token::And) {
            self.advance(); // consume and
            let right = self.parse_relational_or_group()?;
            left = Node::logical(LogicalOp::And, left, right);
        }

        Ok(left)
    }

    /// Parse a group or a single relation.
    fn parse_relational_or_group(&mut self) -> Result<Node, ParseError> {
        match self.advance() {
            Token::LParen => {
                if self.depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::NestingTooDeep(MAX_NESTING_DEPTH));
                }
                self.depth += 1;
                let inner = self.parse_expression()?;
                self.depth -= 1;

                match self.advance() {
                    Token::RParen => Ok(inner),
                    found => Err(ParseError::UnclosedGroup { found }),
                }
            }
            Token::Field(field) => self.parse_relation(field),
            found => Err(ParseError::UnexpectedToken {
                expected: "field name or '('",
                found,
            }),
        }
    }

    /// Parse the rest of a relation after its field: relop? VALUE
    fn parse_relation(&mut self, field: String) -> Result<Node, ParseError> {
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(ParseError::TooManyTerms(MAX_TERMS));
        }

        let op = match self.peek() {
            Token::Eq => Some(RelationalOp::Eq),
            Token::Neq => Some(RelationalOp::Neq),
            Token::Gt => Some(RelationalOp::Gt),
            Token::Lt => Some(RelationalOp::Lt),
            Token::Geq => Some(RelationalOp::Geq),
            Token::Leq => Some(RelationalOp::Leq),
            _ => None,
        };

        let op = match op {
            Some(op) => {
                self.advance(); // consume operator
                op
            }
            None => RelationalOp::Eq,
        };

        match self.advance() {
            Token::Value(value) => Ok(Node::Relational { op, field, value }),
            found => Err(ParseError::MissingValue { field, found }),
        }
    }
}

/// Parse a filter expression into a tree.
///
/// Returns `Ok(None)` for an empty (or all-whitespace) expression.
pub fn parse_filter(input: &str, options: TokenizerOptions) -> Result<Option<Node>, ParseError> {
    let Lexed { tokens, stray } = tokenize(input, options);
    if let Some(StrayChar { offset, ch }) = stray {
        return Err(ParseError::UnexpectedCharacter { offset, ch });
    }

    let mut parser = Parser::new(tokens);
    if matches!(parser.peek(), Token::End) {
        return Ok(None);
    }

    let node = parser.parse_expression()?;

    // Ensure we consumed all tokens
    match parser.advance() {
        Token::End => Ok(Some(node)),
        found => Err(ParseError::TrailingInput(found)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Value;

    fn parse(input: &str) -> Result<Option<Node>, ParseError> {
        parse_filter(input, TokenizerOptions::default())
    }

    fn rel(op: RelationalOp, field: &str, value: impl Into<Value>) -> Node {
        Node::relational(op, field, value)
    }

    #[test]
    fn test_implicit_equality() {
        let ast = parse("field_a foo").unwrap();
        assert_eq!(ast, Some(rel(RelationalOp::Eq, "field_a", "foo")));
        assert_eq!(parse("field_a eq foo").unwrap(), ast);
        assert_eq!(parse("field_a == foo").unwrap(), ast);
    }

    #[test]
    fn test_relational_operators() {
        let cases = [
            ("a neq 1", RelationalOp::Neq),
            ("a gt 1", RelationalOp::Gt),
            ("a lt 1", RelationalOp::Lt),
            ("a geq 1", RelationalOp::Geq),
            ("a leq 1", RelationalOp::Leq),
        ];
        for (input, op) in cases {
            assert_eq!(parse(input).unwrap(), Some(rel(op, "a", 1)), "{input}");
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse("a 1 or b 2 and c 3").unwrap().unwrap();
        assert_eq!(
            ast,
            Node::logical(
                LogicalOp::Or,
                rel(RelationalOp::Eq, "a", 1),
                Node::logical(
                    LogicalOp::And,
                    rel(RelationalOp::Eq, "b", 2),
                    rel(RelationalOp::Eq, "c", 3),
                ),
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let ast = parse("(a 1 or b 2) and c 3").unwrap().unwrap();
        assert!(matches!(
            ast,
            Node::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
        assert_eq!(ast.to_string(), "((a eq 1 or b eq 2) and c eq 3)");
    }

    #[test]
    fn test_left_associative() {
        let ast = parse("a 1 and b 2 and c 3").unwrap().unwrap();
        assert_eq!(ast.to_string(), "((a eq 1 and b eq 2) and c eq 3)");
    }

    #[test]
    fn test_redundant_groups_collapse() {
        let ast = parse("((field_a foo))").unwrap();
        assert_eq!(ast, Some(rel(RelationalOp::Eq, "field_a", "foo")));
    }

    #[test]
    fn test_display_round_trip() {
        let source = "field_a foo and (field_b gt 1 or field_c neq 'say \"hi\"') or d leq 2.0";
        let ast = parse(source).unwrap().unwrap();
        let reparsed = parse(&ast.to_string()).unwrap().unwrap();
        assert_eq!(ast, reparsed);
    }

    #[test]
    fn test_display_round_trip_of_huge_float() {
        let ast = parse("a 1e999 or b 1e300").unwrap().unwrap();
        let reparsed = parse(&ast.to_string()).unwrap().unwrap();
        assert_eq!(ast, reparsed);
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_unclosed_group() {
        let err = parse("(field_a foo or field_b bar").unwrap_err();
        assert_eq!(err, ParseError::UnclosedGroup { found: Token::End });
    }

    #[test]
    fn test_stray_closing_paren() {
        let err = parse("field_a foo)").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput(Token::RParen));
    }

    #[test]
    fn test_dangling_field() {
        let err = parse("field_a foo field_b").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput(Token::Field("field_b".into())));
    }

    #[test]
    fn test_missing_value() {
        for input in ["field_a", "field_a and b 1", "(field_a)", "field_a gt", "a gt or b 1"] {
            assert!(
                matches!(parse(input), Err(ParseError::MissingValue { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn test_missing_operand() {
        assert!(matches!(
            parse("a 1 and"),
            Err(ParseError::UnexpectedToken { found: Token::End, .. })
        ));
        assert!(matches!(
            parse("or a 1"),
            Err(ParseError::UnexpectedToken { found: Token::Or, .. })
        ));
        assert!(matches!(
            parse("()"),
            Err(ParseError::UnexpectedToken { found: Token::RParen, .. })
        ));
    }

    #[test]
    fn test_unexpected_character() {
        let err = parse("field_a foo &").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedCharacter { offset: 12, ch: '&' });
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}a 1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse(&ok).is_ok());

        let deep = format!(
            "{}a 1{}",
            "(".repeat(MAX_NESTING_DEPTH + 1),
            ")".repeat(MAX_NESTING_DEPTH + 1)
        );
        assert_eq!(
            parse(&deep).unwrap_err(),
            ParseError::NestingTooDeep(MAX_NESTING_DEPTH)
        );
    }

    #[test]
    fn test_term_limit() {
        for connective in [" and ", " or "] {
            let at_limit = vec!["a 1"; MAX_TERMS].join(connective);
            let ast = parse(&at_limit).unwrap().unwrap();
            assert_eq!(ast.leaf_count(), MAX_TERMS);

            let long_chain = vec!["a 1"; 100_000].join(connective);
            assert_eq!(
                parse(&long_chain).unwrap_err(),
                ParseError::TooManyTerms(MAX_TERMS)
            );
        }
    }
}

//! AST types for the filter DSL.

use super::value::Value;
use std::fmt;

/// A node of the expression tree.
///
/// Parenthesized groups only exist while parsing; the parser returns the
/// inner node, so the finished tree holds logical and relational nodes only.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Boolean combination: `left and right`, `left or right`
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Leaf comparison: `field gt 1`, `field foo`
    Relational {
        op: RelationalOp,
        field: String,
        value: Value,
    },
}

/// Logical connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOp {
    Eq,  // eq (implicit)
    Neq, // neq
    Gt,  // gt
    Lt,  // lt
    Geq, // geq
    Leq, // leq
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for RelationalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalOp::Eq => write!(f, "eq"),
            RelationalOp::Neq => write!(f, "neq"),
            RelationalOp::Gt => write!(f, "gt"),
            RelationalOp::Lt => write!(f, "lt"),
            RelationalOp::Geq => write!(f, "geq"),
            RelationalOp::Leq => write!(f, "leq"),
        }
    }
}

/// Renders a fully parenthesized expression that parses back to the same tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Logical { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Node::Relational { op, field, value } => write!(f, "{} {} {}", field, op, value),
        }
    }
}

impl Node {
    pub fn logical(op: LogicalOp, left: Node, right: Node) -> Self {
        Node::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn relational(op: RelationalOp, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Node::Relational {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Number of relational leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Logical { left, right, .. } => left.leaf_count() + right.leaf_count(),
            Node::Relational { .. } => 1,
        }
    }

    /// Height of the tree; a single relation has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Node::Logical { left, right, .. } => 1 + left.depth().max(right.depth()),
            Node::Relational { .. } => 1,
        }
    }
}

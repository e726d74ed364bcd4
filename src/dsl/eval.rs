//! Evaluator for the filter DSL tree.

use super::ast::{LogicalOp, Node, RelationalOp};
use super::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Evaluate a tree against a set of field values.
///
/// A relation on a field missing from `fields` is false.
pub fn evaluate_filter(node: &Node, fields: &HashMap<String, Value>) -> bool {
    match node {
        Node::Logical { op, left, right } => match op {
            LogicalOp::And => evaluate_filter(left, fields) && evaluate_filter(right, fields),
            LogicalOp::Or => evaluate_filter(left, fields) || evaluate_filter(right, fields),
        },

        Node::Relational { op, field, value } => match fields.get(field) {
            None => false,
            Some(actual) => compare(*op, actual, value),
        },
    }
}

/// Apply a relational operator to a field value and a literal.
fn compare(op: RelationalOp, actual: &Value, expected: &Value) -> bool {
    let ordering = actual.compare(expected);
    match op {
        RelationalOp::Eq => ordering == Some(Ordering::Equal),
        RelationalOp::Neq => ordering != Some(Ordering::Equal),
        RelationalOp::Gt => ordering == Some(Ordering::Greater),
        RelationalOp::Lt => ordering == Some(Ordering::Less),
        RelationalOp::Geq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        RelationalOp::Leq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

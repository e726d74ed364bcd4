//! Reusable compiled filter.
//!
//! [`Evaluator`] owns one [`ExpressionTree`] that is rebuilt from text and then
//! evaluated against any number of field maps. An empty or unbuilt tree
//! accepts everything; a relation on a missing field rejects.

use crate::dsl::{Node, ParseError, TokenizerOptions, Value, evaluate_filter, parse_filter};
use std::collections::HashMap;

/// Parsed expression; `None` root means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionTree {
    root: Option<Node>,
}

impl ExpressionTree {
    pub fn parse(expression: &str, options: TokenizerOptions) -> Result<Self, ParseError> {
        let root = parse_filter(expression, options)?;
        Ok(ExpressionTree { root })
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn evaluate(&self, fields: &HashMap<String, Value>) -> bool {
        match &self.root {
            None => true,
            Some(node) => evaluate_filter(node, fields),
        }
    }
}

/// Builds and evaluates filter expressions.
///
/// `build_expression_tree` takes `&mut self`, so a shared `&Evaluator` can be
/// evaluated from many threads while rebuilding needs exclusive access.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: TokenizerOptions,
    tree: ExpressionTree,
    last_error: Option<ParseError>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TokenizerOptions) -> Self {
        Evaluator {
            options,
            ..Self::default()
        }
    }

    /// Compile `expression`, replacing the current tree.
    ///
    /// Returns `false` on a syntax error, leaving the tree empty. The error is
    /// kept in [`Evaluator::last_error`].
    pub fn build_expression_tree(&mut self, expression: &str) -> bool {
        match ExpressionTree::parse(expression, self.options) {
            Ok(tree) => {
                if let Some(root) = tree.root() {
                    tracing::debug!("Filter: built {} ({} relations)", root, root.leaf_count());
                }
                self.tree = tree;
                self.last_error = None;
                true
            }
            Err(err) => {
                tracing::warn!("Filter: rejected expression {:?}: {}", expression, err);
                self.tree = ExpressionTree::default();
                self.last_error = Some(err);
                false
            }
        }
    }

    /// True while a non-empty tree is built.
    pub fn is_activated(&self) -> bool {
        !self.tree.is_empty()
    }

    pub fn evaluate(&self, fields: &HashMap<String, Value>) -> bool {
        self.tree.evaluate(fields)
    }

    pub fn tree(&self) -> &ExpressionTree {
        &self.tree
    }

    /// Error from the most recent build, if it failed.
    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_default_is_inactive() {
        let evaluator = Evaluator::new();
        assert!(!evaluator.is_activated());
        assert!(evaluator.last_error().is_none());
        assert!(evaluator.evaluate(&fields(&[])));
    }

    #[test]
    fn test_failed_build_clears_previous_tree() {
        let mut evaluator = Evaluator::new();
        assert!(evaluator.build_expression_tree("kind foo"));
        assert!(evaluator.is_activated());
        assert!(!evaluator.evaluate(&fields(&[("kind", "bar".into())])));

        assert!(!evaluator.build_expression_tree("kind foo and"));
        assert!(!evaluator.is_activated());
        assert!(evaluator.tree().is_empty());
        assert!(evaluator.last_error().is_some());
        assert!(evaluator.evaluate(&fields(&[("kind", "bar".into())])));
    }

    #[test]
    fn test_rebuild_after_failure() {
        let mut evaluator = Evaluator::new();
        assert!(!evaluator.build_expression_tree("(kind foo"));
        assert!(evaluator.build_expression_tree("kind foo"));
        assert!(evaluator.is_activated());
        assert!(evaluator.last_error().is_none());
    }

    #[test]
    fn test_empty_build_deactivates() {
        let mut evaluator = Evaluator::new();
        assert!(evaluator.build_expression_tree("kind foo"));
        assert!(evaluator.build_expression_tree(""));
        assert!(!evaluator.is_activated());
        assert!(evaluator.evaluate(&fields(&[])));
    }

    #[test]
    fn test_case_insensitive_options() {
        let mut strict = Evaluator::new();
        assert!(!strict.build_expression_tree("a 1 AND b 2"));

        let mut relaxed = Evaluator::with_options(TokenizerOptions {
            case_insensitive: true,
        });
        assert!(relaxed.build_expression_tree("a 1 AND b GT 2"));
        assert!(relaxed.evaluate(&fields(&[("a", 1.into()), ("b", 3.into())])));
    }
}

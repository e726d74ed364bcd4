//! Compile boolean filter expressions such as
//! `field_a foo and (field_b gt 1 or field_c neq bar)` once, then evaluate
//! them against many maps of field values.
//!
//! ```
//! use booleval::{Evaluator, Value};
//! use std::collections::HashMap;
//!
//! let mut evaluator = Evaluator::new();
//! assert!(evaluator.build_expression_tree("field_a foo and field_b gt 1"));
//!
//! let fields: HashMap<String, Value> = [
//!     ("field_a".to_string(), Value::from("foo")),
//!     ("field_b".to_string(), Value::from(2)),
//! ]
//! .into();
//! assert!(evaluator.evaluate(&fields));
//! ```

pub mod config;
pub mod dsl;
pub mod evaluator;
pub mod records;

pub use dsl::{Node, ParseError, TokenizerOptions, Value};
pub use evaluator::{Evaluator, ExpressionTree};

pub mod parser;
pub mod tree;

pub use parser::parse_condition;
pub use tree::{CardCondition, CompoundCondition, Condition, Location, Operator};

use thiserror::Error;

/// Malformed conditions. These are configuration errors and abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Unknown comparison operator '{0}'")]
    UnknownOperator(String),
    #[error("Unexpected '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("Empty condition")]
    EmptyExpression,
    #[error("Missing card name at position {0}")]
    MissingCardName(usize),
    #[error("Invalid quantity '{0}'")]
    InvalidQuantity(String),
    #[error("Condition trees differ in shape: {0}")]
    ShapeMismatch(String),
}

//! Error types for filter editing

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Operator '{operator}' is not available for field '{field}'")]
    OperatorNotAllowed { field: String, operator: String },

    #[error("No filter rule with id {0}")]
    UnknownRule(String),

    #[error("Invalid filter expression '{0}', expected FIELD:OPERATOR:VALUE")]
    InvalidExpression(String),
}

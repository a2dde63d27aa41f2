//! Error types for payload normalization

use thiserror::Error;

/// A backend record did not have the shape the canonical model needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {value}")]
    InvalidFieldValue { field: String, value: String },

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Invalid date '{0}', expected dd/MM/yyyy[ HH:mm]")]
    InvalidDate(String),

    #[error("Unexpected record shape: {0}")]
    UnexpectedShape(String),
}

impl NormalizationError {
    pub(crate) fn invalid(field: &str, value: impl ToString) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizationError>;

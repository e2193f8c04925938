use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DraftField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unavailable,
    TransientRead,
    NoSigner,
    Validation,
    Submission,
    Superseded,
}

/// Serializable error report handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: DraftField },
    #[error("{field} is not a valid address: {value:?}")]
    InvalidAddress { field: DraftField, value: String },
    #[error("{field} must be an unsigned integer, got {value:?}")]
    NotNumeric { field: DraftField, value: String },
    #[error("{field} must not be negative")]
    Negative { field: DraftField },
    #[error("{field} must be greater than zero")]
    NotPositive { field: DraftField },
}

impl ValidationError {
    pub fn field(&self) -> DraftField {
        match self {
            Self::Missing { field }
            | Self::InvalidAddress { field, .. }
            | Self::NotNumeric { field, .. }
            | Self::Negative { field }
            | Self::NotPositive { field } => *field,
        }
    }
}

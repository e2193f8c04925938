use shared::error::{ApiError, ErrorCode, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("ledger unavailable: {0:#}")]
    Unavailable(anyhow::Error),
    #[error("failed to read contract {index}: {reason:#}")]
    TransientRead { index: u64, reason: anyhow::Error },
    #[error("no active signing identity")]
    NoSigner,
    #[error("invalid contract draft: {0}")]
    Validation(#[from] ValidationError),
    #[error("submission failed: {0:#}")]
    Submission(anyhow::Error),
    #[error("refresh superseded by a newer one")]
    Superseded,
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::TransientRead { .. } => ErrorCode::TransientRead,
            Self::NoSigner => ErrorCode::NoSigner,
            Self::Validation(_) => ErrorCode::Validation,
            Self::Submission(_) => ErrorCode::Submission,
            Self::Superseded => ErrorCode::Superseded,
        }
    }
}

impl From<&RegistryError> for ApiError {
    fn from(value: &RegistryError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

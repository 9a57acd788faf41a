//! # Commerce Errors
//!
//! One error type for every service operation. Each variant keeps its
//! source error; [`CommerceError::kind`] is what callers branch on.

use shepherd_core::{CoreError, ErrorKind, ValidationError};
use shepherd_db::DbError;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Webhook signature missing or wrong.
    #[error("Webhook signature rejected: {0}")]
    Signature(String),
}

impl CommerceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::Core(e) => e.kind(),
            CommerceError::Db(e) => e.kind(),
            CommerceError::Gateway(_) => ErrorKind::Gateway,
            CommerceError::Signature(_) => ErrorKind::Signature,
        }
    }
}

impl From<ValidationError> for CommerceError {
    fn from(err: ValidationError) -> Self {
        CommerceError::Core(CoreError::Validation(err))
    }
}

pub type CommerceResult<T> = Result<T, CommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passes_through_layers() {
        let err: CommerceError = ValidationError::Required {
            field: "purpose".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: CommerceError = DbError::not_found("Order", "o1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: CommerceError = GatewayError::NotConfigured.into();
        assert_eq!(err.kind(), ErrorKind::Gateway);
        assert!(err.kind().is_retryable());

        assert_eq!(
            CommerceError::Signature("missing".into()).kind(),
            ErrorKind::Signature
        );
    }
}

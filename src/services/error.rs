use crate::error::AppError;
use crate::services::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Email verification failed: {0}")]
    Verifier(anyhow::Error),

    #[error("Challenge service error: {0}")]
    Challenge(anyhow::Error),

    /// Unknown, expired, or already-consumed approval token. Deliberately a
    /// single opaque case so callers cannot probe the token space.
    #[error("Invalid request")]
    InvalidApproval,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidApproval => {
                AppError::NotFound(anyhow::anyhow!("Invalid request"))
            }
            ServiceError::Store(e) => AppError::InternalError(anyhow::anyhow!(e)),
            ServiceError::Verifier(e) => AppError::InternalError(e),
            ServiceError::Challenge(e) => AppError::InternalError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

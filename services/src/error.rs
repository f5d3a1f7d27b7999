use sea_orm::DbErr;
use thiserror::Error;

/// Error taxonomy for the core workflows. The HTTP layer maps each variant to
/// a status code; unclassified database and storage failures surface as 500s
/// with the message withheld from clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input; the message names the offending field.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Role mismatch or access to another student's resource.
    #[error("{0}")]
    Forbidden(String),

    /// Capacity exceeded or duplicate same-day attendance.
    #[error("{0}")]
    Conflict(String),

    /// A lifecycle rule was violated (event cancelled, registration closed,
    /// request not in the required state).
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Db(#[from] DbErr),

    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        ServiceError::InvalidState(msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        ServiceError::PayloadTooLarge(msg.into())
    }
}

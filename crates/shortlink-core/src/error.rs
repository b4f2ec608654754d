use crate::validation::UrlValidationError;
use thiserror::Error;

/// Result type for URL service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors reported by a [`Repository`](crate::Repository).
///
/// `Conflict` and `NotFound` are part of the storage contract; every other
/// variant describes a backend failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("alias already exists: {0}")]
    Conflict(String),
    #[error("alias not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage migration failed: {0}")]
    Migration(String),
}

/// Errors reported by an [`AdminChecker`](crate::AdminChecker).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminCheckError {
    #[error("admin service unavailable: {0}")]
    Unavailable(String),
    #[error("admin check timed out: {0}")]
    Timeout(String),
    #[error("admin check rejected: {0}")]
    Rejected(String),
}

/// The error taxonomy of the URL service.
///
/// Validation and authorization failures are terminal. Unexpected collaborator
/// failures collapse into [`ServiceError::Internal`], whose message is meant
/// for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid URL format")]
    InvalidUrl,
    #[error("only http and https schemes are allowed")]
    InvalidScheme,
    #[error("alias already exists: {0}")]
    AliasExists(String),
    #[error("url not found")]
    UrlNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("failed to generate alias: {0}")]
    AliasGenerationFailed(String),
    #[error("stored url is invalid: {0}")]
    InvalidStoredUrl(UrlValidationError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<UrlValidationError> for ServiceError {
    fn from(value: UrlValidationError) -> Self {
        match value {
            UrlValidationError::InvalidFormat => Self::InvalidUrl,
            UrlValidationError::InvalidScheme => Self::InvalidScheme,
        }
    }
}

impl From<AdminCheckError> for ServiceError {
    fn from(value: AdminCheckError) -> Self {
        Self::Internal(format!("failed to check admin status: {value}"))
    }
}

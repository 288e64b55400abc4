use serde::Serialize;
use thiserror::Error;

use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::UserIdError;
use crate::domain::user::errors::UsernameError;
use crate::domain::validation::ValidationErrors;

/// Stable classification of an [`AuthError`].
///
/// The HTTP layer and any other caller branch on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationFailed,
    InvalidCredentials,
    InvalidToken,
    Conflict,
    Expired,
    NotFound,
    Internal,
}

/// Top-level error for every authentication and session operation.
///
/// `Internal` carries the underlying failure for logging only; it must not be
/// shown to external callers.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Validation failed")]
    ValidationFailed(ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Token has expired")]
    Expired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::InvalidToken => ErrorKind::InvalidToken,
            AuthError::Conflict(_) => ErrorKind::Conflict,
            AuthError::Expired => ErrorKind::Expired,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn internal(err: impl ToString) -> Self {
        AuthError::Internal(err.to_string())
    }

    /// Field-level errors, present only for `ValidationFailed`.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AuthError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::ValidationFailed(errors)
    }
}

impl From<UsernameError> for AuthError {
    fn from(err: UsernameError) -> Self {
        AuthError::ValidationFailed(ValidationErrors::single("username", err.to_string()))
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::ValidationFailed(ValidationErrors::single("email", err.to_string()))
    }
}

// A stored row that no longer parses is a data integrity problem, not caller input.
impl From<UserIdError> for AuthError {
    fn from(err: UserIdError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::Expired => AuthError::Expired,
            auth::JwtError::Malformed(_) | auth::JwtError::InvalidSignature => {
                AuthError::InvalidToken
            }
            auth::JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

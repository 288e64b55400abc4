pub mod password_reset;
pub mod refresh_token;
pub mod user;

pub use password_reset::PostgresPasswordResetRepository;
pub use refresh_token::PostgresRefreshTokenRepository;
pub use user::PostgresUserRepository;

use crate::domain::errors::AuthError;

/// Unclassified store failure. The text is kept for logs only.
pub(crate) fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::Internal(format!("Database error: {}", e))
}

/// Name of the unique constraint a write violated, if that is why it failed.
pub(crate) fn violated_unique_constraint(e: &sqlx::Error) -> Option<String> {
    let db_err = e.as_database_error()?;
    if db_err.is_unique_violation() {
        db_err.constraint().map(str::to_string)
    } else {
        None
    }
}

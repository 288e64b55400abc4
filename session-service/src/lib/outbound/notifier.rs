use async_trait::async_trait;
use auth::OpaqueToken;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::AuthError;
use crate::domain::session::ports::PasswordResetNotifier;
use crate::domain::user::models::User;

/// Records that a reset was issued without a delivery channel attached.
///
/// The secret itself is never written to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingResetNotifier;

impl TracingResetNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PasswordResetNotifier for TracingResetNotifier {
    async fn deliver(
        &self,
        user: &User,
        _secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        tracing::info!(
            user_id = %user.id,
            expires_at = %expires_at,
            "Password reset issued"
        );
        Ok(())
    }
}

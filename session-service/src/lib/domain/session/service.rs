use std::sync::Arc;

use async_trait::async_trait;
use auth::OpaqueToken;
use auth::PasswordHasher;
use auth::PasswordPolicy;
use chrono::Utc;

use crate::domain::errors::AuthError;
use crate::domain::session::models::AuthenticatedUser;
use crate::domain::session::models::PurgeSummary;
use crate::domain::session::models::RegisterCommand;
use crate::domain::session::models::SessionSettings;
use crate::domain::session::models::TokenPair;
use crate::domain::session::ports::AccessTokenCodec;
use crate::domain::session::ports::AuthServicePort;
use crate::domain::session::ports::CredentialHasher;
use crate::domain::session::ports::PasswordResetNotifier;
use crate::domain::session::ports::PasswordResetRepository;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::service::hash_password;
use crate::domain::user::service::verify_password;
use crate::domain::validation::Validator;

/// Authentication and session service.
///
/// Holds no mutable state: every decision re-reads the stores, so concurrent
/// requests only interact through store rows.
pub struct AuthService<UR, TR, PR, RN, CR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PR: PasswordResetRepository,
    RN: PasswordResetNotifier,
    CR: CredentialHasher + AccessTokenCodec,
{
    users: Arc<UR>,
    refresh_tokens: Arc<TR>,
    password_resets: Arc<PR>,
    reset_notifier: Arc<RN>,
    credentials: Arc<CR>,
    settings: SessionSettings,
    password_policy: PasswordPolicy,
}

impl<UR, TR, PR, RN, CR> AuthService<UR, TR, PR, RN, CR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PR: PasswordResetRepository,
    RN: PasswordResetNotifier,
    CR: CredentialHasher + AccessTokenCodec,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence
    /// * `refresh_tokens` - Refresh token persistence
    /// * `password_resets` - Reset token persistence
    /// * `reset_notifier` - Out-of-band delivery of reset secrets
    /// * `credentials` - Password hasher and access token codec
    /// * `settings` - Token lifetimes and reuse policy
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<TR>,
        password_resets: Arc<PR>,
        reset_notifier: Arc<RN>,
        credentials: Arc<CR>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            password_resets,
            reset_notifier,
            credentials,
            settings,
            password_policy: PasswordPolicy::default(),
        }
    }

    fn check_password_policy(&self, password: &str) -> Result<(), AuthError> {
        Validator::with_password_policy(self.password_policy)
            .password(password)
            .finish()
            .map_err(AuthError::from)
    }

    async fn issue_token_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        let access_token = self.credentials.issue(&user_id)?;

        let secret = OpaqueToken::generate();
        let expires_at = Utc::now() + self.settings.refresh_token_ttl;
        let record = self
            .refresh_tokens
            .create(&user_id, &secret, expires_at)
            .await?;

        Ok(TokenPair {
            user_id,
            access_token,
            refresh_token: secret,
            refresh_expires_at: record.expires_at,
        })
    }

    /// The caller still gets `InvalidToken` if the cascade itself fails.
    async fn handle_reuse(&self, user_id: &UserId) {
        if !self.settings.revoke_all_on_reuse {
            return;
        }

        match self.refresh_tokens.revoke_all_for_user(user_id).await {
            Ok(revoked) => tracing::warn!(
                user_id = %user_id,
                revoked,
                "Revoked all refresh tokens after reuse"
            ),
            Err(e) => tracing::error!(
                user_id = %user_id,
                error = %e,
                "Failed to revoke refresh tokens after reuse"
            ),
        }
    }
}

#[async_trait]
impl<UR, TR, PR, RN, CR> AuthServicePort for AuthService<UR, TR, PR, RN, CR>
where
    UR: UserRepository,
    TR: RefreshTokenRepository,
    PR: PasswordResetRepository,
    RN: PasswordResetNotifier,
    CR: CredentialHasher + AccessTokenCodec,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError> {
        self.check_password_policy(&command.password)?;

        let password_hash = hash_password(&self.credentials, command.password).await?;

        // The unique constraints decide races between concurrent registrations.
        let user = self
            .users
            .create(NewUser {
                email: command.email,
                username: command.username,
                display_name: command.display_name,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    async fn login(&self, email: &EmailAddress, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            // Pay the same Argon2 cost as a known email.
            verify_password(
                &self.credentials,
                password.to_string(),
                PasswordHasher::DECOY_HASH.to_string(),
            )
            .await?;
            tracing::debug!("Login rejected for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = verify_password(
            &self.credentials,
            password.to_string(),
            user.password_hash.clone(),
        )
        .await?;
        if !matches {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_token_pair(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &OpaqueToken) -> Result<TokenPair, AuthError> {
        let record = self
            .refresh_tokens
            .find_by_hash(&refresh_token.digest())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.is_revoked() {
            tracing::warn!(
                token_id = %record.id,
                user_id = %record.user_id,
                "Refresh token reuse detected"
            );
            self.handle_reuse(&record.user_id).await;
            return Err(AuthError::InvalidToken);
        }

        let now = Utc::now();
        if record.is_expired_at(now) {
            return Err(AuthError::InvalidToken);
        }

        // Signing first means a failure here leaves the presented token live.
        let access_token = self.credentials.issue(&record.user_id)?;

        let successor = OpaqueToken::generate();
        let expires_at = now + self.settings.refresh_token_ttl;
        let Some(rotated) = self
            .refresh_tokens
            .rotate(&record.id, &successor, expires_at)
            .await?
        else {
            tracing::warn!(
                token_id = %record.id,
                user_id = %record.user_id,
                "Refresh token rotated concurrently"
            );
            self.handle_reuse(&record.user_id).await;
            return Err(AuthError::InvalidToken);
        };

        tracing::info!(
            user_id = %record.user_id,
            revoked_token_id = %record.id,
            token_id = %rotated.id,
            "Refresh token rotated"
        );

        Ok(TokenPair {
            user_id: record.user_id,
            access_token,
            refresh_token: successor,
            refresh_expires_at: rotated.expires_at,
        })
    }

    async fn logout(&self, refresh_token: &OpaqueToken) -> Result<(), AuthError> {
        let Some(record) = self
            .refresh_tokens
            .find_by_hash(&refresh_token.digest())
            .await?
        else {
            return Ok(());
        };

        match self.refresh_tokens.revoke(&record.id).await {
            Ok(()) | Err(AuthError::NotFound(_)) => {
                tracing::info!(user_id = %record.user_id, token_id = %record.id, "User logged out");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, AuthError> {
        let user_id = self.credentials.verify_token(access_token)?;
        Ok(AuthenticatedUser { user_id })
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let secret = OpaqueToken::generate();
        let expires_at = Utc::now() + self.settings.password_reset_ttl;
        let record = self
            .password_resets
            .create(&user.id, &secret, expires_at)
            .await?;

        if let Err(e) = self
            .reset_notifier
            .deliver(&user, &secret, record.expires_at)
            .await
        {
            tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to deliver password reset token"
            );
        }

        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        reset_token: &OpaqueToken,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.check_password_policy(new_password)?;

        let record = self
            .password_resets
            .find_by_hash(&reset_token.digest())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !record.is_usable_at(Utc::now()) {
            return Err(AuthError::InvalidToken);
        }

        let password_hash = hash_password(&self.credentials, new_password.to_string()).await?;

        if !self.password_resets.redeem(&record.id, &password_hash).await? {
            return Err(AuthError::InvalidToken);
        }

        tracing::info!(user_id = %record.user_id, "Password reset completed");

        Ok(())
    }

    async fn purge_expired(&self) -> Result<PurgeSummary, AuthError> {
        let refresh_tokens = self.refresh_tokens.delete_expired().await?;
        let password_reset_tokens = self.password_resets.delete_expired().await?;

        Ok(PurgeSummary {
            refresh_tokens,
            password_reset_tokens,
        })
    }
}

use async_trait::async_trait;
use auth::OpaqueToken;
use auth::TokenDigest;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::AuthError;
use crate::domain::session::models::AccessToken;
use crate::domain::session::models::AuthenticatedUser;
use crate::domain::session::models::PasswordResetToken;
use crate::domain::session::models::PasswordResetTokenId;
use crate::domain::session::models::PurgeSummary;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::models::RegisterCommand;
use crate::domain::session::models::TokenPair;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for the authentication and session state machine.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Create a user account.
    ///
    /// # Errors
    /// * `ValidationFailed` - Password violates the policy
    /// * `Conflict` - Email or username already exists
    /// * `Internal` - Store or hashing failure
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError>;

    /// Exchange credentials for a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Internal` - Store, hashing or signing failure
    async fn login(&self, email: &EmailAddress, password: &str) -> Result<TokenPair, AuthError>;

    /// Rotate a refresh token: revoke the presented one and issue its successor.
    ///
    /// # Errors
    /// * `InvalidToken` - Unknown, revoked, expired, or lost a concurrent rotation
    /// * `Internal` - Store or signing failure
    async fn refresh(&self, refresh_token: &OpaqueToken) -> Result<TokenPair, AuthError>;

    /// Revoke a refresh token. Unknown or already-revoked tokens succeed.
    async fn logout(&self, refresh_token: &OpaqueToken) -> Result<(), AuthError>;

    /// Resolve the identity behind an access token.
    ///
    /// # Errors
    /// * `Expired` - Token lifetime has elapsed
    /// * `InvalidToken` - Signature mismatch or unparseable token
    async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Issue a reset secret to the owner of `email`, if there is one.
    ///
    /// Succeeds for unknown emails so callers cannot probe for accounts.
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Redeem a reset secret, replace the password and end every session.
    ///
    /// # Errors
    /// * `ValidationFailed` - New password violates the policy
    /// * `InvalidToken` - Unknown, used, or expired reset secret
    async fn confirm_password_reset(
        &self,
        reset_token: &OpaqueToken,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Delete expired refresh and reset tokens.
    async fn purge_expired(&self) -> Result<PurgeSummary, AuthError>;
}

/// Persistence for refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Store a new token. Only `secret.digest()` is persisted.
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError>;

    async fn find_by_hash(&self, token_hash: &TokenDigest)
        -> Result<Option<RefreshToken>, AuthError>;

    /// Mark a token revoked. Revoking an already-revoked token is a no-op.
    ///
    /// # Errors
    /// * `NotFound` - No token with this id
    async fn revoke(&self, id: &RefreshTokenId) -> Result<(), AuthError>;

    /// Atomically revoke `id` and create its successor for the same user.
    ///
    /// The revocation is a compare-and-swap on "still usable": of two concurrent
    /// rotations of one token exactly one gets `Some`.
    ///
    /// # Returns
    /// The successor, or `None` if `id` was no longer usable
    async fn rotate(
        &self,
        id: &RefreshTokenId,
        successor: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AuthError>;

    /// Revoke every live token of a user, returning how many were revoked.
    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, AuthError>;

    /// Delete tokens past their expiry, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, AuthError>;
}

/// Persistence for password reset tokens.
#[async_trait]
pub trait PasswordResetRepository: Send + Sync + 'static {
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AuthError>;

    async fn find_by_hash(
        &self,
        token_hash: &TokenDigest,
    ) -> Result<Option<PasswordResetToken>, AuthError>;

    /// In one transaction: mark the token used if it is still usable, store the
    /// new password hash, and revoke all of the user's refresh tokens.
    ///
    /// # Returns
    /// `false` if the token was already used or expired
    async fn redeem(
        &self,
        id: &PasswordResetTokenId,
        password_hash: &str,
    ) -> Result<bool, AuthError>;

    async fn delete_expired(&self) -> Result<u64, AuthError>;
}

/// Delivers a password reset secret to the account owner out of band.
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync + 'static {
    async fn deliver(
        &self,
        user: &User,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;
}

/// One-way password hashing.
///
/// Implementations are CPU-bound and blocking; callers run them off the async
/// executor.
pub trait CredentialHasher: Send + Sync + 'static {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// A mismatch is `Ok(false)`; errors mean the stored hash is unusable.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;
}

/// Signs and verifies access tokens.
pub trait AccessTokenCodec: Send + Sync + 'static {
    fn issue(&self, user_id: &UserId) -> Result<AccessToken, AuthError>;

    /// # Errors
    /// * `Expired` - Token lifetime has elapsed
    /// * `InvalidToken` - Signature mismatch or unparseable token
    fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}

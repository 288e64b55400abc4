use std::fmt;

use auth::OpaqueToken;
use auth::TokenDigest;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;

/// Lifetimes and policies for stateful credentials.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub refresh_token_ttl: Duration,
    pub password_reset_ttl: Duration,
    /// Presenting an already-revoked refresh token revokes every live refresh
    /// token of its owner.
    pub revoke_all_on_reuse: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::days(14),
            password_reset_ttl: Duration::minutes(30),
            revoke_all_on_reuse: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub i64);

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted refresh credential. Only the digest of the secret is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub user_id: UserId,
    pub token_hash: TokenDigest,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable iff not revoked and not yet expired.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PasswordResetTokenId(pub i64);

impl fmt::Display for PasswordResetTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Single-use credential authorizing a password change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub id: PasswordResetTokenId,
    pub user_id: UserId,
    pub token_hash: TokenDigest,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}

/// Signed, stateless bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// What a client receives from login and refresh.
///
/// The refresh secret appears here exactly once; it cannot be recovered later.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub user_id: UserId,
    pub access_token: AccessToken,
    pub refresh_token: OpaqueToken,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Identity resolved from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub username: Username,
    pub display_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub refresh_tokens: u64,
    pub password_reset_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshToken {
        RefreshToken {
            id: RefreshTokenId(1),
            user_id: UserId(1),
            token_hash: TokenDigest::of("secret"),
            expires_at,
            created_at: Utc::now(),
            revoked_at,
        }
    }

    #[test]
    fn test_refresh_token_usability() {
        let now = Utc::now();

        assert!(token(now + Duration::hours(1), None).is_usable_at(now));
        assert!(!token(now + Duration::hours(1), Some(now)).is_usable_at(now));
        assert!(!token(now, None).is_usable_at(now));
        assert!(!token(now - Duration::seconds(1), None).is_usable_at(now));
    }
}

use auth::Authenticator;

use crate::domain::errors::AuthError;
use crate::domain::session::models::AccessToken;
use crate::domain::session::ports::AccessTokenCodec;
use crate::domain::session::ports::CredentialHasher;
use crate::domain::user::models::UserId;

impl CredentialHasher for Authenticator {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Authenticator::hash_password(self, password).map_err(AuthError::from)
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        Authenticator::verify_password(self, password, password_hash).map_err(AuthError::from)
    }
}

impl AccessTokenCodec for Authenticator {
    fn issue(&self, user_id: &UserId) -> Result<AccessToken, AuthError> {
        let signed = self.issue_access_token(user_id)?;

        Ok(AccessToken {
            token: signed.token,
            expires_at: signed.expires_at,
        })
    }

    fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.validate_access_token(token)?;

        // A well-signed token with a foreign subject is still not ours.
        UserId::from_string(&claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

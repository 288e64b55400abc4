use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordPolicy;

use crate::domain::errors::AuthError;
use crate::domain::session::ports::CredentialHasher;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::UserServicePort;
use crate::domain::validation::Validator;

/// Domain service implementation for user profile operations.
pub struct UserService<UR, CH>
where
    UR: UserRepository,
    CH: CredentialHasher,
{
    repository: Arc<UR>,
    hasher: Arc<CH>,
    password_policy: PasswordPolicy,
}

impl<UR, CH> UserService<UR, CH>
where
    UR: UserRepository,
    CH: CredentialHasher,
{
    pub fn new(repository: Arc<UR>, hasher: Arc<CH>) -> Self {
        Self {
            repository,
            hasher,
            password_policy: PasswordPolicy::default(),
        }
    }
}

#[async_trait]
impl<UR, CH> UserServicePort for UserService<UR, CH>
where
    UR: UserRepository,
    CH: CredentialHasher,
{
    async fn get_user(&self, id: &UserId) -> Result<User, AuthError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound(format!("user {}", id)))
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, AuthError> {
        if let Some(password) = command.password.as_deref() {
            Validator::with_password_policy(self.password_policy)
                .password(password)
                .finish()?;
        }

        let password_hash = match command.password {
            Some(password) => Some(hash_password(&self.hasher, password).await?),
            None => None,
        };

        let patch = UserPatch {
            email: command.email,
            username: command.username,
            display_name: command.display_name,
            password_hash,
        };

        if patch.is_empty() {
            return self.get_user(id).await;
        }

        let user = self.repository.update_partial(id, patch).await?;
        tracing::info!(user_id = %user.id, "User updated");

        Ok(user)
    }
}

/// Hash on the blocking pool; Argon2 is deliberately CPU and memory heavy.
pub(crate) async fn hash_password<CH>(hasher: &Arc<CH>, password: String) -> Result<String, AuthError>
where
    CH: CredentialHasher,
{
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
}

pub(crate) async fn verify_password<CH>(
    hasher: &Arc<CH>,
    password: String,
    password_hash: String,
) -> Result<bool, AuthError>
where
    CH: CredentialHasher,
{
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
}

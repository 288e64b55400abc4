use async_trait::async_trait;

use crate::domain::errors::AuthError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;

/// Port for user profile operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Internal` - Store operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, AuthError>;

    /// Update only the fields supplied in `command`.
    ///
    /// A new password is checked against the password policy and re-hashed.
    ///
    /// # Errors
    /// * `ValidationFailed` - New password violates the policy
    /// * `NotFound` - User does not exist
    /// * `Conflict` - New email or username is taken
    /// * `Internal` - Store or hashing failure
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, AuthError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user. Uniqueness is enforced by the store.
    ///
    /// # Errors
    /// * `Conflict` - Email or username already exists
    /// * `Internal` - Store operation failed
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Lookup is case-insensitive.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;

    /// Write only the columns present in `patch` and bump `updated_at`.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Conflict` - New email or username already exists
    /// * `Internal` - Store operation failed
    async fn update_partial(&self, id: &UserId, patch: UserPatch) -> Result<User, AuthError>;
}

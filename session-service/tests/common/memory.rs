//! In-memory port implementations with the same atomicity as the Postgres
//! adapters: every multi-step write happens under one lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::OpaqueToken;
use auth::TokenDigest;
use chrono::DateTime;
use chrono::Utc;
use session_service::domain::errors::AuthError;
use session_service::domain::patch::Patch;
use session_service::domain::session::models::PasswordResetToken;
use session_service::domain::session::models::PasswordResetTokenId;
use session_service::domain::session::models::RefreshToken;
use session_service::domain::session::models::RefreshTokenId;
use session_service::domain::session::ports::PasswordResetNotifier;
use session_service::domain::session::ports::PasswordResetRepository;
use session_service::domain::session::ports::RefreshTokenRepository;
use session_service::domain::user::models::EmailAddress;
use session_service::domain::user::models::NewUser;
use session_service::domain::user::models::User;
use session_service::domain::user::models::UserId;
use session_service::domain::user::models::UserPatch;
use session_service::domain::user::ports::UserRepository;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: HashMap<UserId, User>,
    refresh_tokens: HashMap<RefreshTokenId, RefreshToken>,
    password_resets: HashMap<PasswordResetTokenId, PasswordResetToken>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn conflict_for(
        &self,
        id: Option<UserId>,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Option<AuthError> {
        let others = self.users.values().filter(|u| Some(u.id) != id);
        for user in others {
            if email.is_some_and(|e| user.email.as_str() == e) {
                return Some(AuthError::Conflict("Email".to_string()));
            }
            if username.is_some_and(|n| user.username.as_str() == n) {
                return Some(AuthError::Conflict("Username".to_string()));
            }
        }
        None
    }

    fn revoke_all_for_user(&mut self, user_id: UserId, now: DateTime<Utc>) -> u64 {
        let mut revoked = 0;
        for token in self.refresh_tokens.values_mut() {
            if token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(now);
                revoked += 1;
            }
        }
        revoked
    }
}

/// Shared backing store; hand out one adapter per port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Arc<MemoryUsers> {
        Arc::new(MemoryUsers(self.clone()))
    }

    pub fn refresh_tokens(&self) -> Arc<MemoryRefreshTokens> {
        Arc::new(MemoryRefreshTokens(self.clone()))
    }

    pub fn password_resets(&self) -> Arc<MemoryPasswordResets> {
        Arc::new(MemoryPasswordResets(self.clone()))
    }

    pub fn live_refresh_tokens(&self, user_id: UserId) -> usize {
        let now = Utc::now();
        self.lock()
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_usable_at(now))
            .count()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.lock().refresh_tokens.len()
    }

    pub fn stored_refresh_hashes(&self) -> Vec<TokenDigest> {
        self.lock()
            .refresh_tokens
            .values()
            .map(|t| t.token_hash.clone())
            .collect()
    }

    /// Move every refresh and reset token of `user_id` into the past.
    pub fn expire_tokens_of(&self, user_id: UserId) {
        let past = Utc::now() - chrono::Duration::seconds(1);
        let mut state = self.lock();
        for token in state.refresh_tokens.values_mut() {
            if token.user_id == user_id {
                token.expires_at = past;
            }
        }
        for token in state.password_resets.values_mut() {
            if token.user_id == user_id {
                token.expires_at = past;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock poisoned")
    }
}

pub struct MemoryUsers(MemoryStore);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut state = self.0.lock();
        if let Some(conflict) =
            state.conflict_for(None, Some(user.email.as_str()), Some(user.username.as_str()))
        {
            return Err(conflict);
        }

        let now = Utc::now();
        let created = User {
            id: UserId(state.next_id()),
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.0.lock().users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        Ok(self
            .0
            .lock()
            .users
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn update_partial(&self, id: &UserId, patch: UserPatch) -> Result<User, AuthError> {
        let mut state = self.0.lock();
        if let Some(conflict) = state.conflict_for(
            Some(*id),
            patch.email.as_ref().map(EmailAddress::as_str),
            patch.username.as_ref().map(|u| u.as_str()),
        ) {
            return Err(conflict);
        }

        let user = state
            .users
            .get_mut(id)
            .ok_or_else(|| AuthError::NotFound(format!("user {}", id)))?;
        apply_patch(patch, user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Write only the supplied fields, as the SQL adapter does.
fn apply_patch(patch: UserPatch, user: &mut User) {
    if let Some(email) = patch.email {
        user.email = email;
    }
    if let Some(username) = patch.username {
        user.username = username;
    }
    match patch.display_name {
        Patch::Absent => {}
        Patch::Null => user.display_name = None,
        Patch::Value(display_name) => user.display_name = Some(display_name),
    }
    if let Some(password_hash) = patch.password_hash {
        user.password_hash = password_hash;
    }
}

pub struct MemoryRefreshTokens(MemoryStore);

fn new_refresh_token(
    state: &mut MemoryState,
    user_id: UserId,
    secret: &OpaqueToken,
    expires_at: DateTime<Utc>,
) -> RefreshToken {
    let token = RefreshToken {
        id: RefreshTokenId(state.next_id()),
        user_id,
        token_hash: secret.digest(),
        expires_at,
        created_at: Utc::now(),
        revoked_at: None,
    };
    state.refresh_tokens.insert(token.id, token.clone());
    token
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokens {
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError> {
        Ok(new_refresh_token(&mut self.0.lock(), *user_id, secret, expires_at))
    }

    async fn find_by_hash(
        &self,
        token_hash: &TokenDigest,
    ) -> Result<Option<RefreshToken>, AuthError> {
        Ok(self
            .0
            .lock()
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == *token_hash)
            .cloned())
    }

    async fn revoke(&self, id: &RefreshTokenId) -> Result<(), AuthError> {
        let mut state = self.0.lock();
        let token = state
            .refresh_tokens
            .get_mut(id)
            .ok_or_else(|| AuthError::NotFound(format!("refresh token {}", id)))?;
        token.revoked_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    async fn rotate(
        &self,
        id: &RefreshTokenId,
        successor: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AuthError> {
        let now = Utc::now();
        let mut state = self.0.lock();

        let user_id = match state.refresh_tokens.get_mut(id) {
            Some(token) if token.is_usable_at(now) => {
                token.revoked_at = Some(now);
                token.user_id
            }
            _ => return Ok(None),
        };

        Ok(Some(new_refresh_token(
            &mut state, user_id, successor, expires_at,
        )))
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, AuthError> {
        Ok(self.0.lock().revoke_all_for_user(*user_id, Utc::now()))
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut state = self.0.lock();
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

pub struct MemoryPasswordResets(MemoryStore);

#[async_trait]
impl PasswordResetRepository for MemoryPasswordResets {
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AuthError> {
        let mut state = self.0.lock();
        let token = PasswordResetToken {
            id: PasswordResetTokenId(state.next_id()),
            user_id: *user_id,
            token_hash: secret.digest(),
            expires_at,
            created_at: Utc::now(),
            used_at: None,
        };
        state.password_resets.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_hash(
        &self,
        token_hash: &TokenDigest,
    ) -> Result<Option<PasswordResetToken>, AuthError> {
        Ok(self
            .0
            .lock()
            .password_resets
            .values()
            .find(|t| t.token_hash == *token_hash)
            .cloned())
    }

    async fn redeem(
        &self,
        id: &PasswordResetTokenId,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();
        let mut state = self.0.lock();

        let user_id = match state.password_resets.get_mut(id) {
            Some(token) if token.is_usable_at(now) => {
                token.used_at = Some(now);
                token.user_id
            }
            _ => return Ok(false),
        };

        if let Some(user) = state.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = now;
        }
        state.revoke_all_for_user(user_id, now);

        Ok(true)
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut state = self.0.lock();
        let before = state.password_resets.len();
        state
            .password_resets
            .retain(|_, t| t.used_at.is_none() && now < t.expires_at);
        Ok((before - state.password_resets.len()) as u64)
    }
}

/// Keeps every delivered reset secret so tests can play the mailbox.
#[derive(Default)]
pub struct CapturingNotifier {
    delivered: Mutex<Vec<(UserId, String)>>,
}

impl CapturingNotifier {
    pub fn last_secret_for(&self, user_id: UserId) -> Option<OpaqueToken> {
        self.delivered
            .lock()
            .expect("notifier lock poisoned")
            .iter()
            .rev()
            .find(|(id, _)| *id == user_id)
            .map(|(_, secret)| OpaqueToken::from_presented(secret.clone()))
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().expect("notifier lock poisoned").len()
    }
}

#[async_trait]
impl PasswordResetNotifier for CapturingNotifier {
    async fn deliver(
        &self,
        user: &User,
        secret: &OpaqueToken,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.delivered
            .lock()
            .expect("notifier lock poisoned")
            .push((user.id, secret.expose().to_string()));
        Ok(())
    }
}

use async_trait::async_trait;
use auth::OpaqueToken;
use auth::TokenDigest;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use super::database_error;
use crate::domain::errors::AuthError;
use crate::domain::session::models::PasswordResetToken;
use crate::domain::session::models::PasswordResetTokenId;
use crate::domain::session::ports::PasswordResetRepository;
use crate::domain::user::models::UserId;

const RESET_COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at, used_at";

pub struct PostgresPasswordResetRepository {
    pool: PgPool,
}

impl PostgresPasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PasswordResetRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl From<PasswordResetRow> for PasswordResetToken {
    fn from(r: PasswordResetRow) -> Self {
        PasswordResetToken {
            id: PasswordResetTokenId(r.id),
            user_id: UserId(r.user_id),
            token_hash: TokenDigest::from_stored(r.token_hash),
            expires_at: r.expires_at,
            created_at: r.created_at,
            used_at: r.used_at,
        }
    }
}

#[async_trait]
impl PasswordResetRepository for PostgresPasswordResetRepository {
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AuthError> {
        let token_hash = secret.digest();

        let row = sqlx::query_as::<_, PasswordResetRow>(&format!(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {RESET_COLUMNS}
            "#
        ))
        .bind(user_id.0)
        .bind(token_hash.as_str())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.into())
    }

    async fn find_by_hash(
        &self,
        token_hash: &TokenDigest,
    ) -> Result<Option<PasswordResetToken>, AuthError> {
        let row = sqlx::query_as::<_, PasswordResetRow>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_reset_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(PasswordResetToken::from))
    }

    async fn redeem(
        &self,
        id: &PasswordResetTokenId,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let owner: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE password_reset_tokens
            SET used_at = now()
            WHERE id = $1 AND used_at IS NULL AND expires_at > now()
            RETURNING user_id
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error)?;

        let Some(user_id) = owner else {
            return Ok(false);
        };

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        tx.commit().await.map_err(database_error)?;

        Ok(true)
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "DELETE FROM password_reset_tokens WHERE expires_at <= now() OR used_at IS NOT NULL",
        )
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}

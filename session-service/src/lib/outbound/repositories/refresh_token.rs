use async_trait::async_trait;
use auth::OpaqueToken;
use auth::TokenDigest;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use super::database_error;
use super::violated_unique_constraint;
use crate::domain::errors::AuthError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::user::models::UserId;

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at, revoked_at";

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(r: RefreshTokenRow) -> Self {
        RefreshToken {
            id: RefreshTokenId(r.id),
            user_id: UserId(r.user_id),
            token_hash: TokenDigest::from_stored(r.token_hash),
            expires_at: r.expires_at,
            created_at: r.created_at,
            revoked_at: r.revoked_at,
        }
    }
}

fn classify_insert_error(e: sqlx::Error) -> AuthError {
    match violated_unique_constraint(&e).as_deref() {
        Some("refresh_tokens_token_hash_key") => {
            AuthError::Internal("Refresh token hash collision".to_string())
        }
        _ => database_error(e),
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn create(
        &self,
        user_id: &UserId,
        secret: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError> {
        let token_hash = secret.digest();

        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(user_id.0)
        .bind(token_hash.as_str())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_insert_error)?;

        Ok(row.into())
    }

    async fn find_by_hash(
        &self,
        token_hash: &TokenDigest,
    ) -> Result<Option<RefreshToken>, AuthError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(RefreshToken::from))
    }

    async fn revoke(&self, id: &RefreshTokenId) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = COALESCE(revoked_at, now()) WHERE id = $1",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("refresh token {}", id)));
        }

        Ok(())
    }

    async fn rotate(
        &self,
        id: &RefreshTokenId,
        successor: &OpaqueToken,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, AuthError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        // Row lock plus re-checked predicate: a concurrent rotation of the same
        // token blocks here and then matches nothing.
        let owner: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = now()
            WHERE id = $1 AND revoked_at IS NULL AND expires_at > now()
            RETURNING user_id
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error)?;

        let Some(user_id) = owner else {
            return Ok(None);
        };

        let token_hash = successor.digest();
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(token_hash.as_str())
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify_insert_error)?;

        tx.commit().await.map_err(database_error)?;

        Ok(Some(row.into()))
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}

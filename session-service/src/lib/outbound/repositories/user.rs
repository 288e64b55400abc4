use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;

use super::database_error;
use super::violated_unique_constraint;
use crate::domain::errors::AuthError;
use crate::domain::patch::Patch;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPatch;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;

const USER_COLUMNS: &str =
    "id, email, username, display_name, password_hash, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    display_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        // Rows were validated on the way in; failure here is corruption.
        let email = EmailAddress::new(r.email).map_err(AuthError::internal)?;
        let username = Username::new(r.username).map_err(AuthError::internal)?;

        Ok(User {
            id: UserId(r.id),
            email,
            username,
            display_name: r.display_name,
            password_hash: r.password_hash,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn classify_write_error(e: sqlx::Error) -> AuthError {
    match violated_unique_constraint(&e).as_deref() {
        Some("users_email_key") => AuthError::Conflict("Email".to_string()),
        Some("users_username_key") => AuthError::Conflict("Username".to_string()),
        _ => database_error(e),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, username, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.email.as_str())
        .bind(user.username.as_str())
        .bind(user.display_name.as_deref())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_write_error)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn update_partial(&self, id: &UserId, patch: UserPatch) -> Result<User, AuthError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");

        if let Some(email) = patch.email {
            builder.push(", email = ").push_bind(email.as_str().to_string());
        }
        if let Some(username) = patch.username {
            builder
                .push(", username = ")
                .push_bind(username.as_str().to_string());
        }
        match patch.display_name {
            Patch::Absent => {}
            Patch::Null => {
                builder.push(", display_name = NULL");
            }
            Patch::Value(display_name) => {
                builder.push(", display_name = ").push_bind(display_name);
            }
        }
        if let Some(password_hash) = patch.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }

        builder.push(" WHERE id = ").push_bind(id.0);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_write_error)?
            .ok_or_else(|| AuthError::NotFound(format!("user {}", id)))?;

        row.try_into()
    }
}

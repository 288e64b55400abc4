use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::errors::AuthError;
use crate::domain::session::models::TokenPair;
use crate::domain::user::models::EmailAddress;
use crate::domain::validation::Validator;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<TokenPairResponseData>, ApiError> {
    let (email, password) = body.try_into_credentials()?;

    state
        .auth_service
        .login(&email, &password)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl LoginRequest {
    fn try_into_credentials(self) -> Result<(EmailAddress, String), AuthError> {
        Validator::new()
            .required("email", &self.email)
            .email("email", &self.email)
            .required("password", &self.password)
            .finish()?;

        Ok((EmailAddress::new(self.email)?, self.password))
    }
}

/// Token pair as returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPairResponseData {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenPairResponseData {
    fn from(pair: TokenPair) -> Self {
        let expires_in = (pair.access_token.expires_at - Utc::now())
            .num_seconds()
            .max(0);

        Self {
            access_token: pair.access_token.token,
            token_type: "Bearer",
            expires_in,
            refresh_token: pair.refresh_token.into_inner(),
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

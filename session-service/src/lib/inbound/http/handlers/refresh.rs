use auth::OpaqueToken;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::login::TokenPairResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::validation::Validator;
use crate::inbound::http::router::AppState;

/// Body shared by refresh and logout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    refresh_token: String,
}

impl RefreshTokenRequest {
    pub(super) fn try_into_token(self) -> Result<OpaqueToken, ApiError> {
        Validator::new()
            .required("refresh_token", &self.refresh_token)
            .finish()?;

        Ok(OpaqueToken::from_presented(self.refresh_token))
    }
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<ApiSuccess<TokenPairResponseData>, ApiError> {
    let refresh_token = body.try_into_token()?;

    state
        .auth_service
        .refresh(&refresh_token)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

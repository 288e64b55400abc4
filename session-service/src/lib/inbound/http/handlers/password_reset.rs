use auth::OpaqueToken;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::errors::AuthError;
use crate::domain::user::models::EmailAddress;
use crate::domain::validation::Validator;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetRequestedData {
    pub message: String,
}

/// Always 202 for a well-formed email, whether or not an account exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<ApiSuccess<PasswordResetRequestedData>, ApiError> {
    Validator::new()
        .required("email", &body.email)
        .email("email", &body.email)
        .finish()?;
    let email = EmailAddress::new(body.email).map_err(AuthError::from)?;

    state.auth_service.request_password_reset(&email).await?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        PasswordResetRequestedData {
            message: "If the account exists, reset instructions have been sent".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmPasswordResetRequest {
    #[serde(default)]
    token: String,
    #[serde(default, alias = "new_password")]
    password: String,
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPasswordResetRequest>,
) -> Result<StatusCode, ApiError> {
    Validator::new()
        .required("token", &body.token)
        .required("password", &body.password)
        .password(&body.password)
        .finish()?;

    let reset_token = OpaqueToken::from_presented(body.token);
    state
        .auth_service
        .confirm_password_reset(&reset_token, &body.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

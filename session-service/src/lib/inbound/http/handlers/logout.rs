use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::refresh::RefreshTokenRequest;
use super::ApiError;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let refresh_token = body.try_into_token()?;

    state.auth_service.logout(&refresh_token).await?;

    Ok(StatusCode::NO_CONTENT)
}

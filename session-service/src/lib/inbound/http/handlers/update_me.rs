use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::get_me::UserResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::errors::AuthError;
use crate::domain::patch::Patch;
use crate::domain::session::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::domain::validation::Validator;
use crate::inbound::http::router::AppState;

/// Partial update body. Omitted fields are left untouched; `display_name: null`
/// clears the display name.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeRequest {
    #[serde(default)]
    email: Patch<String>,
    #[serde(default)]
    username: Patch<String>,
    #[serde(default, alias = "name")]
    display_name: Patch<String>,
    #[serde(default)]
    password: Patch<String>,
}

impl UpdateMeRequest {
    fn try_into_command(self) -> Result<UpdateUserCommand, AuthError> {
        let email = provided(self.email.value());
        let username = provided(self.username.value());
        let password = provided(self.password.value());

        Validator::new()
            .rule("email", !is_null(&self.email), "cannot be null")
            .rule("username", !is_null(&self.username), "cannot be null")
            .rule("password", !is_null(&self.password), "cannot be null")
            .optional_email("email", email)
            .optional_min_length("username", username, Username::MIN_LENGTH)
            .optional_max_length("username", username, Username::MAX_LENGTH)
            .rule(
                "username",
                username.map_or(true, Username::has_valid_chars),
                "may only contain letters, digits, underscores and hyphens",
            )
            .optional_max_length(
                "display_name",
                self.display_name.value().map(String::as_str),
                User::DISPLAY_NAME_MAX_LENGTH,
            )
            .optional_password(password)
            .finish()?;

        Ok(UpdateUserCommand {
            email: email
                .map(|e| EmailAddress::new(e.to_string()))
                .transpose()?,
            username: username
                .map(|u| Username::new(u.to_string()))
                .transpose()?,
            display_name: self.display_name,
            password: password.map(str::to_string),
        })
    }
}

fn is_null<T>(patch: &Patch<T>) -> bool {
    matches!(patch, Patch::Null)
}

/// Empty strings count as "not supplied" for the non-nullable fields.
fn provided(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .user_service
        .update_user(&identity.user_id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

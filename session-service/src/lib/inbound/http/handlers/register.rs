use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::get_me::UserResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::errors::AuthError;
use crate::domain::session::models::RegisterCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::domain::validation::Validator;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    state
        .auth_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
    #[serde(default)]
    password: String,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, AuthError> {
        Validator::new()
            .required("email", &self.email)
            .email("email", &self.email)
            .required("username", &self.username)
            .min_length("username", &self.username, Username::MIN_LENGTH)
            .max_length("username", &self.username, Username::MAX_LENGTH)
            .rule(
                "username",
                Username::has_valid_chars(&self.username),
                "may only contain letters, digits, underscores and hyphens",
            )
            .optional_max_length(
                "display_name",
                self.display_name.as_deref(),
                User::DISPLAY_NAME_MAX_LENGTH,
            )
            .required("password", &self.password)
            .password(&self.password)
            .finish()?;

        Ok(RegisterCommand {
            email: EmailAddress::new(self.email)?,
            username: Username::new(self.username)?,
            display_name: self.display_name.filter(|name| !name.trim().is_empty()),
            password: self.password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_valid_request_becomes_command() {
        let command = request(serde_json::json!({
            "email": "Alice@Example.com",
            "username": "alice",
            "name": "Alice",
            "password": "Str0ngPass!"
        }))
        .try_into_command()
        .unwrap();

        assert_eq!(command.email.as_str(), "alice@example.com");
        assert_eq!(command.username.as_str(), "alice");
        assert_eq!(command.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_all_field_errors_are_reported_together() {
        let err = request(serde_json::json!({
            "email": "not-an-email",
            "username": "a!",
            "password": "short"
        }))
        .try_into_command()
        .unwrap_err();

        let fields = err.field_errors().unwrap();
        assert!(fields.get("email").is_some());
        assert_eq!(fields.get("username").unwrap().len(), 2);
        assert!(fields.get("password").unwrap().len() >= 2);
    }

    #[test]
    fn test_missing_fields_are_required() {
        let err = request(serde_json::json!({})).try_into_command().unwrap_err();

        let fields = err.field_errors().unwrap();
        for field in ["email", "username", "password"] {
            assert!(
                fields
                    .get(field)
                    .unwrap()
                    .contains(&"is required".to_string()),
                "{field} should be required"
            );
        }
    }
}

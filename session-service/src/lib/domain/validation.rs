//! Field-level input validation.
//!
//! [`Validator`] accumulates every violation instead of stopping at the first,
//! so a client gets the complete list of problems in one response.

use std::collections::BTreeMap;

use auth::PasswordPolicy;
use serde::Serialize;

/// Field name to list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }
}

/// Builder collecting field violations.
///
/// ```
/// use session_service::domain::validation::Validator;
///
/// let result = Validator::new()
///     .required("email", "")
///     .email("email", "")
///     .min_length("username", "al", 3)
///     .finish();
///
/// let errors = result.unwrap_err();
/// assert_eq!(errors.get("email").unwrap().len(), 2);
/// assert_eq!(errors.get("username").unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: ValidationErrors,
    password_policy: PasswordPolicy,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password_policy(password_policy: PasswordPolicy) -> Self {
        Self {
            errors: ValidationErrors::new(),
            password_policy,
        }
    }

    pub fn required(self, field: &str, value: &str) -> Self {
        let ok = !value.trim().is_empty();
        self.rule(field, ok, "is required")
    }

    pub fn email(self, field: &str, value: &str) -> Self {
        let ok = email_address::EmailAddress::is_valid(value.trim());
        self.rule(field, ok, "must be a valid email address")
    }

    pub fn min_length(self, field: &str, value: &str, min: usize) -> Self {
        let ok = value.chars().count() >= min;
        self.rule(
            field,
            ok,
            format!("must be at least {} characters long", min),
        )
    }

    pub fn max_length(self, field: &str, value: &str, max: usize) -> Self {
        let ok = value.chars().count() <= max;
        self.rule(field, ok, format!("must be at most {} characters long", max))
    }

    pub fn optional_email(self, field: &str, value: Option<&str>) -> Self {
        match present(value) {
            Some(value) => self.email(field, value),
            None => self,
        }
    }

    pub fn optional_min_length(self, field: &str, value: Option<&str>, min: usize) -> Self {
        match present(value) {
            Some(value) => self.min_length(field, value, min),
            None => self,
        }
    }

    pub fn optional_max_length(self, field: &str, value: Option<&str>, max: usize) -> Self {
        match present(value) {
            Some(value) => self.max_length(field, value, max),
            None => self,
        }
    }

    /// Apply the password strength policy. Violations land under `password`.
    pub fn password(mut self, value: &str) -> Self {
        for violation in self.password_policy.violations(value) {
            self.errors.add("password", violation);
        }
        self
    }

    pub fn optional_password(self, value: Option<&str>) -> Self {
        match present(value) {
            Some(value) => self.password(value),
            None => self,
        }
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn rule(mut self, field: &str, ok: bool, message: impl Into<String>) -> Self {
        if !ok {
            self.errors.add(field, message);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_map(&self) -> &BTreeMap<String, Vec<String>> {
        self.errors.as_map()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

//! Login form payload and the per-request validation error set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const FIELD_USERNAME: &str = "username";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_GLOBAL: &str = "global";

pub const MSG_USERNAME_REQUIRED: &str = "Please fill up your username correctly";
pub const MSG_PASSWORD_REQUIRED: &str = "Please fill up your password correctly";
pub const MSG_INVALID_SESSION: &str = "Invalid request session";
pub const MSG_USER_NOT_FOUND: &str = "User not found. Please ensure you input it correctly.";
pub const MSG_INVALID_AUTHENTICATION: &str = "Invalid authentication";
pub const MSG_FAILED_TO_PROCESS: &str = "Failed to process";

/// Fields posted by the login form. Every field is optional so a missing one is
/// reported as a validation error instead of a rejected request.
#[derive(Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub csrf: Option<String>,
    pub remember: Option<String>,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("csrf", &self.csrf.as_ref().map(|_| "***"))
            .field("remember", &self.remember)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl LoginForm {
    /// Presence checks; every blank field is reported, nothing else is looked at.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.username().is_none() {
            errors.insert(FIELD_USERNAME, MSG_USERNAME_REQUIRED);
        }
        if self.password().is_none() {
            errors.insert(FIELD_PASSWORD, MSG_PASSWORD_REQUIRED);
        }
        if self.csrf().is_none() {
            errors.insert(FIELD_GLOBAL, MSG_INVALID_SESSION);
        }
        errors
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        non_blank(self.username.as_ref())
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        non_blank(self.password.as_ref())
    }

    #[must_use]
    pub fn csrf(&self) -> Option<&str> {
        non_blank(self.csrf.as_ref())
    }

    /// Any non-empty value ticks "remember me".
    #[must_use]
    pub fn remember(&self) -> bool {
        self.remember.as_ref().is_some_and(|value| !value.is_empty())
    }
}

/// Field name to message, rebuilt on every submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    /// Set the form-wide message.
    pub fn global(&mut self, message: &str) {
        self.insert(FIELD_GLOBAL, message);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

const USERNAME_MAX_CHARS: usize = 150;
const PASSWORD_MIN_CHARS: usize = 6;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Response returned after refresh.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response from the protected endpoint, echoing the caller's identity.
#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: String,
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9@.+_-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

impl RegisterRequest {
    /// Syntactic field checks, all collected into one response.
    /// Uniqueness is the store's concern and is checked by the handler.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.username.is_empty() {
            errors.push("username", "This field may not be blank.");
        } else {
            if self.username.chars().count() > USERNAME_MAX_CHARS {
                errors.push(
                    "username",
                    format!(
                        "Ensure this field has no more than {} characters.",
                        USERNAME_MAX_CHARS
                    ),
                );
            }
            if !is_valid_username(&self.username) {
                errors.push(
                    "username",
                    "Enter a valid username. This value may contain only letters, \
                     numbers, and @/./+/-/_ characters.",
                );
            }
        }

        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            errors.push(
                "password",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN_CHARS
                ),
            );
        }

        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.password {
                errors.push("confirm_password", "The two password fields didn't match.");
            }
        }

        errors
    }
}

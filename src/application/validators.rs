use validator::ValidateEmail;

use crate::app_error::{AppError, AppResult, FieldError};

pub const PASSWORD_MESSAGE: &str = "Password (at least 8 characters, including 1 uppercase letter, 1 lowercase letter, 1 number and 1 symbol)";
pub const NAME_MESSAGE: &str = "Full name should be 1 to 50 characters long, letters only, single spaced.";
pub const EMAIL_MESSAGE: &str = "please supply a valid email address";
pub const TOKEN_MESSAGE: &str = "please supply a valid json web token";

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 255;
const NAME_MAX_LEN: usize = 50;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Trim and lower-case an email before it is stored or looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Password complexity policy.
/// Rules:
/// - 8-255 characters
/// - at least one lowercase letter, one uppercase letter, one digit
/// - at least one character that is not a letter or digit
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return false;
    }

    password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

/// Validates a display name.
/// Rules:
/// - 1-50 characters after trimming
/// - ASCII letters and spaces only, never two spaces in a row
/// - starts and ends with a letter
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > NAME_MAX_LEN {
        return false;
    }

    if name.contains("  ") {
        return false;
    }

    name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Cheap shape check for a compact JWS: three non-empty base64url segments.
/// Says nothing about whether the token is genuine.
pub fn is_token_shaped(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        })
}

/// Collects field errors for one request and turns them into a single
/// `ValidationFailed`.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self.0))
        }
    }
}

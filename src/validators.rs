/// Input validators
///
/// Run at the HTTP boundary before the auth service is invoked, and on the
/// provisioning path before an identity is stored.
/// 1. DoS Protection: input length limits
/// 2. Control character rejection
/// 3. Username/email format for provisioned identities

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MAX_PASSWORD_INPUT_LENGTH: usize = 128;
const MAX_REFRESH_TOKEN_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
}

/// Validates a login request body
///
/// Only shape is checked here; whether the credentials are right is the
/// auth service's business.
pub fn validate_login_request(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }
    if username.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.chars().count() > MAX_PASSWORD_INPUT_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_INPUT_LENGTH,
        ));
    }

    Ok(())
}

/// Validates a refresh or logout request body
pub fn validate_refresh_request(refresh_token: &str) -> Result<(), ValidationError> {
    if refresh_token.trim().is_empty() {
        return Err(ValidationError::EmptyField("refreshToken".to_string()));
    }
    if refresh_token.len() > MAX_REFRESH_TOKEN_LENGTH {
        return Err(ValidationError::TooLong(
            "refreshToken".to_string(),
            MAX_REFRESH_TOKEN_LENGTH,
        ));
    }
    if refresh_token.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("refreshToken".to_string()));
    }
    Ok(())
}

/// Validates a username for a new identity
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }
    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }
    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates an email address for a new identity
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    // Local part is limited to 64 octets
    let local_too_long = trimmed
        .find('@')
        .map(|at| at > 64)
        .unwrap_or(false);
    if local_too_long || !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

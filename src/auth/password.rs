/// Password Hashing and Verification
///
/// bcrypt with a configured cost. The digest comparison inside `bcrypt::verify` is
/// constant-time, so the only timing signal is the hash cost itself.

use bcrypt::{hash, verify};

use crate::error::{AppError, ConfigurationError, ValidationError};
use crate::store::PasswordHash;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Lowest accepted bcrypt cost
pub const MIN_BCRYPT_COST: u32 = 10;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Clone)]
pub struct PasswordVerifier {
    cost: u32,
    /// Hash of a throwaway password, verified against when the username is unknown
    dummy_hash: String,
}

impl std::fmt::Debug for PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordVerifier")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordVerifier {
    /// # Errors
    /// `ConfigurationError::InvalidValue` if `cost` is outside 10..=31.
    pub fn new(cost: u32) -> Result<Self, ConfigurationError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(ConfigurationError::InvalidValue(format!(
                "password.bcrypt_cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, cost
            )));
        }

        let dummy_hash = hash(uuid::Uuid::new_v4().to_string(), cost).map_err(|e| {
            ConfigurationError::InvalidValue(format!("bcrypt is unusable: {}", e))
        })?;

        Ok(Self { cost, dummy_hash })
    }

    /// Hash a password for provisioning
    ///
    /// # Errors
    /// Returns error if:
    /// - Password fails validation (too short, weak, etc.)
    /// - Bcrypt hashing fails
    pub fn hash_password(&self, password: &str) -> Result<PasswordHash, AppError> {
        validate_password_strength(password)?;

        hash(password, self.cost)
            .map(PasswordHash::new)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check a plaintext password against a stored hash
    ///
    /// A stored hash bcrypt cannot parse never matches.
    pub fn verify(&self, password: &str, stored: &PasswordHash) -> bool {
        match verify(password, stored.expose()) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash is unusable");
                false
            }
        }
    }

    /// Spend one verification's worth of work and report a mismatch
    ///
    /// Used when the username is unknown, so that path costs the same as a wrong
    /// password.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = verify(password, &self.dummy_hash);
        false
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }

    // bcrypt limitation and DoS prevention
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

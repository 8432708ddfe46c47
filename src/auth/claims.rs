/// JWT Claims structure
///
/// The payload of an access token: exactly `sub`, `iss`, `iat`, `exp` and `roles`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::store::Identity;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    /// Role labels of the subject
    pub roles: Vec<String>,
}

impl Claims {
    /// Build claims for an identity issued at `now`
    ///
    /// # Arguments
    /// * `identity` - Token subject
    /// * `now` - Issue instant, truncated to whole seconds
    /// * `expiry_seconds` - Token lifetime in seconds
    /// * `issuer` - Issuer identifier
    ///
    /// # Errors
    /// `TokenError::Signing` if `exp` does not fit in an `i64`.
    pub fn new(
        identity: &Identity,
        now: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: &str,
    ) -> Result<Self, TokenError> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(expiry_seconds)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: identity.username.clone(),
            iss: issuer.to_string(),
            iat,
            exp,
            roles: identity.role_list(),
        })
    }

    /// Expiry is exclusive: a token is expired from the `exp` second onwards
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// JWT Token Signing and Verification
///
/// Access tokens are HS256 JWTs. The algorithm is fixed: tokens declaring any other
/// `alg` are rejected, so there is nothing to negotiate.
///
/// Expiry is checked here rather than by `jsonwebtoken`, which allows `now == exp`
/// and applies a default leeway. Here `now >= exp` is expired, with no leeway.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;

use crate::auth::claims::Claims;
use crate::configuration::{validate_ttl, JwtSettings};
use crate::error::{ConfigurationError, TokenError};
use crate::store::Identity;

/// 256 bits, the HS256 key size
pub const MIN_SECRET_BYTES: usize = 32;

/// Issues and verifies access tokens
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl_seconds: i64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("issuer", &self.issuer)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// # Errors
    /// `ConfigurationError::WeakSigningSecret` if the secret is shorter than 32 bytes.
    /// This is a startup failure; the service must not run with such a key.
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigurationError> {
        let secret = config.secret.as_bytes();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigurationError::WeakSigningSecret {
                actual: secret.len(),
                required: MIN_SECRET_BYTES,
            });
        }
        validate_ttl("jwt.access_token_expiry", config.access_token_expiry)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            access_ttl_seconds: config.access_token_expiry,
        })
    }

    /// Issue an access token for `identity`, valid from now
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(identity, now, self.access_ttl_seconds, &self.issuer)?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify structure, signature, issuer and expiry
    ///
    /// `Expired` is only returned for tokens whose signature checks out.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.decode_signed(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Subject of a signature-valid token, whether expired or not
    ///
    /// Only for identifying who presented a stale access token. Never use this to
    /// authorize a request; that always goes through `verify`.
    pub fn subject_ignoring_expiry(&self, token: &str) -> Result<String, TokenError> {
        self.decode_signed(token).map(|claims| claims.sub)
    }

    fn decode_signed(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                TokenError::MalformedOrBadSignature
            })
    }
}

/// Authentication service
///
/// Composes the password verifier, token signer and refresh token manager into
/// login, refresh and logout. Internal causes are logged and collapsed into one
/// external error per operation.

use serde::Serialize;
use std::sync::Arc;

use crate::auth::jwt::TokenSigner;
use crate::auth::password::PasswordVerifier;
use crate::auth::refresh_token::RefreshTokenManager;
use crate::error::{AuthError, RefreshTokenError};
use crate::store::CredentialStore;

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Access token plus the refresh token it travels with
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordVerifier,
    signer: Arc<TokenSigner>,
    refresh_tokens: RefreshTokenManager,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordVerifier,
        signer: Arc<TokenSigner>,
        refresh_tokens: RefreshTokenManager,
    ) -> Self {
        Self {
            store,
            passwords,
            signer,
            refresh_tokens,
        }
    }

    pub fn token_signer(&self) -> Arc<TokenSigner> {
        self.signer.clone()
    }

    pub fn password_verifier(&self) -> &PasswordVerifier {
        &self.passwords
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenManager {
        &self.refresh_tokens
    }

    /// Authenticate with username and password and issue a token pair
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown username and for a wrong password alike
    /// - `StoreUnavailable` / `Internal` when the store or signing fails
    ///
    /// Either both tokens are issued or neither: the access token has no side effects
    /// and is dropped if persisting the refresh token fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let identity = self.store.find_identity_by_username(username).await?;

        let verifier = self.passwords.clone();
        let password = password.to_string();
        let stored_hash = identity.as_ref().map(|i| i.password_hash.clone());
        let password_matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verifier.verify(&password, &hash),
            None => verifier.verify_dummy(&password),
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?;

        let identity = match identity {
            Some(identity) if password_matches => identity,
            _ => {
                tracing::warn!("Login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let access_token = self.signer.issue(&identity)?;
        let refresh = self.refresh_tokens.create(&identity).await?;

        tracing::info!(user_id = %identity.id, "User logged in successfully");
        Ok(TokenPair::bearer(access_token, refresh.token))
    }

    /// Issue a new access token for a valid refresh token
    ///
    /// The refresh token is neither rotated nor extended; the same string comes back.
    ///
    /// # Errors
    /// - `InvalidOrExpiredRefreshToken` for unknown, revoked and expired tokens alike
    /// - `StoreUnavailable` / `Internal` when the store or signing fails
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let record = self.refresh_tokens.verify(refresh_token).await?;

        let access_token = self.signer.issue(&record.identity)?;

        tracing::info!(user_id = %record.identity.id, "Access token refreshed");
        Ok(TokenPair::bearer(access_token, record.token))
    }

    /// End every session of the identity owning `refresh_token`
    ///
    /// A token that is already revoked is accepted without another write.
    ///
    /// # Errors
    /// `InvalidOrExpiredRefreshToken` for unknown and expired tokens.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let record = match self.refresh_tokens.verify(refresh_token).await {
            Ok(record) => record,
            Err(RefreshTokenError::Revoked) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        self.refresh_tokens
            .revoke_all_for_identity(&record.identity)
            .await?;

        tracing::info!(user_id = %record.identity.id, "User logged out");
        Ok(())
    }
}

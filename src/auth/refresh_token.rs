/// Refresh Token Management
///
/// Refresh tokens are:
/// - Opaque UUIDv4 strings (122 random bits), unguessable
/// - Store-backed, so they can be revoked server-side before they expire
/// - Reusable until expiry or revocation (no rotation on use)
///
/// Per record: ACTIVE -> REVOKED (explicit write) or ACTIVE -> EXPIRED (time).
/// Both are terminal.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::configuration::validate_ttl;
use crate::error::{ConfigurationError, RefreshTokenError, StoreError};
use crate::store::{CredentialStore, Identity, RefreshTokenRecord, RefreshTokenState};

/// Generate a new refresh token string
pub fn generate_refresh_token() -> String {
    Uuid::new_v4().to_string()
}

pub struct RefreshTokenManager {
    store: Arc<dyn CredentialStore>,
    ttl: Duration,
}

impl RefreshTokenManager {
    /// # Errors
    /// `ConfigurationError::InvalidValue` if `ttl_seconds` is not positive or longer
    /// than `MAX_TOKEN_TTL_SECONDS`.
    pub fn new(store: Arc<dyn CredentialStore>, ttl_seconds: i64) -> Result<Self, ConfigurationError> {
        validate_ttl("jwt.refresh_token_expiry", ttl_seconds)?;
        let ttl = Duration::try_seconds(ttl_seconds).ok_or_else(|| {
            ConfigurationError::InvalidValue("jwt.refresh_token_expiry out of range".to_string())
        })?;

        Ok(Self { store, ttl })
    }

    /// Create and persist a refresh token for `identity`
    pub async fn create(&self, identity: &Identity) -> Result<RefreshTokenRecord, RefreshTokenError> {
        self.create_at(identity, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            token: generate_refresh_token(),
            identity: identity.clone(),
            expires_at: now.checked_add_signed(self.ttl).ok_or_else(|| {
                RefreshTokenError::Store(StoreError::Unexpected(
                    "refresh token expiry out of range".to_string(),
                ))
            })?,
            revoked: false,
        };

        self.store.save_refresh_token(&record).await?;

        tracing::debug!(
            user_id = %identity.id,
            token_id = %record.id,
            expires_at = %record.expires_at,
            "Refresh token created"
        );
        Ok(record)
    }

    /// Look up a refresh token and check it is still usable
    ///
    /// Read-only: the expiry is not extended and the token is not rotated.
    ///
    /// # Errors
    /// `NotFound`, `Revoked` or `Expired` (`expires_at <= now`); store failures as
    /// `Store`.
    pub async fn verify(&self, token: &str) -> Result<RefreshTokenRecord, RefreshTokenError> {
        self.verify_at(token, Utc::now()).await
    }

    pub async fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let record = match self.store.find_refresh_token_by_token(token).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh token not found");
                return Err(RefreshTokenError::NotFound);
            }
        };

        match record.state_at(now) {
            RefreshTokenState::Active => Ok(record),
            RefreshTokenState::Revoked => {
                tracing::warn!(
                    user_id = %record.identity.id,
                    token_id = %record.id,
                    "Attempt to use revoked refresh token"
                );
                Err(RefreshTokenError::Revoked)
            }
            RefreshTokenState::Expired => {
                tracing::info!(
                    user_id = %record.identity.id,
                    token_id = %record.id,
                    "Refresh token expired"
                );
                Err(RefreshTokenError::Expired)
            }
        }
    }

    /// Revoke every refresh token owned by `identity`
    ///
    /// Idempotent; returns how many tokens were newly revoked.
    pub async fn revoke_all_for_identity(&self, identity: &Identity) -> Result<u64, RefreshTokenError> {
        let revoked = self.store.mark_revoked_for_identity(identity.id).await?;

        tracing::info!(user_id = %identity.id, revoked, "Refresh tokens revoked for user");
        Ok(revoked)
    }

    /// Delete records that expired before now
    pub async fn purge_expired(&self) -> Result<u64, RefreshTokenError> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64, RefreshTokenError> {
        let removed = self.store.delete_expired_refresh_tokens(now).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired refresh tokens purged");
        }
        Ok(removed)
    }
}

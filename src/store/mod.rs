/// Credential Store
///
/// The persistence contract the auth core depends on, plus the two backends:
/// an in-memory store (development and tests) and PostgreSQL via sqlx.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

pub use memory::InMemoryCredentialStore;
pub use models::{
    Identity, PasswordHash, RefreshTokenRecord, RefreshTokenState, ROLE_ADMIN, ROLE_USER,
};
pub use postgres::PgCredentialStore;

/// Lookup-by-key access to identities and refresh tokens
///
/// Implementations must make a committed `mark_revoked_for_identity` visible to every
/// later `find_refresh_token_by_token`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// Fails with `StoreError::Conflict` when the username or email is taken
    async fn save_identity(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Returns the record together with its owning identity
    async fn find_refresh_token_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Fails with `StoreError::Conflict` when the token string already exists
    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    /// Returns how many records went from not revoked to revoked
    async fn mark_revoked_for_identity(&self, identity_id: Uuid) -> Result<u64, StoreError>;

    /// Physically removes records with `expires_at <= now`
    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

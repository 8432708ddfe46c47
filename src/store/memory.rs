/// In-memory credential store
///
/// Single `RwLock` over all tables, so a committed revoke is visible to every
/// subsequent read. Used when no database is configured, and by the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::models::{Identity, RefreshTokenRecord};
use super::CredentialStore;
use crate::error::StoreError;

/// Stored shape of a refresh token; the owner is joined in on read
#[derive(Debug, Clone)]
struct RefreshTokenRow {
    id: Uuid,
    identity_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Debug, Default)]
struct Tables {
    identities: HashMap<Uuid, Identity>,
    ids_by_username: HashMap<String, Uuid>,
    emails: HashSet<String>,
    refresh_tokens: HashMap<String, RefreshTokenRow>,
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unexpected("credential store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unexpected("credential store lock poisoned".to_string()))
    }

    /// Number of refresh-token records currently held, revoked or not
    pub fn refresh_token_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.refresh_tokens.len())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .ids_by_username
            .get(username)
            .and_then(|id| tables.identities.get(id))
            .cloned())
    }

    async fn save_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut tables = self.write()?;

        if tables.ids_by_username.contains_key(&identity.username) {
            return Err(StoreError::Conflict(format!(
                "username {} already exists",
                identity.username
            )));
        }
        if tables.emails.contains(&identity.email) {
            return Err(StoreError::Conflict("email already exists".to_string()));
        }

        tables
            .ids_by_username
            .insert(identity.username.clone(), identity.id);
        tables.emails.insert(identity.email.clone());
        tables.identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn find_refresh_token_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let tables = self.read()?;

        let Some(row) = tables.refresh_tokens.get(token) else {
            return Ok(None);
        };
        let identity = tables.identities.get(&row.identity_id).cloned().ok_or_else(|| {
            StoreError::Unexpected(format!("refresh token {} has no owner", row.id))
        })?;

        Ok(Some(RefreshTokenRecord {
            id: row.id,
            token: token.to_string(),
            identity,
            expires_at: row.expires_at,
            revoked: row.revoked,
        }))
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut tables = self.write()?;

        if !tables.identities.contains_key(&record.identity.id) {
            return Err(StoreError::Unexpected(format!(
                "identity {} does not exist",
                record.identity.id
            )));
        }
        if tables.refresh_tokens.contains_key(&record.token) {
            return Err(StoreError::Conflict("refresh token already exists".to_string()));
        }

        tables.refresh_tokens.insert(
            record.token.clone(),
            RefreshTokenRow {
                id: record.id,
                identity_id: record.identity.id,
                expires_at: record.expires_at,
                revoked: record.revoked,
            },
        );
        Ok(())
    }

    async fn mark_revoked_for_identity(&self, identity_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.write()?;

        let mut revoked = 0;
        for row in tables
            .refresh_tokens
            .values_mut()
            .filter(|row| row.identity_id == identity_id && !row.revoked)
        {
            row.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.write()?;

        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, row| row.expires_at > now);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}

/// PostgreSQL credential store
///
/// Refresh tokens are stored as SHA-256 digests; the plaintext token string never
/// reaches the database. Roles live in a `TEXT[]` column so an identity is always
/// loaded in a single read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::models::{Identity, PasswordHash, RefreshTokenRecord};
use super::CredentialStore;
use crate::configuration::DatabaseSettings;
use crate::error::StoreError;

type IdentityRow = (Uuid, String, String, String, Vec<String>, DateTime<Utc>);

type RefreshTokenRow = (
    Uuid,
    DateTime<Utc>,
    bool,
    Uuid,
    String,
    String,
    String,
    Vec<String>,
    DateTime<Utc>,
);

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn identity_from_row(row: IdentityRow) -> Identity {
    let (id, username, email, password_hash, roles, created_at) = row;
    Identity {
        id,
        username,
        email,
        password_hash: PasswordHash::new(password_hash),
        roles: roles.into_iter().collect(),
        created_at,
    }
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for the configured database
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect(&settings.connection_string())
            .await?;

        Ok(Self::new(pool))
    }

    /// Apply the schema in `migrations/`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unexpected(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, username, email, password_hash, roles, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(identity_from_row))
    }

    async fn save_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(identity.password_hash.expose())
        .bind(identity.role_list())
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_token_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT t.id, t.expires_at, t.revoked,
                   u.id, u.username, u.email, u.password_hash, u.roles, u.created_at
            FROM refresh_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, expires_at, revoked, user_id, username, email, password_hash, roles, created_at)| {
                RefreshTokenRecord {
                    id,
                    token: token.to_string(),
                    identity: identity_from_row((
                        user_id,
                        username,
                        email,
                        password_hash,
                        roles,
                        created_at,
                    )),
                    expires_at,
                    revoked,
                }
            },
        ))
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(hash_token(&record.token))
        .bind(record.identity.id)
        .bind(record.expires_at)
        .bind(record.revoked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_revoked_for_identity(&self, identity_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = true, revoked_at = $1
            WHERE user_id = $2 AND revoked = false
            "#,
        )
        .bind(Utc::now())
        .bind(identity_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

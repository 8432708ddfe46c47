/// Credential records
///
/// `Identity` is the authenticable principal, `RefreshTokenRecord` one long-lived
/// credential delegated to exactly one identity.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

/// bcrypt output for a stored password
///
/// Has no `Serialize`, no `PartialEq` and a redacted `Debug`, so the hash can't leak
/// through logs or responses and can't be compared by plain equality.
#[derive(Clone)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: PasswordHash,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash,
            roles: roles.into_iter().map(Into::into).collect(),
            created_at: Utc::now(),
        }
    }

    /// Roles in claim order
    pub fn role_list(&self) -> Vec<String> {
        self.roles.iter().cloned().collect()
    }
}

/// Where a refresh token stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Revoked,
    Expired,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub token: String,
    /// Owner, loaded in the same read as the record
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// Revocation wins over expiry. Expiry is exclusive: `expires_at == now` is expired.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked {
            RefreshTokenState::Revoked
        } else if self.expires_at <= now {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>, revoked: bool) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().to_string(),
            identity: Identity::new(
                "alice",
                "alice@example.com",
                PasswordHash::new("$2b$10$placeholder".to_string()),
                [ROLE_USER],
            ),
            expires_at,
            revoked,
        }
    }

    #[test]
    fn test_state_boundaries() {
        let now = Utc::now();

        assert_eq!(record(now + Duration::seconds(1), false).state_at(now), RefreshTokenState::Active);
        assert_eq!(record(now, false).state_at(now), RefreshTokenState::Expired);
        assert_eq!(record(now - Duration::seconds(1), false).state_at(now), RefreshTokenState::Expired);
    }

    #[test]
    fn test_revoked_wins_over_expired() {
        let now = Utc::now();
        assert_eq!(record(now - Duration::days(1), true).state_at(now), RefreshTokenState::Revoked);
    }

    #[test]
    fn test_password_hash_is_redacted() {
        let hash = PasswordHash::new("$2b$10$abcdefghijklmnopqrstuv".to_string());
        let identity = Identity::new("bob", "bob@example.com", hash, [ROLE_ADMIN]);

        let printed = format!("{:?}", identity);
        assert!(!printed.contains("abcdefghij"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_roles_are_deduplicated_and_ordered() {
        let identity = Identity::new(
            "carol",
            "carol@example.com",
            PasswordHash::new(String::new()),
            ["USER", "ADMIN", "USER"],
        );
        assert_eq!(identity.role_list(), vec!["ADMIN".to_string(), "USER".to_string()]);
    }
}

/// Startup seeding of the bootstrap admin identity

use crate::auth::PasswordVerifier;
use crate::configuration::SeedSettings;
use crate::error::{AppError, StoreError};
use crate::store::{CredentialStore, Identity, ROLE_ADMIN};
use crate::validators::{is_valid_email, is_valid_username};

/// Create the admin identity unless one with that username already exists
///
/// Returns `true` when an identity was created.
pub async fn seed_admin(
    store: &dyn CredentialStore,
    passwords: &PasswordVerifier,
    settings: &SeedSettings,
) -> Result<bool, AppError> {
    let username = is_valid_username(&settings.admin_username)?;
    let email = is_valid_email(&settings.admin_email)?;

    if store.find_identity_by_username(&username).await?.is_some() {
        tracing::debug!(username = %username, "Admin identity already present");
        return Ok(false);
    }

    let password_hash = passwords.hash_password(&settings.admin_password)?;
    let identity = Identity::new(username, email, password_hash, [ROLE_ADMIN]);

    match store.save_identity(&identity).await {
        Ok(()) => {
            tracing::info!(user_id = %identity.id, username = %identity.username, "Admin identity seeded");
            Ok(true)
        }
        // Another instance seeded it between our read and write
        Err(StoreError::Conflict(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;

    fn settings() -> SeedSettings {
        SeedSettings {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_email: "admin@test.com".to_string(),
            admin_password: "Admin@123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = InMemoryCredentialStore::new();
        let passwords = PasswordVerifier::new(10).unwrap();

        assert!(seed_admin(&store, &passwords, &settings()).await.unwrap());
        assert!(!seed_admin(&store, &passwords, &settings()).await.unwrap());

        let admin = store.find_identity_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.email, "admin@test.com");
        assert_eq!(admin.role_list(), vec!["ADMIN".to_string()]);
        assert!(passwords.verify("Admin@123", &admin.password_hash));
    }

    #[tokio::test]
    async fn test_weak_seed_password_is_rejected() {
        let store = InMemoryCredentialStore::new();
        let passwords = PasswordVerifier::new(10).unwrap();
        let mut weak = settings();
        weak.admin_password = "admin".to_string();

        assert!(matches!(
            seed_admin(&store, &passwords, &weak).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.find_identity_by_username("admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_seed_email_is_rejected() {
        let store = InMemoryCredentialStore::new();
        let passwords = PasswordVerifier::new(10).unwrap();
        let mut bad = settings();
        bad.admin_email = "not-an-email".to_string();

        assert!(seed_admin(&store, &passwords, &bad).await.is_err());
    }
}

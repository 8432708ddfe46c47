use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthService, PasswordVerifier, RefreshTokenManager, TokenSigner};
use crate::configuration::Settings;
use crate::error::{AppError, ConfigurationError, StoreError, ValidationError};
use crate::middleware::JwtMiddleware;
use crate::routes::{health_check, login, logout, me, refresh};
use crate::store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};

/// Wire the auth component graph once from settings
///
/// # Errors
/// Any `ConfigurationError` here is fatal: weak signing secret, bcrypt cost below
/// the minimum, non-positive token lifetimes.
pub fn build_auth_service(
    settings: &Settings,
    store: Arc<dyn CredentialStore>,
) -> Result<AuthService, ConfigurationError> {
    let signer = Arc::new(TokenSigner::new(&settings.jwt)?);
    let passwords = PasswordVerifier::new(settings.password.bcrypt_cost)?;
    let refresh_tokens = RefreshTokenManager::new(store.clone(), settings.jwt.refresh_token_expiry)?;

    Ok(AuthService::new(store, passwords, signer, refresh_tokens))
}

/// PostgreSQL when a database is configured (migrated on connect), in-memory otherwise
pub async fn build_store(settings: &Settings) -> Result<Arc<dyn CredentialStore>, StoreError> {
    match &settings.database {
        Some(database) => {
            tracing::info!(host = %database.host, database = %database.database_name, "Using PostgreSQL credential store");
            let store = PgCredentialStore::connect(database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No database configured, using in-memory credential store");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
    }
}

/// Periodically delete expired refresh tokens
pub fn spawn_cleanup_task(auth: Arc<AuthService>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = auth.refresh_tokens().purge_expired().await {
                tracing::error!(error = %e, "Refresh token cleanup failed");
            }
        }
    })
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected request body");
    AppError::Validation(ValidationError::InvalidFormat("request body".to_string())).into()
}

pub fn run(listener: TcpListener, auth: Arc<AuthService>) -> Result<Server, std::io::Error> {
    let signer = auth.token_signer();
    let auth = web::Data::from(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(auth.clone())
            .app_data(web::JsonConfig::default().limit(4096).error_handler(json_error_handler))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/auth")
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout))
                    .service(
                        web::resource("/me")
                            .route(web::get().to(me))
                            .wrap(JwtMiddleware::new(signer.clone())),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secure_auth::configuration::get_configuration;
use secure_auth::seed::seed_admin;
use secure_auth::startup::{build_auth_service, build_store, run, spawn_cleanup_task};
use secure_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store = build_store(&configuration).await.map_err(|e| {
        tracing::error!("Failed to open credential store: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Credential store error")
    })?;

    // Refuse to start with a weak signing key or hash cost
    let auth = build_auth_service(&configuration, store.clone()).map_err(|e| {
        tracing::error!("Invalid security configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    if configuration.seed.enabled {
        seed_admin(store.as_ref(), auth.password_verifier(), &configuration.seed)
            .await
            .map_err(|e| {
                tracing::error!("Failed to seed admin identity: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Seeding error")
            })?;
    }

    let auth = Arc::new(auth);
    spawn_cleanup_task(
        auth.clone(),
        Duration::from_secs(configuration.application.cleanup_interval_secs),
    );

    let address = configuration.application.address();
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, auth)?;
    tracing::info!("Server started successfully");

    server.await
}

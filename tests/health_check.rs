//! Integration tests for the liveness endpoint

use std::net::TcpListener;
use std::sync::Arc;

use secure_auth::configuration::{
    ApplicationSettings, JwtSettings, PasswordSettings, SeedSettings, Settings,
};
use secure_auth::startup::{build_auth_service, run};
use secure_auth::store::InMemoryCredentialStore;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port,
            cleanup_interval_secs: 3600,
        },
        database: None,
        jwt: JwtSettings {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "secure-auth-api".to_string(),
        },
        password: PasswordSettings { bcrypt_cost: 10 },
        seed: SeedSettings {
            enabled: false,
            admin_username: "admin".to_string(),
            admin_email: "admin@test.com".to_string(),
            admin_password: String::new(),
        },
    };

    let auth = build_auth_service(&settings, Arc::new(InMemoryCredentialStore::new()))
        .expect("Failed to build auth service");
    let server = run(listener, Arc::new(auth)).expect("Failed to create server");

    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/does-not-exist", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}

use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use secure_auth::auth::TokenSigner;
use secure_auth::configuration::{
    ApplicationSettings, JwtSettings, PasswordSettings, SeedSettings, Settings,
};
use secure_auth::seed::seed_admin;
use secure_auth::startup::{build_auth_service, run};
use secure_auth::store::{CredentialStore, InMemoryCredentialStore};

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryCredentialStore>,
    pub signer: Arc<TokenSigner>,
}

fn test_settings(port: u16) -> Settings {
    Settings {
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
            enabled: true,
            admin_username: "admin".to_string(),
            admin_email: "admin@test.com".to_string(),
            admin_password: "Admin@123".to_string(),
        },
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let settings = test_settings(port);
    let store = Arc::new(InMemoryCredentialStore::new());
    let dyn_store: Arc<dyn CredentialStore> = store.clone();

    let auth = build_auth_service(&settings, dyn_store.clone())
        .expect("Failed to build auth service");
    seed_admin(dyn_store.as_ref(), auth.password_verifier(), &settings.seed)
        .await
        .expect("Failed to seed admin");

    let signer = auth.token_signer();
    let server = run(listener, Arc::new(auth)).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        signer,
    }
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/api/v1/auth/{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login(&self) -> Value {
        let response = self
            .post("login", &json!({"username": "admin", "password": "Admin@123"}))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_bearer_token_pair_for_valid_credentials() {
    let app = spawn_app().await;

    let body = app.login().await;

    assert_eq!(body["tokenType"], "Bearer");
    let access_token = body["accessToken"].as_str().expect("missing accessToken");
    let refresh_token = body["refreshToken"].as_str().expect("missing refreshToken");
    assert!(!refresh_token.is_empty());

    let claims = app.signer.verify(access_token).expect("access token must verify");
    assert_eq!(claims.sub, "admin");
    assert_eq!(claims.iss, "secure-auth-api");
    assert_eq!(claims.roles, vec!["ADMIN".to_string()]);
    assert_eq!(claims.exp, claims.iat + 900);

    assert_eq!(app.store.refresh_token_count().unwrap(), 1);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;

    let wrong_password = app
        .post("login", &json!({"username": "admin", "password": "Wrong@123"}))
        .await;
    let unknown_user = app
        .post("login", &json!({"username": "nobody", "password": "Admin@123"}))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_user: Value = unknown_user.json().await.unwrap();
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_password["code"], unknown_user["code"]);
    assert_eq!(wrong_password["message"], unknown_user["message"]);

    assert_eq!(app.store.refresh_token_count().unwrap(), 0);
}

#[tokio::test]
async fn login_returns_400_for_blank_fields() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"username": "", "password": "Admin@123"}), "empty username"),
        (json!({"username": "   ", "password": "Admin@123"}), "blank username"),
        (json!({"username": "admin", "password": ""}), "empty password"),
    ];

    for (body, description) in test_cases {
        let response = app.post("login", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn login_returns_400_for_malformed_body() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/api/v1/auth/login", &app.address))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token_with_same_refresh_token() {
    let app = spawn_app().await;
    let login = app.login().await;
    let refresh_token = login["refreshToken"].as_str().unwrap();

    // iat has one-second resolution
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let first = app.post("refresh", &json!({"refreshToken": refresh_token})).await;
    assert_eq!(200, first.status().as_u16());
    let first: Value = first.json().await.unwrap();

    let second = app.post("refresh", &json!({"refreshToken": refresh_token})).await;
    assert_eq!(200, second.status().as_u16());
    let second: Value = second.json().await.unwrap();

    assert_eq!(first["refreshToken"], refresh_token);
    assert_eq!(second["refreshToken"], refresh_token);
    assert_eq!(first["tokenType"], "Bearer");
    assert_ne!(first["accessToken"], login["accessToken"]);

    let claims = app.signer.verify(first["accessToken"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, "admin");
    assert_eq!(claims.roles, vec!["ADMIN".to_string()]);

    // No rotation: still exactly one stored token
    assert_eq!(app.store.refresh_token_count().unwrap(), 1);
}

#[tokio::test]
async fn refresh_rejects_unknown_token() {
    let app = spawn_app().await;

    let response = app
        .post("refresh", &json!({"refreshToken": "not-a-real-token"}))
        .await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn refresh_returns_400_for_blank_token() {
    let app = spawn_app().await;

    let response = app.post("refresh", &json!({"refreshToken": "  "})).await;
    assert_eq!(400, response.status().as_u16());

    let response = app.post("refresh", &json!({})).await;
    assert_eq!(400, response.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_revokes_every_session_of_the_identity() {
    let app = spawn_app().await;
    let first = app.login().await;
    let second = app.login().await;
    let first_token = first["refreshToken"].as_str().unwrap();
    let second_token = second["refreshToken"].as_str().unwrap();

    let response = app.post("logout", &json!({"refreshToken": first_token})).await;
    assert_eq!(204, response.status().as_u16());

    for token in [first_token, second_token] {
        let response = app.post("refresh", &json!({"refreshToken": token})).await;
        assert_eq!(401, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
    }

    // Repeating the logout with a revoked token is accepted
    let response = app.post("logout", &json!({"refreshToken": first_token})).await;
    assert_eq!(204, response.status().as_u16());
}

#[tokio::test]
async fn logout_rejects_unknown_token() {
    let app = spawn_app().await;

    let response = app
        .post("logout", &json!({"refreshToken": "not-a-real-token"}))
        .await;

    assert_eq!(401, response.status().as_u16());
}

// --- Protected Route Tests ---

#[tokio::test]
async fn me_returns_principal_for_valid_access_token() {
    let app = spawn_app().await;
    let login = app.login().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/api/v1/auth/me", &app.address))
        .bearer_auth(login["accessToken"].as_str().unwrap())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "admin");
    assert_eq!(body["roles"], json!(["ADMIN"]));
    assert!(body["expiresAt"].as_i64().is_some());
}

#[tokio::test]
async fn me_returns_401_without_valid_access_token() {
    let app = spawn_app().await;

    let missing = reqwest::Client::new()
        .get(&format!("{}/api/v1/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, missing.status().as_u16());

    let invalid = reqwest::Client::new()
        .get(&format!("{}/api/v1/auth/me", &app.address))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, invalid.status().as_u16());
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_INVALID");
}

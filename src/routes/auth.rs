/// Authentication Routes
///
/// Login, token refresh, logout, and the current principal.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Claims};
use crate::error::{AppError, ErrorContext};
use crate::validators::{validate_login_request, validate_refresh_request};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh / logout request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Current principal, as carried by the access token
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub expires_at: i64,
}

/// POST /api/v1/auth/login
///
/// Returns `{accessToken, refreshToken, tokenType}`.
///
/// # Errors
/// - 400: Blank or oversized username/password
/// - 401: Invalid credentials (same response for unknown user and wrong password)
/// - 503: Credential store unavailable
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    validate_login_request(&form.username, &form.password)?;
    let pair = auth.login(&form.username, &form.password).await?;

    tracing::info!(request_id = %context.request_id, operation = %context.operation, "Login succeeded");
    Ok(HttpResponse::Ok().json(pair))
}

/// POST /api/v1/auth/refresh
///
/// Returns a new access token with the same, unrotated refresh token.
///
/// # Errors
/// - 400: Blank refresh token
/// - 401: Unknown, revoked or expired refresh token
/// - 503: Credential store unavailable
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    validate_refresh_request(&form.refresh_token)?;
    let pair = auth.refresh(&form.refresh_token).await?;

    tracing::info!(request_id = %context.request_id, operation = %context.operation, "Token refreshed");
    Ok(HttpResponse::Ok().json(pair))
}

/// POST /api/v1/auth/logout
///
/// Revokes every refresh token of the identity owning the submitted token.
///
/// # Errors
/// - 400: Blank refresh token
/// - 401: Unknown or expired refresh token
/// - 503: Credential store unavailable
pub async fn logout(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");

    validate_refresh_request(&form.refresh_token)?;
    auth.logout(&form.refresh_token).await?;

    tracing::info!(request_id = %context.request_id, operation = %context.operation, "Logout completed");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/auth/me
///
/// **Requires a valid access token**; claims are injected by `JwtMiddleware`.
pub async fn me(claims: web::ReqData<Claims>) -> HttpResponse {
    let claims = claims.into_inner();
    HttpResponse::Ok().json(MeResponse {
        username: claims.sub,
        roles: claims.roles,
        expires_at: claims.exp,
    })
}

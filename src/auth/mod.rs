/// Authentication module
///
/// Password verification, access token signing/verification, refresh token
/// lifecycle, and the service composing them into login and refresh.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::Claims;
pub use jwt::{TokenSigner, MIN_SECRET_BYTES};
pub use password::{validate_password_strength, PasswordVerifier, MIN_BCRYPT_COST};
pub use refresh_token::{generate_refresh_token, RefreshTokenManager};
pub use service::{AuthService, TokenPair, TOKEN_TYPE_BEARER};
